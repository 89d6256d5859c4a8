use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    click::{ClickSpec, synthesize_click},
    error::PulseError,
    grid::{BeatGrid, build_grid_for_events},
    mix::{MixWeights, mix_tracks},
    model::{MonoAudio, OnsetRecord, RhythmRecord},
    observe::{PipelineObserver, Stage},
    quantize::{DEFAULT_TOLERANCE_RATIO, quantize_onsets},
    render::{ClickTrack, RenderSettings, render_click_track},
    report::{BeatGridReport, ReportInput, build_report},
    time::validate_timestamps,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub strong_click: ClickSpec,
    pub weak_click: ClickSpec,
    pub tolerance_ratio: f64,
    pub render: RenderSettings,
    pub mix: Option<MixWeights>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strong_click: ClickSpec::STRONG,
            weak_click: ClickSpec::WEAK,
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
            render: RenderSettings::default(),
            mix: Some(MixWeights::default()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AudioSource<'a> {
    Buffer(&'a MonoAudio),
    Length { frames: usize, sample_rate: u32 },
}

impl AudioSource<'_> {
    #[must_use]
    pub fn frames(&self) -> usize {
        match self {
            Self::Buffer(audio) => audio.len(),
            Self::Length { frames, .. } => *frames,
        }
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Buffer(audio) => audio.sample_rate,
            Self::Length { sample_rate, .. } => *sample_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetronomeOutput {
    pub sample_rate: u32,
    pub grid: Option<BeatGrid>,
    pub click_track: ClickTrack,
    pub mixed: Option<Vec<f32>>,
    pub report: BeatGridReport,
}

impl MetronomeOutput {
    #[must_use]
    pub fn rendered(&self) -> &[f32] {
        &self.click_track.samples
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetronomeEngine {
    settings: EngineSettings,
}

impl MetronomeEngine {
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs grid, quantize, render, mix and report in order.
    ///
    /// A missing grid (fewer than two beats) is reported to `observer` and the
    /// track is rendered from beats alone; every other error aborts the run.
    #[instrument(
        skip(self, rhythm, onsets, source, observer),
        fields(
            beats = rhythm.ticks.len(),
            onsets = onsets.onsets.len(),
            frames = source.frames(),
            sample_rate = source.sample_rate()
        )
    )]
    pub fn run(
        &self,
        rhythm: &RhythmRecord,
        onsets: &OnsetRecord,
        source: AudioSource<'_>,
        observer: &mut dyn PipelineObserver,
    ) -> Result<MetronomeOutput, PulseError> {
        let sample_rate = source.sample_rate();
        let frames = source.frames();
        let beats = rhythm.beats();

        observer.stage_started(Stage::Click);
        let strong = synthesize_click(sample_rate, &self.settings.strong_click)?;
        let weak = synthesize_click(sample_rate, &self.settings.weak_click)?;
        observer.stage_finished(Stage::Click, strong.len() + weak.len());

        observer.stage_started(Stage::Grid);
        let grid = match build_grid_for_events(beats, &onsets.onsets) {
            Ok(grid) => {
                observer.stage_finished(Stage::Grid, grid.len());
                Some(grid)
            }
            Err(error) if error.is_recoverable() => {
                observer.stage_degraded(Stage::Grid, &error);
                None
            }
            Err(error) => return Err(error),
        };

        observer.stage_started(Stage::Quantize);
        let quantized = match &grid {
            Some(grid) => quantize_onsets(&onsets.onsets, grid, self.settings.tolerance_ratio)?,
            None => {
                validate_timestamps(Stage::Quantize, "onsets", &onsets.onsets)?;
                Vec::new()
            }
        };
        observer.stage_finished(Stage::Quantize, quantized.len());

        observer.stage_started(Stage::Render);
        let click_track = render_click_track(
            frames,
            sample_rate,
            beats,
            &quantized,
            &strong,
            &weak,
            &self.settings.render,
        )?;
        observer.stage_finished(Stage::Render, click_track.samples.len());

        let mixed = match (source, self.settings.mix) {
            (AudioSource::Buffer(audio), Some(weights)) => {
                observer.stage_started(Stage::Mix);
                let mixed = mix_tracks(&audio.samples, &click_track.samples, &weights)?;
                observer.stage_finished(Stage::Mix, mixed.len());
                Some(mixed)
            }
            _ => None,
        };

        observer.stage_started(Stage::Report);
        let report = build_report(&ReportInput {
            bpm: rhythm.bpm,
            confidence: rhythm.confidence,
            beats,
            onsets: &onsets.onsets,
            quantized_onsets: &quantized,
            beats_intervals: rhythm.bpm_estimates.as_deref(),
            bpm_intervals: rhythm.bpm_intervals.as_deref(),
            sample_rate,
            audio_length: frames,
        })?;
        observer.stage_finished(Stage::Report, report.quantized_onsets.len());

        info!(
            bpm = rhythm.bpm,
            grid_points = grid.as_ref().map_or(0, BeatGrid::len),
            quantized = quantized.len(),
            beat_clicks = click_track.beat_clicks,
            onset_clicks = click_track.onset_clicks,
            mixed = mixed.is_some(),
            "metronome pipeline completed"
        );

        Ok(MetronomeOutput {
            sample_rate,
            grid,
            click_track,
            mixed,
            report,
        })
    }
}
