use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    click::ClickWaveform,
    error::PulseError,
    observe::Stage,
    time::{seconds_to_sample_index, validate_timestamps},
};

pub const DEFAULT_TARGET_PEAK: f32 = 0.8;
pub const DEFAULT_COLLISION_WINDOW_SECONDS: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub collision_window_seconds: f64,
    pub target_peak: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            collision_window_seconds: DEFAULT_COLLISION_WINDOW_SECONDS,
            target_peak: DEFAULT_TARGET_PEAK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickTrack {
    pub samples: Vec<f32>,
    pub beat_clicks: usize,
    pub onset_clicks: usize,
    pub suppressed_onsets: usize,
}

#[instrument(
    skip(beats, quantized_onsets, strong, weak),
    fields(beat_count = beats.len(), onset_count = quantized_onsets.len())
)]
pub fn render_click_track(
    audio_length: usize,
    sample_rate: u32,
    beats: &[f64],
    quantized_onsets: &[f64],
    strong: &ClickWaveform,
    weak: &ClickWaveform,
    settings: &RenderSettings,
) -> Result<ClickTrack, PulseError> {
    validate_timestamps(Stage::Render, "beats", beats)?;
    validate_timestamps(Stage::Render, "quantized_onsets", quantized_onsets)?;
    if strong.sample_rate() != sample_rate || weak.sample_rate() != sample_rate {
        warn!(
            sample_rate,
            strong_rate = strong.sample_rate(),
            weak_rate = weak.sample_rate(),
            "click sample rate differs from track sample rate"
        );
    }

    let mut samples = vec![0.0_f32; audio_length];
    let mut beat_clicks = 0;
    for beat in beats {
        let start = seconds_to_sample_index(*beat, sample_rate);
        if accumulate(&mut samples, start, strong.samples()) > 0 {
            beat_clicks += 1;
        }
    }

    let mut onset_clicks = 0;
    let mut suppressed_onsets = 0;
    for onset in quantized_onsets {
        if distance_to_nearest(beats, *onset) <= settings.collision_window_seconds {
            suppressed_onsets += 1;
            continue;
        }

        let start = seconds_to_sample_index(*onset, sample_rate);
        if accumulate(&mut samples, start, weak.samples()) > 0 {
            onset_clicks += 1;
        }
    }

    let peak = normalize_peak(&mut samples, settings.target_peak);
    debug!(
        frames = samples.len(),
        beat_clicks, onset_clicks, suppressed_onsets, peak, "click track rendered"
    );

    Ok(ClickTrack {
        samples,
        beat_clicks,
        onset_clicks,
        suppressed_onsets,
    })
}

pub fn accumulate(buffer: &mut [f32], start: usize, click: &[f32]) -> usize {
    if start >= buffer.len() {
        return 0;
    }

    let end = start.saturating_add(click.len()).min(buffer.len());
    for (frame, sample) in buffer[start..end].iter_mut().zip(click) {
        *frame += *sample;
    }
    end - start
}

#[must_use]
pub fn peak_amplitude(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
}

/// Scales `buffer` so its absolute peak equals `target_peak`; silence is left
/// untouched. Returns the peak measured before scaling.
pub fn normalize_peak(buffer: &mut [f32], target_peak: f32) -> f32 {
    let peak = peak_amplitude(buffer);
    if peak > 0.0 {
        // Divide first so the peak sample lands on exactly `target_peak`.
        for sample in buffer.iter_mut() {
            *sample = *sample / peak * target_peak;
        }
    }
    peak
}

fn distance_to_nearest(beats: &[f64], time: f64) -> f64 {
    beats
        .iter()
        .map(|beat| (beat - time).abs())
        .fold(f64::INFINITY, f64::min)
}
