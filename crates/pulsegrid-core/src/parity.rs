use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    engine::{AudioSource, EngineSettings, MetronomeEngine},
    fixtures::{demo_audio, demo_onsets, demo_rhythm},
    model::{MonoAudio, OnsetRecord, RhythmRecord},
    observe::TracingObserver,
    persistence::write_json_atomic,
};

const PARITY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParityReport {
    pub schema_version: u32,
    pub sample_rate: u32,
    pub frames: usize,
    pub grid_points: usize,
    pub quantized_onsets: usize,
    pub rendered_hash: String,
    pub mixed_hash: Option<String>,
    pub report_hash: String,
}

#[instrument(skip(rhythm, onsets, audio, settings), fields(frames = audio.len()))]
pub fn generate_parity_report(
    rhythm: &RhythmRecord,
    onsets: &OnsetRecord,
    audio: &MonoAudio,
    settings: EngineSettings,
) -> Result<ParityReport> {
    let output = MetronomeEngine::new(settings).run(
        rhythm,
        onsets,
        AudioSource::Buffer(audio),
        &mut TracingObserver::default(),
    )?;
    let report_bytes =
        serde_json::to_vec(&output.report).context("failed to serialize beat grid report")?;

    Ok(ParityReport {
        schema_version: PARITY_SCHEMA_VERSION,
        sample_rate: output.sample_rate,
        frames: output.rendered().len(),
        grid_points: output.grid.as_ref().map_or(0, |grid| grid.len()),
        quantized_onsets: output.report.quantized_onsets.len(),
        rendered_hash: hash_samples(output.rendered()),
        mixed_hash: output.mixed.as_deref().map(hash_samples),
        report_hash: hash_hex(&report_bytes),
    })
}

pub fn demo_parity_report() -> Result<ParityReport> {
    generate_parity_report(
        &demo_rhythm(),
        &demo_onsets(),
        &demo_audio(),
        EngineSettings::default(),
    )
}

pub fn read_parity_report(path: &Path) -> Result<ParityReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read parity report: {}", path.display()))?;
    let report: ParityReport =
        serde_json::from_slice(&bytes).context("failed to parse parity report json")?;
    Ok(report)
}

pub fn write_parity_report(path: &Path, report: &ParityReport) -> Result<()> {
    write_json_atomic(path, report).context("failed to write parity report")
}

fn hash_samples(samples: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for sample in samples {
        hasher.update(sample.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
