use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{engine::MetronomeOutput, naming::OutputNames, report::write_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub write_mixed: bool,
    pub write_json: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            write_mixed: true,
            write_json: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArtifacts {
    pub metronome_file: PathBuf,
    pub mixed_file: Option<PathBuf>,
    pub json_file: Option<PathBuf>,
}

#[instrument(skip(samples), fields(path = %path.display(), frames = samples.len(), sample_rate))]
pub fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create wav output directory: {}",
                parent.display()
            )
        })?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create wav file: {}", path.display()))?;
    for sample in samples {
        writer
            .write_sample(*sample)
            .context("failed to write wav sample")?;
    }

    writer.finalize().context("failed to finalize wav file")?;
    info!("wav written");
    Ok(())
}

pub fn read_wav_mono(path: &Path) -> Result<(u32, Vec<f32>)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open wav file: {}", path.display()))?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read float wav samples")?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read integer wav samples")?
        }
    };
    Ok((spec.sample_rate, samples))
}

#[instrument(skip(output, names), fields(metronome = %names.metronome.display()))]
pub fn export_session(
    output: &MetronomeOutput,
    names: &OutputNames,
    options: ExportOptions,
) -> Result<SessionArtifacts> {
    write_wav_mono(&names.metronome, output.rendered(), output.sample_rate)?;

    let mixed_file = match (&output.mixed, options.write_mixed) {
        (Some(mixed), true) => {
            write_wav_mono(&names.mixed, mixed, output.sample_rate)?;
            Some(names.mixed.clone())
        }
        _ => None,
    };

    let json_file = if options.write_json {
        write_report(&names.beat_grid, &output.report)?;
        Some(names.beat_grid.clone())
    } else {
        None
    };

    let artifacts = SessionArtifacts {
        metronome_file: names.metronome.clone(),
        mixed_file,
        json_file,
    };
    info!(?artifacts, "session exported");
    Ok(artifacts)
}
