use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument};

use crate::model::{OnsetRecord, RhythmRecord};

#[instrument(skip(value), fields(path = %path.display()))]
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf),
    )
    .context("failed to create temp json file")?;

    temp_file
        .write_all(&json)
        .context("failed to write temp json file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist json: {}", path.display()))?;

    debug!(bytes = json.len(), "json written");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content =
        fs::read(path).with_context(|| format!("failed to read {what}: {}", path.display()))?;
    serde_json::from_slice(&content).with_context(|| format!("invalid {what} json"))
}

#[instrument(fields(path = %path.display()))]
pub fn load_rhythm_record(path: &Path) -> Result<RhythmRecord> {
    let record: RhythmRecord = read_json(path, "rhythm record")?;
    info!(bpm = record.bpm, beats = record.ticks.len(), "rhythm record loaded");
    Ok(record)
}

#[instrument(fields(path = %path.display()))]
pub fn load_onset_record(path: &Path) -> Result<OnsetRecord> {
    let record: OnsetRecord = read_json(path, "onset record")?;
    info!(onsets = record.onsets.len(), "onset record loaded");
    Ok(record)
}
