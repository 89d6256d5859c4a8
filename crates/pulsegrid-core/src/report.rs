use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    error::PulseError,
    observe::Stage,
    persistence::write_json_atomic,
    time::{samples_to_seconds, validate_finite},
};

/// Field order is the serialized order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeatGridReport {
    pub bpm: f64,
    pub beats: Vec<f64>,
    pub confidence: f64,
    pub onsets: Vec<f64>,
    pub quantized_onsets: Vec<f64>,
    pub beats_intervals: Option<Vec<f64>>,
    pub bpm_intervals: Option<Vec<f64>>,
    pub sample_rate: u32,
    pub audio_duration: f64,
}

pub struct ReportInput<'a> {
    pub bpm: f64,
    pub confidence: f64,
    pub beats: &'a [f64],
    pub onsets: &'a [f64],
    pub quantized_onsets: &'a [f64],
    pub beats_intervals: Option<&'a [f64]>,
    pub bpm_intervals: Option<&'a [f64]>,
    pub sample_rate: u32,
    pub audio_length: usize,
}

// Every scalar and interval must be finite for the JSON to read back.
pub fn build_report(input: &ReportInput<'_>) -> Result<BeatGridReport, PulseError> {
    validate_finite(Stage::Report, "bpm", &[input.bpm])?;
    validate_finite(Stage::Report, "confidence", &[input.confidence])?;
    validate_finite(Stage::Report, "beats_intervals", input.beats_intervals.unwrap_or(&[]))?;
    validate_finite(Stage::Report, "bpm_intervals", input.bpm_intervals.unwrap_or(&[]))?;

    Ok(BeatGridReport {
        bpm: input.bpm,
        beats: input.beats.to_vec(),
        confidence: input.confidence,
        onsets: input.onsets.to_vec(),
        quantized_onsets: input.quantized_onsets.to_vec(),
        beats_intervals: input.beats_intervals.map(<[f64]>::to_vec),
        bpm_intervals: input.bpm_intervals.map(<[f64]>::to_vec),
        sample_rate: input.sample_rate,
        audio_duration: samples_to_seconds(input.audio_length, input.sample_rate),
    })
}

#[instrument(skip(report), fields(path = %path.display()))]
pub fn write_report(path: &Path, report: &BeatGridReport) -> Result<()> {
    write_json_atomic(path, report).context("failed to write beat grid report")?;
    info!("beat grid report written");
    Ok(())
}

pub fn read_report(path: &Path) -> Result<BeatGridReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read beat grid report: {}", path.display()))?;
    let report: BeatGridReport =
        serde_json::from_slice(&bytes).context("failed to parse beat grid report json")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input<'a>(intervals: Option<&'a [f64]>) -> ReportInput<'a> {
        ReportInput {
            bpm: 120.0,
            confidence: 3.5,
            beats: &[0.5, 1.0],
            onsets: &[0.52],
            quantized_onsets: &[0.5],
            beats_intervals: intervals,
            bpm_intervals: None,
            sample_rate: 44_100,
            audio_length: 44_100 * 4,
        }
    }

    #[test]
    fn duration_is_derived_from_length() {
        let report = build_report(&sample_input(None)).expect("report should build");
        assert!((report.audio_duration - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn absent_intervals_serialize_as_null() {
        let report = build_report(&sample_input(None)).expect("report should build");
        let value = serde_json::to_value(&report).expect("report should serialize");
        assert!(value["beats_intervals"].is_null());
        assert!(value["bpm_intervals"].is_null());
        assert_eq!(value["sample_rate"], 44_100);

        let report = build_report(&sample_input(Some(&[]))).expect("report should build");
        let value = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(value["beats_intervals"], serde_json::json!([]));
    }

    #[test]
    fn fields_keep_fixed_order() {
        let report = build_report(&sample_input(Some(&[119.0, 121.0]))).expect("report should build");
        let json = serde_json::to_string(&report).expect("report should serialize");
        let keys = [
            "\"bpm\"",
            "\"beats\"",
            "\"confidence\"",
            "\"onsets\"",
            "\"quantized_onsets\"",
            "\"beats_intervals\"",
            "\"bpm_intervals\"",
            "\"sample_rate\"",
            "\"audio_duration\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| json.find(key).expect("key should be present"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
