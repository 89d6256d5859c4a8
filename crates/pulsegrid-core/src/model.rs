use serde::{Deserialize, Serialize};

use crate::time::samples_to_seconds;

pub const REFERENCE_SAMPLE_RATE: u32 = 44_100;

/// Tempo and beat output of the rhythm detector.
///
/// `bpm_estimates` and `bpm_intervals` are absent when the detector did not
/// produce them; that is kept distinct from an empty list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RhythmRecord {
    pub bpm: f64,
    pub confidence: f64,
    pub ticks: Vec<f64>,
    #[serde(default)]
    pub bpm_estimates: Option<Vec<f64>>,
    #[serde(default)]
    pub bpm_intervals: Option<Vec<f64>>,
}

impl RhythmRecord {
    #[must_use]
    pub fn beats(&self) -> &[f64] {
        &self.ticks
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnsetRecord {
    #[serde(default)]
    pub onset_rate: f64,
    pub onsets: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonoAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl MonoAudio {
    #[must_use]
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    #[must_use]
    pub fn silent(sample_rate: u32, frames: usize) -> Self {
        Self::new(sample_rate, vec![0.0; frames])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        samples_to_seconds(self.samples.len(), self.sample_rate)
    }
}
