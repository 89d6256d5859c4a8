use crate::{error::PulseError, observe::Stage};

pub const INTERVAL_WINDOW_BEATS: usize = 4;

#[must_use]
pub fn seconds_to_sample_index(seconds: f64, sample_rate: u32) -> usize {
    if seconds <= 0.0 {
        return 0;
    }

    (seconds * f64::from(sample_rate)).floor() as usize
}

#[must_use]
pub fn samples_to_seconds(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }

    samples as f64 / f64::from(sample_rate)
}

#[must_use]
pub fn average_interval(beats: &[f64]) -> Option<f64> {
    let window = &beats[..beats.len().min(INTERVAL_WINDOW_BEATS)];
    if window.len() < 2 {
        return None;
    }

    let sum: f64 = window.windows(2).map(|pair| pair[1] - pair[0]).sum();
    Some(sum / (window.len() - 1) as f64)
}

pub fn validate_timestamps(
    stage: Stage,
    field: &'static str,
    values: &[f64],
) -> Result<(), PulseError> {
    match values
        .iter()
        .enumerate()
        .find(|(_, value)| !value.is_finite() || **value < 0.0)
    {
        Some((index, value)) => Err(PulseError::InvalidInput {
            stage,
            field,
            index,
            value: *value,
        }),
        None => Ok(()),
    }
}

pub fn validate_finite(
    stage: Stage,
    field: &'static str,
    values: &[f64],
) -> Result<(), PulseError> {
    match values.iter().enumerate().find(|(_, value)| !value.is_finite()) {
        Some((index, value)) => Err(PulseError::InvalidInput {
            stage,
            field,
            index,
            value: *value,
        }),
        None => Ok(()),
    }
}

pub fn validate_samples(
    stage: Stage,
    field: &'static str,
    samples: &[f32],
) -> Result<(), PulseError> {
    match samples
        .iter()
        .enumerate()
        .find(|(_, sample)| !sample.is_finite())
    {
        Some((index, sample)) => Err(PulseError::InvalidInput {
            stage,
            field,
            index,
            value: f64::from(*sample),
        }),
        None => Ok(()),
    }
}
