use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{error::PulseError, observe::Stage};

pub const CLICK_DECAY_RATE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickSpec {
    pub duration_seconds: f64,
    pub frequency_hz: f64,
    pub amplitude: f64,
}

impl ClickSpec {
    pub const STRONG: Self = Self {
        duration_seconds: 0.05,
        frequency_hz: 1_000.0,
        amplitude: 1.0,
    };

    pub const WEAK: Self = Self {
        duration_seconds: 0.03,
        frequency_hz: 800.0,
        amplitude: 0.6,
    };

    fn validate(&self) -> Result<(), PulseError> {
        let fields = [
            ("click_duration", self.duration_seconds),
            ("click_frequency", self.frequency_hz),
            ("click_amplitude", self.amplitude),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PulseError::InvalidInput {
                    stage: Stage::Click,
                    field,
                    index: 0,
                    value,
                });
            }
        }

        if self.duration_seconds < 0.0 {
            return Err(PulseError::InvalidInput {
                stage: Stage::Click,
                field: "click_duration",
                index: 0,
                value: self.duration_seconds,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickWaveform {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl ClickWaveform {
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[instrument(fields(sample_rate, frequency_hz = spec.frequency_hz, duration = spec.duration_seconds))]
pub fn synthesize_click(sample_rate: u32, spec: &ClickSpec) -> Result<ClickWaveform, PulseError> {
    spec.validate()?;

    let sample_count = (f64::from(sample_rate) * spec.duration_seconds).round() as usize;
    let step = if sample_count > 1 {
        spec.duration_seconds / (sample_count - 1) as f64
    } else {
        0.0
    };

    let samples: Vec<f32> = (0..sample_count)
        .map(|index| {
            let t = index as f64 * step;
            let envelope = (-CLICK_DECAY_RATE * t).exp();
            (spec.amplitude * (TAU * spec.frequency_hz * t).sin() * envelope) as f32
        })
        .collect();

    debug!(samples = samples.len(), "click synthesized");
    Ok(ClickWaveform {
        sample_rate,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_click_length_follows_duration() {
        let click = synthesize_click(44_100, &ClickSpec::STRONG).expect("click should build");
        assert_eq!(click.len(), 2_205);
        assert_eq!(click.sample_rate(), 44_100);
        assert_eq!(click.samples()[0], 0.0);
    }

    #[test]
    fn weak_click_is_scaled_and_decays() {
        let click = synthesize_click(48_000, &ClickSpec::WEAK).expect("click should build");
        assert_eq!(click.len(), 1_440);
        let peak = click.samples().iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 0.6 + f32::EPSILON);
        assert!(peak > 0.3);

        let head = click.samples()[..200].iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        let tail = click.samples()[1_240..].iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(tail < head, "envelope should decay over time");
    }

    #[test]
    fn synthesis_is_deterministic() {
        let first = synthesize_click(22_050, &ClickSpec::STRONG).expect("click should build");
        let second = synthesize_click(22_050, &ClickSpec::STRONG).expect("click should build");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_duration_yields_empty_click() {
        let spec = ClickSpec {
            duration_seconds: 0.0,
            ..ClickSpec::STRONG
        };
        let click = synthesize_click(44_100, &spec).expect("click should build");
        assert!(click.is_empty());
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let spec = ClickSpec {
            frequency_hz: f64::NAN,
            ..ClickSpec::WEAK
        };
        let err = synthesize_click(44_100, &spec).expect_err("nan frequency must fail");
        assert!(matches!(
            err,
            PulseError::InvalidInput {
                stage: Stage::Click,
                field: "click_frequency",
                ..
            }
        ));
    }
}
