use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::PulseError,
    observe::Stage,
    render::{DEFAULT_TARGET_PEAK, normalize_peak},
    time::validate_samples,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixWeights {
    pub original: f32,
    pub rendered: f32,
    pub target_peak: f32,
}

impl Default for MixWeights {
    fn default() -> Self {
        Self {
            original: 0.3,
            rendered: 0.7,
            target_peak: DEFAULT_TARGET_PEAK,
        }
    }
}

#[instrument(skip(original, rendered), fields(frames = original.len()))]
pub fn mix_tracks(
    original: &[f32],
    rendered: &[f32],
    weights: &MixWeights,
) -> Result<Vec<f32>, PulseError> {
    if original.len() != rendered.len() {
        return Err(PulseError::LengthMismatch {
            stage: Stage::Mix,
            original: original.len(),
            rendered: rendered.len(),
        });
    }
    validate_samples(Stage::Mix, "original", original)?;
    validate_samples(Stage::Mix, "rendered", rendered)?;

    let mut mixed: Vec<f32> = original
        .iter()
        .zip(rendered)
        .map(|(source, click)| source * weights.original + click * weights.rendered)
        .collect();

    let peak = normalize_peak(&mut mixed, weights.target_peak);
    debug!(peak, "mix completed");
    Ok(mixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::peak_amplitude;

    #[test]
    fn mismatched_lengths_fail() {
        let err = mix_tracks(&[0.0; 4], &[0.0; 5], &MixWeights::default())
            .expect_err("mismatch must fail");
        assert_eq!(
            err,
            PulseError::LengthMismatch {
                stage: Stage::Mix,
                original: 4,
                rendered: 5,
            }
        );
    }

    #[test]
    fn mix_is_weighted_then_normalized() {
        let mixed = mix_tracks(&[1.0, 0.0], &[0.0, 1.0], &MixWeights::default())
            .expect("mix should succeed");
        assert_eq!(mixed.len(), 2);
        assert_eq!(peak_amplitude(&mixed), 0.8);
        assert_eq!(mixed[1], 0.8);
        assert!((mixed[0] - 0.3 / 0.7 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn silent_inputs_stay_silent() {
        let mixed = mix_tracks(&[0.0; 8], &[0.0; 8], &MixWeights::default())
            .expect("mix should succeed");
        assert!(mixed.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn nan_samples_are_rejected() {
        let err = mix_tracks(&[f32::NAN], &[0.0], &MixWeights::default())
            .expect_err("nan must fail");
        assert!(matches!(err, PulseError::InvalidInput { field: "original", .. }));
    }
}
