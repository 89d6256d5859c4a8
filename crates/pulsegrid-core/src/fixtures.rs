use std::f32::consts::TAU;

use crate::model::{MonoAudio, OnsetRecord, REFERENCE_SAMPLE_RATE, RhythmRecord};

pub const DEMO_DURATION_SECONDS: usize = 4;

#[must_use]
pub fn demo_rhythm() -> RhythmRecord {
    RhythmRecord {
        bpm: 120.0,
        confidence: 3.2,
        ticks: vec![0.5, 1.0, 1.5, 2.0],
        bpm_estimates: Some(vec![119.5, 120.0, 120.2]),
        bpm_intervals: Some(vec![0.5, 0.5, 0.5]),
    }
}

#[must_use]
pub fn demo_onsets() -> OnsetRecord {
    OnsetRecord {
        onset_rate: 0.75,
        onsets: vec![0.52, 1.49, 3.1],
    }
}

#[must_use]
pub fn demo_audio() -> MonoAudio {
    let sample_rate = REFERENCE_SAMPLE_RATE;
    let frames = DEMO_DURATION_SECONDS * sample_rate as usize;
    let mut samples = vec![0.0_f32; frames];

    for beat in demo_rhythm().ticks {
        let start = (beat * f64::from(sample_rate)) as usize;
        let length = (sample_rate / 4) as usize;
        for (offset, sample) in samples.iter_mut().skip(start).take(length).enumerate() {
            let t = offset as f32 / sample_rate as f32;
            *sample += (TAU * 110.0 * t).sin() * (-12.0 * t).exp() * 0.4;
        }
    }

    MonoAudio::new(sample_rate, samples)
}
