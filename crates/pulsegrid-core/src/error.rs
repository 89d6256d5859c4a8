use thiserror::Error;

use crate::observe::Stage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PulseError {
    #[error("{stage}: at least 2 beats are required to build a grid, got {count}")]
    InsufficientBeats { stage: Stage, count: usize },
    #[error("{stage}: degenerate average beat interval {avg_interval} from beats {beats:?}")]
    DegenerateInterval {
        stage: Stage,
        avg_interval: f64,
        beats: Vec<f64>,
    },
    #[error("{stage}: buffer length mismatch (original {original}, rendered {rendered})")]
    LengthMismatch {
        stage: Stage,
        original: usize,
        rendered: usize,
    },
    #[error("{stage}: invalid {field} at index {index}: {value}")]
    InvalidInput {
        stage: Stage,
        field: &'static str,
        index: usize,
        value: f64,
    },
}

impl PulseError {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::InsufficientBeats { stage, .. }
            | Self::DegenerateInterval { stage, .. }
            | Self::LengthMismatch { stage, .. }
            | Self::InvalidInput { stage, .. } => *stage,
        }
    }

    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientBeats { .. })
    }
}
