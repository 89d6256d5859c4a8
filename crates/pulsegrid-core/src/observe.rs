use std::{fmt, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PulseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Click,
    Grid,
    Quantize,
    Render,
    Mix,
    Report,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Grid => "grid",
            Self::Quantize => "quantize",
            Self::Render => "render",
            Self::Mix => "mix",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    Started { stage: Stage },
    Finished { stage: Stage, items: usize },
    Degraded { stage: Stage, reason: String },
}

pub trait PipelineObserver {
    fn stage_started(&mut self, stage: Stage);

    fn stage_finished(&mut self, stage: Stage, items: usize);

    fn stage_degraded(&mut self, stage: Stage, reason: &PulseError) {
        let _ = (stage, reason);
    }
}

#[derive(Debug, Default)]
pub struct TracingObserver {
    started_at: Option<(Stage, Instant)>,
}

impl PipelineObserver for TracingObserver {
    fn stage_started(&mut self, stage: Stage) {
        self.started_at = Some((stage, Instant::now()));
        debug!(stage = %stage, "stage started");
    }

    fn stage_finished(&mut self, stage: Stage, items: usize) {
        let elapsed_us = match self.started_at.take() {
            Some((started, at)) if started == stage => at.elapsed().as_micros(),
            _ => 0,
        };
        info!(stage = %stage, items, elapsed_us, "stage finished");
    }

    fn stage_degraded(&mut self, stage: Stage, reason: &PulseError) {
        warn!(stage = %stage, %reason, "stage degraded");
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<StageEvent>,
}

impl RecordingObserver {
    #[must_use]
    pub fn started_stages(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StageEvent::Started { stage } => Some(*stage),
                _ => None,
            })
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn stage_started(&mut self, stage: Stage) {
        self.events.push(StageEvent::Started { stage });
    }

    fn stage_finished(&mut self, stage: Stage, items: usize) {
        self.events.push(StageEvent::Finished { stage, items });
    }

    fn stage_degraded(&mut self, stage: Stage, reason: &PulseError) {
        self.events.push(StageEvent::Degraded {
            stage,
            reason: reason.to_string(),
        });
    }
}
