pub mod audio;
pub mod click;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod grid;
pub mod mix;
pub mod model;
pub mod naming;
pub mod observe;
pub mod parity;
pub mod persistence;
pub mod quantize;
pub mod render;
pub mod report;
pub mod time;

pub use audio::{DecodedAudio, decode_audio_file_mono, load_mono_audio, resample_mono};
pub use click::{ClickSpec, ClickWaveform, synthesize_click};
pub use config::PulseConfig;
pub use diagnostics::{TelemetryGuard, init_tracing_from_config};
pub use engine::{AudioSource, EngineSettings, MetronomeEngine, MetronomeOutput};
pub use error::PulseError;
pub use export::{ExportOptions, SessionArtifacts, export_session, write_wav_mono};
pub use grid::{BeatGrid, build_grid, build_grid_for_events, coverage_end};
pub use mix::{MixWeights, mix_tracks};
pub use model::{MonoAudio, OnsetRecord, REFERENCE_SAMPLE_RATE, RhythmRecord};
pub use naming::{Artifact, OutputNames};
pub use observe::{PipelineObserver, RecordingObserver, Stage, StageEvent, TracingObserver};
pub use parity::{ParityReport, generate_parity_report};
pub use quantize::quantize_onsets;
pub use render::{ClickTrack, RenderSettings, normalize_peak, render_click_track};
pub use report::{BeatGridReport, ReportInput, build_report};
