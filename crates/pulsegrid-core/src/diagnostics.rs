use std::{fs, io, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::DiagnosticsConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,pulsegrid_core=debug";

/// Keeps the file writer alive; drop it last.
pub struct TelemetryGuard {
    pub session_id: Uuid,
    pub log_file: PathBuf,
    _file_guard: WorkerGuard,
}

pub fn init_tracing_from_config(config: &DiagnosticsConfig) -> anyhow::Result<TelemetryGuard> {
    fs::create_dir_all(&config.log_dir).with_context(|| {
        format!(
            "failed to create log directory: {}",
            config.log_dir.display()
        )
    })?;

    let session_id = Uuid::new_v4();
    let short_id: String = session_id.simple().to_string().chars().take(8).collect();
    let file_name = format!(
        "{}-{}-{short_id}.jsonl",
        config.trace_file_prefix,
        Utc::now().format("%Y%m%dT%H%M%S")
    );
    let log_file = config.log_dir.join(&file_name);
    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&config.log_dir, file_name));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let console = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(io::stderr);
    let json_file = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .flatten_event(true)
        .with_current_span(true)
        .with_writer(file_writer);

    match tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json_file)
        .try_init()
    {
        Ok(()) => info!(%session_id, log_file = %log_file.display(), "tracing initialized"),
        Err(error) => warn!(?error, "global tracing subscriber already initialized"),
    }

    Ok(TelemetryGuard {
        session_id,
        log_file,
        _file_guard: file_guard,
    })
}
