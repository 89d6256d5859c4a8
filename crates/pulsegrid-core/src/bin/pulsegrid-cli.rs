use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pulsegrid_core::{
    AudioSource, ExportOptions, MetronomeEngine, OutputNames, PulseConfig, TracingObserver,
    audio::load_mono_audio,
    diagnostics::init_tracing_from_config,
    export::export_session,
    fixtures::{demo_audio, demo_onsets, demo_rhythm},
    naming::stem_of,
    parity::{demo_parity_report, write_parity_report},
    persistence::{load_onset_record, load_rhythm_record},
};

#[derive(Debug, Parser)]
#[command(name = "pulsegrid-cli")]
#[command(about = "Render click tracks and beat-grid reports from detected beats and onsets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; defaults to pulsegrid.config.toml discovery.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render the click track for one piece of audio.
    Render {
        /// Rhythm record JSON (bpm, confidence, ticks, bpm_estimates, bpm_intervals).
        #[arg(long)]
        rhythm: PathBuf,

        /// Onset record JSON (onset_rate, onsets).
        #[arg(long)]
        onsets: PathBuf,

        /// Source audio; enables the mixed output.
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Track length in seconds when no audio is given.
        #[arg(long, conflicts_with = "audio")]
        duration: Option<f64>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Metronome file name; mixed and JSON outputs share its stem.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base stem for output names; defaults to the audio or rhythm file stem.
        #[arg(long, conflicts_with = "output")]
        stem: Option<String>,

        #[arg(long)]
        no_mixed: bool,

        #[arg(long)]
        no_json: bool,
    },
    /// Render the built-in demo scenario.
    Demo {
        #[arg(long, default_value = "data/metronome/demo")]
        output_dir: PathBuf,
    },
    ParityReport {
        #[arg(long, default_value = "data/parity/report.json")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PulseConfig::load_from(path)?,
        None => PulseConfig::load()?,
    };
    if let Some(log_dir) = cli.log_dir {
        config.diagnostics.log_dir = log_dir;
    }
    let _telemetry = init_tracing_from_config(&config.diagnostics)?;

    match cli.command {
        Commands::Render {
            rhythm,
            onsets,
            audio,
            duration,
            output_dir,
            output,
            stem,
            no_mixed,
            no_json,
        } => {
            let rhythm_record = load_rhythm_record(&rhythm)?;
            let onset_record = load_onset_record(&onsets)?;
            let sample_rate = config.audio.reference_sample_rate;

            let source_audio = audio
                .as_deref()
                .map(|path| load_mono_audio(path, sample_rate))
                .transpose()?;
            let source = match (&source_audio, duration) {
                (Some(buffer), _) => AudioSource::Buffer(buffer),
                (None, Some(seconds)) if seconds.is_finite() && seconds >= 0.0 => {
                    AudioSource::Length {
                        frames: (seconds * f64::from(sample_rate)).round() as usize,
                        sample_rate,
                    }
                }
                (None, Some(seconds)) => anyhow::bail!("invalid --duration {seconds}"),
                (None, None) => anyhow::bail!("either --audio or --duration is required"),
            };

            let mut settings = config.engine_settings();
            if no_mixed {
                settings.mix = None;
            }
            let result = MetronomeEngine::new(settings).run(
                &rhythm_record,
                &onset_record,
                source,
                &mut TracingObserver::default(),
            )?;

            let output_dir = output_dir.unwrap_or_else(|| config.export.output_dir.clone());
            let names = match output {
                Some(file_name) => OutputNames::for_metronome_file(&output_dir, &file_name),
                None => {
                    let stem = stem
                        .or_else(|| audio.as_deref().and_then(stem_of))
                        .or_else(|| stem_of(&rhythm))
                        .context("could not derive an output stem; pass --stem")?;
                    OutputNames::for_stem(&output_dir, &stem)
                }
            };

            let artifacts = export_session(
                &result,
                &names,
                ExportOptions {
                    write_mixed: !no_mixed,
                    write_json: !no_json && config.export.write_json,
                },
            )?;
            tracing::info!(
                bpm = result.report.bpm,
                quantized = result.report.quantized_onsets.len(),
                "render finished"
            );
            println!("{}", serde_json::to_string_pretty(&artifacts)?);
        }
        Commands::Demo { output_dir } => {
            let audio = demo_audio();
            let result = MetronomeEngine::new(config.engine_settings()).run(
                &demo_rhythm(),
                &demo_onsets(),
                AudioSource::Buffer(&audio),
                &mut TracingObserver::default(),
            )?;
            let names = OutputNames::for_stem(&output_dir, "demo");
            let artifacts = export_session(&result, &names, ExportOptions::default())?;
            println!("{}", serde_json::to_string_pretty(&artifacts)?);
        }
        Commands::ParityReport { output } => {
            let report = demo_parity_report()?;
            write_parity_report(&output, &report)?;
            tracing::info!(path = %output.display(), "parity report generated");
        }
    }

    Ok(())
}
