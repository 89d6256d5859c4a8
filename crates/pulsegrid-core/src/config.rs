use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    click::ClickSpec,
    diagnostics::DEFAULT_LOG_FILTER,
    engine::EngineSettings,
    mix::MixWeights,
    model::REFERENCE_SAMPLE_RATE,
    quantize::DEFAULT_TOLERANCE_RATIO,
    render::RenderSettings,
};

pub const CONFIG_FILE_NAME: &str = "pulsegrid.config.toml";
pub const CONFIG_PATH_ENV: &str = "PULSEGRID_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PulseConfig {
    pub click: ClickConfig,
    pub quantize: QuantizeConfig,
    pub render: RenderSettings,
    pub mix: MixConfig,
    pub audio: AudioConfig,
    pub export: ExportConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClickConfig {
    pub strong: ClickSpec,
    pub weak: ClickSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuantizeConfig {
    pub tolerance_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixConfig {
    pub enabled: bool,
    pub original_weight: f32,
    pub rendered_weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub reference_sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub write_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub log_filter: String,
    pub log_dir: PathBuf,
    pub trace_file_prefix: String,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            strong: ClickSpec::STRONG,
            weak: ClickSpec::WEAK,
        }
    }
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
        }
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        let weights = MixWeights::default();
        Self {
            enabled: true,
            original_weight: weights.original,
            rendered_weight: weights.rendered,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            reference_sample_rate: REFERENCE_SAMPLE_RATE,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/metronome"),
            write_json: true,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: PathBuf::from("logs"),
            trace_file_prefix: "pulsegrid".to_string(),
        }
    }
}

impl PulseConfig {
    pub fn load() -> Result<Self> {
        match discover_config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no {CONFIG_FILE_NAME} found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: PulseConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config values in {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("render.target_peak", f64::from(self.render.target_peak)),
            ("quantize.tolerance_ratio", self.quantize.tolerance_ratio),
            ("click.strong.duration_seconds", self.click.strong.duration_seconds),
            ("click.strong.frequency_hz", self.click.strong.frequency_hz),
            ("click.strong.amplitude", self.click.strong.amplitude),
            ("click.weak.duration_seconds", self.click.weak.duration_seconds),
            ("click.weak.frequency_hz", self.click.weak.frequency_hz),
            ("click.weak.amplitude", self.click.weak.amplitude),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                bail!("{field} must be a positive finite number, got {value}");
            }
        }

        let non_negative = [
            (
                "render.collision_window_seconds",
                self.render.collision_window_seconds,
            ),
            ("mix.original_weight", f64::from(self.mix.original_weight)),
            ("mix.rendered_weight", f64::from(self.mix.rendered_weight)),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                bail!("{field} must be a non-negative finite number, got {value}");
            }
        }

        if self.audio.reference_sample_rate == 0 {
            bail!("audio.reference_sample_rate must be positive");
        }
        Ok(())
    }

    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            strong_click: self.click.strong,
            weak_click: self.click.weak,
            tolerance_ratio: self.quantize.tolerance_ratio,
            render: self.render,
            mix: self.mix.enabled.then_some(MixWeights {
                original: self.mix.original_weight,
                rendered: self.mix.rendered_weight,
                target_peak: self.render.target_peak,
            }),
        }
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let cwd = env::current_dir().ok()?;
    [cwd.join(CONFIG_FILE_NAME), cwd.join("..").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: PulseConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(config, PulseConfig::default());
        assert_eq!(config.audio.reference_sample_rate, 44_100);
        assert_eq!(config.render.target_peak, 0.8);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: PulseConfig = toml::from_str(
            r#"
            [mix]
            enabled = false

            [render]
            collision_window_seconds = 0.1

            [click.weak]
            duration_seconds = 0.02
            frequency_hz = 1200.0
            amplitude = 0.5
            "#,
        )
        .expect("partial config should parse");

        assert!(!config.mix.enabled);
        assert_eq!(config.mix.original_weight, 0.3);
        assert_eq!(config.render.collision_window_seconds, 0.1);
        assert_eq!(config.render.target_peak, 0.8);
        assert_eq!(config.click.strong, ClickSpec::STRONG);
        assert_eq!(config.click.weak.frequency_hz, 1200.0);

        let settings = config.engine_settings();
        assert!(settings.mix.is_none());
        assert_eq!(settings.tolerance_ratio, 0.25);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[mix\nenabled = 3").expect("config should be writable");
        let err = PulseConfig::load_from(&path).expect_err("broken toml must fail");
        assert!(err.to_string().contains("failed to parse config TOML"));
    }

    #[test]
    fn load_from_rejects_nan_target_peak() {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[render]\ntarget_peak = nan\n").expect("config should be writable");

        let err = PulseConfig::load_from(&path).expect_err("nan target peak must fail");
        let message = format!("{err:#}");
        assert!(message.contains("invalid config values"), "{message}");
        assert!(message.contains("render.target_peak"), "{message}");
    }

    #[test]
    fn validate_names_offending_field() {
        let mut config = PulseConfig::default();
        assert!(config.validate().is_ok());

        config.quantize.tolerance_ratio = 0.0;
        let err = config.validate().expect_err("zero tolerance must fail");
        assert!(err.to_string().contains("quantize.tolerance_ratio"));

        let mut config = PulseConfig::default();
        config.mix.rendered_weight = f32::INFINITY;
        let err = config.validate().expect_err("infinite weight must fail");
        assert!(err.to_string().contains("mix.rendered_weight"));

        let mut config = PulseConfig::default();
        config.render.collision_window_seconds = -0.1;
        assert!(config.validate().is_err());
    }
}
