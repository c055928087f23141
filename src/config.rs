use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::stimulus::params::SimulationParams;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_n_steps")]
    pub n_steps: usize,
    #[serde(default = "SimulationConfig::default_dt")]
    pub dt: f64,
    /// Diagonal entry of the single-disc decay matrix.
    #[serde(default = "SimulationConfig::default_decay")]
    pub decay: f64,
    #[serde(default = "SimulationConfig::default_noise_scale")]
    pub noise_scale: f64,
    #[serde(default = "SimulationConfig::default_forcing_amplitude")]
    pub forcing_amplitude: f64,
    /// Time divisors of the sinusoidal forcing, one per state axis (x1, y1, x2, y2).
    #[serde(default = "SimulationConfig::default_forcing_divisors")]
    pub forcing_divisors: [f64; 4],
    /// Std-dev of the Gaussian perturbation around the origin at step 0.
    #[serde(default = "SimulationConfig::default_initial_jitter")]
    pub initial_jitter: f64,
    #[serde(default = "SimulationConfig::default_stride")]
    pub stride: usize,
    #[serde(default = "SimulationConfig::default_pixel_scale")]
    pub pixel_scale: f64,
}

impl SimulationConfig {
    fn default_n_steps() -> usize {
        3584
    }
    fn default_dt() -> f64 {
        0.025
    }
    fn default_decay() -> f64 {
        -0.01
    }
    fn default_noise_scale() -> f64 {
        10.0
    }
    fn default_forcing_amplitude() -> f64 {
        3.0
    }
    fn default_forcing_divisors() -> [f64; 4] {
        [7.0, 10.0, 2.0, 1.5]
    }
    fn default_initial_jitter() -> f64 {
        1e-3
    }
    fn default_stride() -> usize {
        4
    }
    fn default_pixel_scale() -> f64 {
        250.0
    }

    /// Validate and freeze into the record passed to every pipeline stage.
    pub fn params(&self) -> Result<SimulationParams, ConfigError> {
        if self.n_steps < 2 {
            return Err(invalid("simulation.n_steps", "must be at least 2"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid("simulation.dt", "must be finite and positive"));
        }
        if self.stride == 0 {
            return Err(invalid("simulation.stride", "must be positive"));
        }
        if self.forcing_divisors.iter().any(|d| !d.is_finite() || *d == 0.0) {
            return Err(invalid(
                "simulation.forcing_divisors",
                "every divisor must be finite and non-zero",
            ));
        }
        if !(self.pixel_scale.is_finite() && self.pixel_scale > 0.0) {
            return Err(invalid("simulation.pixel_scale", "must be finite and positive"));
        }
        if !(self.initial_jitter.is_finite() && self.initial_jitter >= 0.0) {
            return Err(invalid("simulation.initial_jitter", "must be finite and >= 0"));
        }
        Ok(SimulationParams::new(self))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_steps: Self::default_n_steps(),
            dt: Self::default_dt(),
            decay: Self::default_decay(),
            noise_scale: Self::default_noise_scale(),
            forcing_amplitude: Self::default_forcing_amplitude(),
            forcing_divisors: Self::default_forcing_divisors(),
            initial_jitter: Self::default_initial_jitter(),
            stride: Self::default_stride(),
            pixel_scale: Self::default_pixel_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignConfig {
    #[serde(default = "DesignConfig::default_repetitions")]
    pub repetitions: usize,
    #[serde(default)]
    pub seed: u64,
}

impl DesignConfig {
    fn default_repetitions() -> usize {
        10
    }
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            repetitions: Self::default_repetitions(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    Video,
    Image,
    None,
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::Video
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VideoBackend {
    Ffmpeg,
    PngSequence,
}

impl Default for VideoBackend {
    fn default() -> Self {
        Self::Ffmpeg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default)]
    pub video_backend: VideoBackend,
    #[serde(default = "RenderConfig::default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "RenderConfig::default_width")]
    pub width: u32,
    #[serde(default = "RenderConfig::default_height")]
    pub height: u32,
    #[serde(default = "RenderConfig::default_fps")]
    pub fps: u32,
    #[serde(default = "RenderConfig::default_disc_radius")]
    pub disc_radius: u32,
    #[serde(default = "RenderConfig::default_disc1_color")]
    pub disc1_color: [u8; 3],
    #[serde(default = "RenderConfig::default_disc2_color")]
    pub disc2_color: [u8; 3],
    /// Video background; static trace images are always white.
    #[serde(default = "RenderConfig::default_background")]
    pub background: [u8; 3],
    #[serde(default = "RenderConfig::default_line_width")]
    pub line_width: u32,
    /// Scaling factors CSV from a previous `normalize` run.
    #[serde(default)]
    pub scaling_factors: Option<String>,
}

impl RenderConfig {
    fn default_ffmpeg_path() -> String {
        "ffmpeg".to_string()
    }
    fn default_width() -> u32 {
        1280
    }
    fn default_height() -> u32 {
        1024
    }
    fn default_fps() -> u32 {
        60
    }
    fn default_disc_radius() -> u32 {
        20
    }
    fn default_disc1_color() -> [u8; 3] {
        [220, 40, 40]
    }
    fn default_disc2_color() -> [u8; 3] {
        [40, 90, 220]
    }
    fn default_background() -> [u8; 3] {
        [0, 0, 0]
    }
    fn default_line_width() -> u32 {
        2
    }

    /// Seconds between two displayed frames.
    pub fn frame_period(&self) -> f64 {
        1.0 / self.fps as f64
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            video_backend: VideoBackend::default(),
            ffmpeg_path: Self::default_ffmpeg_path(),
            width: Self::default_width(),
            height: Self::default_height(),
            fps: Self::default_fps(),
            disc_radius: Self::default_disc_radius(),
            disc1_color: Self::default_disc1_color(),
            disc2_color: Self::default_disc2_color(),
            background: Self::default_background(),
            line_width: Self::default_line_width(),
            scaling_factors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    #[serde(default = "GenerateConfig::default_out_dir")]
    pub out_dir: String,
    /// Worker threads; 0 uses the available parallelism.
    #[serde(default)]
    pub workers: usize,
}

impl GenerateConfig {
    fn default_out_dir() -> String {
        "output".to_string()
    }

    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileErrorPolicy {
    Abort,
    Skip,
}

impl Default for FileErrorPolicy {
    fn default() -> Self {
        Self::Abort
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizeConfig {
    #[serde(default = "NormalizeConfig::default_out_dir")]
    pub out_dir: String,
    #[serde(default)]
    pub on_file_error: FileErrorPolicy,
    /// Max relative mean-speed gap between the two types pooled into one group.
    #[serde(default = "NormalizeConfig::default_consistency_tolerance")]
    pub consistency_tolerance: f64,
    #[serde(default)]
    pub strict_consistency: bool,
    #[serde(default = "NormalizeConfig::default_acceptance_tolerance")]
    pub acceptance_tolerance: f64,
}

impl NormalizeConfig {
    fn default_out_dir() -> String {
        "speed".to_string()
    }
    fn default_consistency_tolerance() -> f64 {
        0.15
    }
    fn default_acceptance_tolerance() -> f64 {
        1e-6
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            on_file_error: FileErrorPolicy::default(),
            consistency_tolerance: Self::default_consistency_tolerance(),
            strict_consistency: false,
            acceptance_tolerance: Self::default_acceptance_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub design: DesignConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

impl AppConfig {
    fn format_f64_compact(x: f64) -> String {
        let mut s = format!("{:.6}", x);
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        if s.is_empty() || s == "-0" { "0".to_string() } else { s }
    }

    /// Strict loader: a missing file yields defaults, anything unreadable is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.params()?;
        if self.design.repetitions == 0 {
            return Err(invalid("design.repetitions", "must be at least 1"));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid("render.width/height", "canvas must be non-empty"));
        }
        if self.render.fps == 0 {
            return Err(invalid("render.fps", "must be positive"));
        }
        if !(self.normalize.acceptance_tolerance > 0.0) {
            return Err(invalid("normalize.acceptance_tolerance", "must be positive"));
        }
        if !(self.normalize.consistency_tolerance >= 0.0) {
            return Err(invalid("normalize.consistency_tolerance", "must be >= 0"));
        }
        Ok(())
    }

    /// CLI loader. An existing file is loaded strictly, so parse and validation
    /// errors abort the run. A missing file yields defaults and is created with
    /// every key commented out.
    pub fn load_or_init(path: &str) -> Result<Self, ConfigError> {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            return Self::load(path_obj);
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, Self::commented(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}"),
        }
        Ok(default_cfg)
    }

    fn commented(text: &str) -> String {
        let mut commented = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                commented.push('\n');
            } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                commented.push_str(line);
                commented.push('\n');
            } else {
                let mut out_line = line.to_string();
                if let Some((lhs, rhs)) = line.split_once('=') {
                    let rhs_trim = rhs.trim();
                    let has_decimal = rhs_trim.contains('.');
                    let has_exponent = rhs_trim.contains(['e', 'E']);
                    if has_decimal
                        && !has_exponent
                        && !rhs_trim.contains('"')
                        && !rhs_trim.starts_with('[')
                    {
                        if let Ok(val) = rhs_trim.parse::<f64>() {
                            let mut formatted = Self::format_f64_compact(val);
                            if !formatted.contains('.') {
                                formatted.push_str(".0");
                            }
                            // Compact form only when it reads back as the same value.
                            if formatted.parse::<f64>() == Ok(val) {
                                out_line = format!("{} = {}", lhs.trim(), formatted);
                            }
                        }
                    }
                }
                commented.push_str("# ");
                commented.push_str(&out_line);
                commented.push('\n');
            }
        }
        commented
    }
}
