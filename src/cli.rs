use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, RenderMode};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config TOML (written with commented defaults if missing)
    #[arg(long, global = true, default_value = "chasegen.toml")]
    pub config: String,

    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Synthesize trials and export coordinates, videos or trace images
    Generate(GenerateArgs),
    /// Derive per-group speed scaling factors from raw trajectory files
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Master seed (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Repetitions per condition type (overrides config)
    #[arg(long)]
    pub repetitions: Option<usize>,

    /// Output directory (overrides config)
    #[arg(long)]
    pub out: Option<String>,

    /// Render mode: video, image or none (overrides config)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<RenderMode>,

    /// Scaling factors CSV from a previous normalize run
    #[arg(long)]
    pub factors: Option<String>,

    /// Worker threads, 0 = available parallelism (overrides config)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Directory holding `*_raw.csv` trajectory files
    #[arg(long, value_name = "DIR")]
    pub raw_dir: PathBuf,

    /// Output directory for summaries and factors (overrides config)
    #[arg(long, value_name = "DIR")]
    pub out: Option<String>,
}

fn parse_mode(s: &str) -> Result<RenderMode, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "video" => Ok(RenderMode::Video),
        "image" => Ok(RenderMode::Image),
        "none" => Ok(RenderMode::None),
        other => Err(format!("unknown mode `{other}` (expected video, image or none)")),
    }
}

impl GenerateArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(seed) = self.seed {
            cfg.design.seed = seed;
        }
        if let Some(reps) = self.repetitions {
            cfg.design.repetitions = reps;
        }
        if let Some(out) = &self.out {
            cfg.generate.out_dir = out.clone();
        }
        if let Some(mode) = self.mode {
            cfg.render.mode = mode;
        }
        if let Some(factors) = &self.factors {
            cfg.render.scaling_factors = Some(factors.clone());
        }
        if let Some(workers) = self.workers {
            cfg.generate.workers = workers;
        }
    }
}

impl NormalizeArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(out) = &self.out {
            cfg.normalize.out_dir = out.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flags_override_config() {
        let cli = Cli::parse_from([
            "chasegen",
            "generate",
            "--seed",
            "7",
            "--repetitions",
            "3",
            "--mode",
            "image",
            "--factors",
            "f.csv",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let mut cfg = AppConfig::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.design.seed, 7);
        assert_eq!(cfg.design.repetitions, 3);
        assert_eq!(cfg.render.mode, RenderMode::Image);
        assert_eq!(cfg.render.scaling_factors.as_deref(), Some("f.csv"));
        assert_eq!(cfg.generate.out_dir, AppConfig::default().generate.out_dir);
    }

    #[test]
    fn normalize_requires_raw_dir() {
        assert!(Cli::try_parse_from(["chasegen", "normalize"]).is_err());
        let cli = Cli::try_parse_from([
            "chasegen",
            "--config",
            "x.toml",
            "normalize",
            "--raw-dir",
            "out/raw",
        ])
        .expect("parse");
        assert_eq!(cli.config, "x.toml");
        assert!(matches!(cli.command, Command::Normalize(ref a) if a.raw_dir == PathBuf::from("out/raw")));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["chasegen", "generate", "--mode", "gif"]).is_err());
    }
}
