use std::error::Error;
use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use chasegen::cli::{Cli, Command};
use chasegen::config::AppConfig;
use chasegen::logging::init_tracing;
use chasegen::speed::normalizer::SpeedNormalizer;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut cfg = AppConfig::load_or_init(&cli.config)?;
    match &cli.command {
        Command::Generate(args) => {
            args.apply(&mut cfg);
            let report = chasegen::generate::run(&cfg)?;
            if !report.normalized {
                info!(
                    "run `chasegen normalize --raw-dir {}` to derive scaling factors",
                    report.raw_dir().display()
                );
            }
        }
        Command::Normalize(args) => {
            args.apply(&mut cfg);
            cfg.validate()?;
            let normalizer = SpeedNormalizer::new(&cfg.normalize, cfg.render.frame_period());
            let report = normalizer.run(&args.raw_dir, Path::new(&cfg.normalize.out_dir))?;
            for path in &report.skipped {
                warn!("skipped {}", path.display());
            }
            println!(
                "Normalized {} files; factors saved to {}",
                report.files,
                report.factors_path.display()
            );
        }
    }
    Ok(())
}
