use std::path::Path;

use serde::Serialize;

use crate::config::AppConfig;
use crate::export::ExportError;
use crate::stimulus::trial::Trial;

pub const TRIALS_FILE: &str = "trials.csv";
pub const RUN_FILE: &str = "run.json";

#[derive(Serialize)]
struct TrialRow {
    #[serde(rename = "Trial")]
    trial: usize,
    #[serde(rename = "Type")]
    condition: u8,
    #[serde(rename = "Group")]
    group: &'static str,
    #[serde(rename = "Motion")]
    motion: &'static str,
    #[serde(rename = "Phase")]
    phase: f64,
}

/// Trial list for the experiment runtime: `Trial,Type,Group,Motion,Phase`.
pub fn write_trials(path: &Path, trials: &[Trial]) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for t in trials {
        wtr.serialize(TrialRow {
            trial: t.index,
            condition: t.condition.code(),
            group: t.condition.group().name(),
            motion: t.condition.motion().label(),
            phase: t.phase,
        })
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Serialize)]
struct RunRecord<'a> {
    version: &'static str,
    n_trials: usize,
    scaling_factors: Option<&'a str>,
    config: &'a AppConfig,
}

/// Resolved configuration of a `generate` run, for provenance.
pub fn write_run_record(path: &Path, cfg: &AppConfig, n_trials: usize) -> Result<(), ExportError> {
    let record = RunRecord {
        version: env!("CARGO_PKG_VERSION"),
        n_trials,
        scaling_factors: cfg.render.scaling_factors.as_deref(),
        config: cfg,
    };
    let text = serde_json::to_string_pretty(&record).map_err(|source| ExportError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
