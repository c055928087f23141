//! Speed normalization across synchrony groups.

pub mod factors;
pub mod normalizer;
pub mod profile;

use thiserror::Error;

use crate::export::ExportError;
use crate::stimulus::condition::ConditionGroup;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("cannot scan {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: walkdir::Error,
    },
    #[error("no raw trajectory files found under {path}")]
    NoFiles { path: String },
    #[error("failed to process {path}: {source}")]
    File {
        path: String,
        #[source]
        source: ExportError,
    },
    #[error("group {group} has no recorded frames for disc {disc}")]
    EmptyGroup { group: ConditionGroup, disc: u8 },
    #[error("group {group} disc {disc} has mean speed {mean}; scaling factor undefined")]
    ZeroSpeed {
        group: ConditionGroup,
        disc: u8,
        mean: f64,
    },
    #[error(
        "group {group} disc {disc}: types {type_a} and {type_b} differ by {relative_gap:.3} (relative)"
    )]
    Inconsistent {
        group: ConditionGroup,
        disc: u8,
        type_a: u8,
        type_b: u8,
        relative_gap: f64,
    },
    #[error("group {group} disc {disc}: rescaled mean {achieved} misses target {target}")]
    AcceptanceFailed {
        group: ConditionGroup,
        disc: u8,
        achieved: f64,
        target: f64,
    },
    #[error("invalid scaling factors in {path}: {reason}")]
    InvalidFactors { path: String, reason: String },
    #[error(transparent)]
    Export(#[from] ExportError),
}
