//! File outputs: coordinate tables, videos, trace images and the run manifest.

pub mod frames;
pub mod manifest;
pub mod naming;
pub mod trace;
pub mod trajectory_csv;
pub mod video;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: missing column `{column}`")]
    MissingColumn { path: String, column: &'static str },
    #[error("{path}: row {row}: {reason}")]
    Malformed {
        path: String,
        row: usize,
        reason: String,
    },
    #[error("drawing {path} failed: {reason}")]
    Render { path: String, reason: String },
    #[error("writing image {path} failed: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("video encoder for {path} failed: {reason}")]
    Encoder { path: String, reason: String },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
