use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::speed::NormalizeError;
use crate::stimulus::StimulusError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stimulus(#[from] StimulusError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("trial {index} failed: {source}")]
    Trial {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
