//! Stimulus generator for two-disc chasing displays.
//!
//! `generate` synthesizes coupled stochastic trajectories per trial and exports
//! coordinate tables plus videos or trace images; `normalize` derives per-group
//! speed scaling factors from a batch of raw trajectories.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod generate;
pub mod logging;
pub mod speed;
pub mod stimulus;
pub mod worker;

pub use error::{Error, Result};
