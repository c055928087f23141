//! Trajectory synthesis: trial design, integration, condition transform and
//! downsampling.

pub mod condition;
pub mod downsample;
pub mod integrator;
pub mod params;
pub mod pipeline;
pub mod sample;
pub mod transform;
pub mod trial;

use thiserror::Error;

/// Errors raised while designing or synthesizing trials. All are fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StimulusError {
    #[error("repetition count must be at least 1")]
    InvalidRepetitions,
    #[error("unexpected condition code {code} after remap (expected one of 1, 4, 5, 8)")]
    UnexpectedConditionCode { code: u8 },
    #[error("condition {code} appears {actual} times, expected {expected}")]
    UnbalancedDesign {
        code: u8,
        expected: usize,
        actual: usize,
    },
    #[error("matrix exponential of the coupling is not finite")]
    NonFiniteExponential,
    #[error("integration produced a non-finite state at step {step}")]
    NonFiniteState { step: usize },
    #[error("trajectory length must be positive")]
    EmptyTrajectory,
}
