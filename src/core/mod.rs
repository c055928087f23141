//! Numeric primitives without stimulus semantics.

pub mod linalg;
pub mod phase;
pub mod rng;
pub mod timebase;
