use tracing::debug;

use crate::core::rng::trial_stream;
use crate::stimulus::StimulusError;
use crate::stimulus::downsample::downsample;
use crate::stimulus::integrator::simulate;
use crate::stimulus::params::SimulationParams;
use crate::stimulus::sample::Sample;
use crate::stimulus::transform::apply_condition;
use crate::stimulus::trial::Trial;

/// Simulate → condition transform → downsample, in state-space units.
///
/// Pure in `(trial, params, seed)`: the noise comes from the trial's own stream.
pub fn synthesize(trial: &Trial, params: &SimulationParams, seed: u64) -> Result<Sample, StimulusError> {
    let kind = trial.kind();
    let mut rng = trial_stream(seed, trial.index);
    let trajectory = simulate(params, kind.coupling(), trial.phase, &mut rng)?;
    let transformed = apply_condition(&kind, trajectory.into_coordinates());
    let coords = downsample(&transformed, params.stride);

    if !coords.all_finite() {
        return Err(StimulusError::NonFiniteState { step: params.n_steps });
    }
    debug!(
        target: "pipeline",
        "trial {} type {}: {} frames",
        trial.index,
        trial.condition,
        coords.len()
    );
    Ok(Sample {
        trial: *trial,
        coords,
    })
}
