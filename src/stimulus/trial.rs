//! Trial designer: factorial condition × repetition sequence with phase draws.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::phase::draw_phase;
use crate::core::rng::design_stream;
use crate::stimulus::StimulusError;
use crate::stimulus::condition::{ConditionType, TrialKind};

/// Abstract codes the factorial design is built from.
pub const BASE_CODES: [u8; 4] = [1, 2, 3, 4];

/// Base code → final label. The relabel is not injective by construction:
/// 4 reappears as a label because base 2 is moved onto it.
pub fn remap_code(base: u8) -> u8 {
    match base {
        2 => 4,
        3 => 5,
        4 => 8,
        other => other,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub index: usize,
    pub condition: ConditionType,
    pub phase: f64,
}

impl Trial {
    pub fn kind(&self) -> TrialKind {
        self.condition.kind()
    }
}

/// Build `4 * repetitions` trials in blocks of `1, 4, 5, 8`.
///
/// Phases come from the seed's design stream, drawn in index order.
pub fn design_trials(repetitions: usize, seed: u64) -> Result<Vec<Trial>, StimulusError> {
    let mut rng = design_stream(seed);
    design_trials_with(repetitions, &mut rng)
}

pub fn design_trials_with<R: Rng + ?Sized>(
    repetitions: usize,
    rng: &mut R,
) -> Result<Vec<Trial>, StimulusError> {
    if repetitions == 0 {
        return Err(StimulusError::InvalidRepetitions);
    }

    let codes: Vec<u8> = (0..repetitions)
        .flat_map(|_| BASE_CODES.iter().copied())
        .map(remap_code)
        .collect();
    let conditions = validate_labels(&codes, repetitions)?;

    let trials: Vec<Trial> = conditions
        .into_iter()
        .enumerate()
        .map(|(index, condition)| Trial {
            index,
            condition,
            phase: draw_phase(rng),
        })
        .collect();

    debug!(
        target: "design",
        "designed {} trials ({} repetitions)",
        trials.len(),
        repetitions
    );
    Ok(trials)
}

/// Fail fast if the remap produced anything but `{1, 4, 5, 8}` × `repetitions`.
fn validate_labels(codes: &[u8], repetitions: usize) -> Result<Vec<ConditionType>, StimulusError> {
    let conditions = codes
        .iter()
        .map(|&c| ConditionType::new(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut counts: BTreeMap<ConditionType, usize> = BTreeMap::new();
    for &c in &conditions {
        *counts.entry(c).or_default() += 1;
    }
    for condition in ConditionType::ALL {
        let count = counts.get(&condition).copied().unwrap_or(0);
        if count != repetitions {
            return Err(StimulusError::UnbalancedDesign {
                code: condition.code(),
                expected: repetitions,
                actual: count,
            });
        }
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn remap_table() {
        let mapped: Vec<u8> = BASE_CODES.iter().map(|&c| remap_code(c)).collect();
        assert_eq!(mapped, vec![1, 4, 5, 8]);
    }

    #[test]
    fn blocks_cycle_through_conditions() {
        let trials = design_trials(3, 0).expect("design");
        let codes: Vec<u8> = trials.iter().map(|t| t.condition.code()).collect();
        assert_eq!(codes, vec![1, 4, 5, 8, 1, 4, 5, 8, 1, 4, 5, 8]);
        for (i, t) in trials.iter().enumerate() {
            assert_eq!(t.index, i);
            assert!((0.0..TAU).contains(&t.phase));
        }
    }

    #[test]
    fn drifted_labels_fail_validation() {
        let err = validate_labels(&[1, 4, 5, 6], 1).expect_err("6 is not a label");
        assert!(matches!(err, StimulusError::UnexpectedConditionCode { code: 6 }));

        let err = validate_labels(&[1, 4, 5, 5], 1).expect_err("8 is missing");
        assert!(matches!(
            err,
            StimulusError::UnbalancedDesign { code: 5, expected: 1, actual: 2 }
        ));
    }

    #[test]
    fn zero_repetitions_is_rejected() {
        assert!(matches!(
            design_trials(0, 1),
            Err(StimulusError::InvalidRepetitions)
        ));
    }
}
