use std::collections::BTreeMap;
use std::f64::consts::TAU;

use chasegen::stimulus::condition::{ConditionGroup, ConditionType, Motion, TrialKind};
use chasegen::stimulus::trial::design_trials;

#[test]
fn forty_trials_ten_per_type() {
    let trials = design_trials(10, 2024).expect("design");
    assert_eq!(trials.len(), 40);

    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for t in &trials {
        *counts.entry(t.condition.code()).or_default() += 1;
        assert!((0.0..TAU).contains(&t.phase), "phase {} out of range", t.phase);
    }
    assert_eq!(counts, BTreeMap::from([(1, 10), (4, 10), (5, 10), (8, 10)]));
}

#[test]
fn first_trial_is_type_one() {
    let trials = design_trials(10, 0).expect("design");
    assert_eq!(trials[0].condition.code(), 1);
    assert_eq!(trials[0].index, 0);
}

#[test]
fn same_seed_same_phases() {
    let a = design_trials(5, 99).expect("design");
    let b = design_trials(5, 99).expect("design");
    let c = design_trials(5, 100).expect("design");
    assert_eq!(a, b);
    assert_ne!(
        a.iter().map(|t| t.phase).collect::<Vec<_>>(),
        c.iter().map(|t| t.phase).collect::<Vec<_>>()
    );
}

#[test]
fn types_map_to_motion_and_group() {
    let cases = [
        (1, Motion::Present, ConditionGroup::Low),
        (4, Motion::Present, ConditionGroup::High),
        (5, Motion::Absent, ConditionGroup::Low),
        (8, Motion::Absent, ConditionGroup::High),
    ];
    for (code, motion, group) in cases {
        let c = ConditionType::new(code).expect("valid code");
        assert_eq!(c.motion(), motion, "type {code}");
        assert_eq!(c.group(), group, "type {code}");
    }
    assert!(matches!(
        ConditionType::new(8).expect("valid").kind(),
        TrialKind::DirectedAbsent(_)
    ));
    assert!(ConditionType::new(2).is_err());
}
