//! Condition transform: encodes "directed motion absent" as a reflection of
//! disc 2 instead of a different integrator.
//!
//! Reversing disc 2 in time breaks the alignment that reads as pursuit, while
//! per-frame displacement magnitudes (hence speed statistics) are unchanged.

use crate::stimulus::condition::TrialKind;
use crate::stimulus::sample::Coordinates;

pub fn apply_condition(kind: &TrialKind, mut coords: Coordinates) -> Coordinates {
    match kind {
        TrialKind::DirectedPresent(_) => coords,
        TrialKind::DirectedAbsent(_) => {
            reflect_disc2(&mut coords);
            coords
        }
    }
}

/// `X2 ← reverse(X2)`, `Y2 ← −reverse(Y2)`; disc 1 untouched.
pub fn reflect_disc2(coords: &mut Coordinates) {
    coords.x2.reverse();
    coords.y2.reverse();
    for y in coords.y2.iter_mut() {
        *y = -*y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::condition::CouplingMatrix;

    fn ramp() -> Coordinates {
        let mut c = Coordinates::default();
        for i in 0..5 {
            let v = i as f64;
            c.push([v, 2.0 * v, 3.0 * v, 4.0 * v + 1.0]);
        }
        c
    }

    #[test]
    fn present_is_identity() {
        let kind = TrialKind::DirectedPresent(CouplingMatrix::from_magnitude(1.0));
        assert_eq!(apply_condition(&kind, ramp()), ramp());
    }

    #[test]
    fn absent_reverses_and_negates_disc2_only() {
        let kind = TrialKind::DirectedAbsent(CouplingMatrix::from_magnitude(1.0));
        let src = ramp();
        let out = apply_condition(&kind, src.clone());
        assert_eq!(out.x1, src.x1);
        assert_eq!(out.y1, src.y1);
        assert_eq!(out.x2, vec![12.0, 9.0, 6.0, 3.0, 0.0]);
        assert_eq!(out.y2, vec![-17.0, -13.0, -9.0, -5.0, -1.0]);
    }
}
