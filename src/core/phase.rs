use std::f64::consts::TAU;

use rand::Rng;

#[inline]
pub fn wrap_0_tau(x: f64) -> f64 {
    let w = x.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs.
    if w >= TAU { 0.0 } else { w }
}

/// Uniform phase offset in [0, 2π).
pub fn draw_phase<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    wrap_0_tau(rng.random_range(0.0..TAU))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn wrap_0_tau_in_range() {
        let values = [-10.0 * TAU, -TAU, -PI, -0.1, -1e-18, 0.0, PI, TAU, 3.5 * TAU];
        for v in values {
            let w = wrap_0_tau(v);
            assert!((0.0..TAU).contains(&w), "wrap_0_tau out of range: {w}");
        }
    }

    #[test]
    fn drawn_phases_cover_circle() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let phases: Vec<f64> = (0..2000).map(|_| draw_phase(&mut rng)).collect();
        assert!(phases.iter().all(|p| (0.0..TAU).contains(p)));
        let upper_half = phases.iter().filter(|&&p| p >= PI).count();
        assert!((800..1200).contains(&upper_half), "upper_half={upper_half}");
    }
}
