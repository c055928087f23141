use crate::stimulus::sample::{Coordinates, Disc};

/// Keep rows `0, stride, 2·stride, …` (exact selection, no averaging).
pub fn downsample(coords: &Coordinates, stride: usize) -> Coordinates {
    let stride = stride.max(1);
    let pick = |col: &[f64]| col.iter().step_by(stride).copied().collect::<Vec<f64>>();
    Coordinates {
        x1: pick(&coords.x1),
        y1: pick(&coords.y1),
        x2: pick(&coords.x2),
        y2: pick(&coords.y2),
    }
}

pub fn scale(coords: &mut Coordinates, factor: f64) {
    scale_disc(coords, Disc::One, factor);
    scale_disc(coords, Disc::Two, factor);
}

pub fn scale_disc(coords: &mut Coordinates, disc: Disc, factor: f64) {
    let (xs, ys) = coords.disc_mut(disc);
    for v in xs.iter_mut().chain(ys.iter_mut()) {
        *v *= factor;
    }
}
