use crate::stimulus::condition::ConditionType;
use crate::stimulus::sample::{Coordinates, Disc};

/// Per-frame speed `sqrt(Δx² + Δy²) / Δt`; entry 0 is NaN by construction.
pub fn disc_speeds(xs: &[f64], ys: &[f64], frame_period: f64) -> Vec<f64> {
    let n = xs.len().min(ys.len());
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }
    out.push(f64::NAN);
    for i in 1..n {
        let dx = xs[i] - xs[i - 1];
        let dy = ys[i] - ys[i - 1];
        out.push((dx * dx + dy * dy).sqrt() / frame_period);
    }
    out
}

/// Running sum over finite speed samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeedSum {
    pub sum: f64,
    pub frames: usize,
}

impl SpeedSum {
    pub fn add_speeds(&mut self, speeds: &[f64]) {
        self.add_scaled(speeds, 1.0);
    }

    pub fn add_scaled(&mut self, speeds: &[f64], factor: f64) {
        for &s in speeds.iter().filter(|s| s.is_finite()) {
            self.sum += s * factor;
            self.frames += 1;
        }
    }

    pub fn merge(&mut self, other: SpeedSum) {
        self.sum += other.sum;
        self.frames += other.frames;
    }

    /// `None` when no finite frame was recorded.
    pub fn mean(&self) -> Option<f64> {
        (self.frames > 0).then(|| self.sum / self.frames as f64)
    }
}

/// Speeds of both discs for one trajectory file.
#[derive(Clone, Debug)]
pub struct SpeedProfile {
    pub file: String,
    pub condition: ConditionType,
    pub disc1: Vec<f64>,
    pub disc2: Vec<f64>,
}

impl SpeedProfile {
    pub fn from_coordinates(
        file: String,
        condition: ConditionType,
        coords: &Coordinates,
        frame_period: f64,
    ) -> Self {
        Self {
            file,
            condition,
            disc1: disc_speeds(&coords.x1, &coords.y1, frame_period),
            disc2: disc_speeds(&coords.x2, &coords.y2, frame_period),
        }
    }

    pub fn speeds(&self, disc: Disc) -> &[f64] {
        match disc {
            Disc::One => &self.disc1,
            Disc::Two => &self.disc2,
        }
    }

    pub fn sum(&self, disc: Disc) -> SpeedSum {
        let mut s = SpeedSum::default();
        s.add_speeds(self.speeds(disc));
        s
    }

    /// NaN for a file with fewer than two rows.
    pub fn mean(&self, disc: Disc) -> f64 {
        self.sum(disc).mean().unwrap_or(f64::NAN)
    }
}
