/// Maps simulation steps to simulated time and to displayed frames.
#[derive(Clone, Copy, Debug)]
pub struct Timebase {
    /// Integration step in simulated seconds.
    pub dt: f64,
    /// Simulation steps per displayed frame.
    pub stride: usize,
    pub fps: u32,
}

impl Timebase {
    /// Number of frames kept from a run of `n_steps` simulation steps.
    pub fn frame_count(&self, n_steps: usize) -> usize {
        n_steps.div_ceil(self.stride.max(1))
    }

    /// Simulated time covered by `n_steps` integration steps.
    pub fn simulated_duration(&self, n_steps: usize) -> f64 {
        n_steps as f64 * self.dt
    }

    pub fn frame_period(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Display length in seconds of a run of `n_steps` simulation steps.
    pub fn display_duration(&self, n_steps: usize) -> f64 {
        self.frame_count(n_steps) as f64 * self.frame_period()
    }
}
