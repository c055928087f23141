use nalgebra::Matrix2;

use crate::config::SimulationConfig;
use crate::core::timebase::Timebase;

/// Immutable integration parameters, built once per run from validated config.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    pub n_steps: usize,
    pub dt: f64,
    /// Single-disc decay block `j`.
    pub decay: Matrix2<f64>,
    pub noise_scale: f64,
    pub forcing_amplitude: f64,
    /// Empirically chosen for perceptual plausibility; distinct per axis so the
    /// motion never looks periodic.
    pub forcing_divisors: [f64; 4],
    pub initial_jitter: f64,
    pub stride: usize,
    pub pixel_scale: f64,
}

impl SimulationParams {
    pub(crate) fn new(cfg: &SimulationConfig) -> Self {
        Self {
            n_steps: cfg.n_steps,
            dt: cfg.dt,
            decay: Matrix2::from_diagonal_element(cfg.decay),
            noise_scale: cfg.noise_scale,
            forcing_amplitude: cfg.forcing_amplitude,
            forcing_divisors: cfg.forcing_divisors,
            initial_jitter: cfg.initial_jitter,
            stride: cfg.stride,
            pixel_scale: cfg.pixel_scale,
        }
    }

    pub fn timebase(&self, fps: u32) -> Timebase {
        Timebase {
            dt: self.dt,
            stride: self.stride,
            fps,
        }
    }

    /// Number of points left after downsampling.
    pub fn downsampled_len(&self) -> usize {
        self.n_steps.div_ceil(self.stride.max(1))
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
