//! Rasterizes one video frame: two filled discs on a flat background.

use plotters::prelude::*;

use crate::config::RenderConfig;
use crate::export::ExportError;

/// Pixel canvas whose origin for stimulus coordinates is the midpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        let px = self.width as f64 / 2.0 + x;
        let py = self.height as f64 / 2.0 + y;
        (px.round() as i32, py.round() as i32)
    }

    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

pub fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

#[derive(Clone, Debug)]
pub struct FrameRenderer {
    pub canvas: Canvas,
    radius: u32,
    disc1: RGBColor,
    disc2: RGBColor,
    background: RGBColor,
}

impl FrameRenderer {
    pub fn new(cfg: &RenderConfig) -> Self {
        Self {
            canvas: Canvas {
                width: cfg.width,
                height: cfg.height,
            },
            radius: cfg.disc_radius,
            disc1: rgb(cfg.disc1_color),
            disc2: rgb(cfg.disc2_color),
            background: rgb(cfg.background),
        }
    }

    pub fn blank_frame(&self) -> Vec<u8> {
        vec![0u8; self.canvas.rgb_len()]
    }

    /// Draw into an RGB24 buffer of `width * height * 3` bytes. Disc 2 is drawn last.
    pub fn render(&self, buf: &mut [u8], p1: (f64, f64), p2: (f64, f64)) -> Result<(), ExportError> {
        let render_err = |reason: String| ExportError::Render {
            path: "<frame buffer>".to_string(),
            reason,
        };
        if buf.len() != self.canvas.rgb_len() {
            return Err(render_err(format!(
                "buffer holds {} bytes, canvas needs {}",
                buf.len(),
                self.canvas.rgb_len()
            )));
        }
        let root = BitMapBackend::with_buffer(buf, (self.canvas.width, self.canvas.height))
            .into_drawing_area();
        root.fill(&self.background)
            .map_err(|e| render_err(e.to_string()))?;
        for (p, color) in [(p1, self.disc1), (p2, self.disc2)] {
            let center = self.canvas.to_pixel(p.0, p.1);
            root.draw(&Circle::new(center, self.radius, color.filled()))
                .map_err(|e| render_err(e.to_string()))?;
        }
        root.present().map_err(|e| render_err(e.to_string()))?;
        Ok(())
    }
}
