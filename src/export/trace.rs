use std::path::Path;

use plotters::prelude::*;

use crate::config::RenderConfig;
use crate::export::ExportError;
use crate::export::frames::{Canvas, rgb};
use crate::stimulus::sample::{Coordinates, Disc};

/// Static PNG with each disc's full path as a polyline on white.
pub fn render_trace(path: &Path, coords: &Coordinates, cfg: &RenderConfig) -> Result<(), ExportError> {
    let render_err = |e: &dyn std::fmt::Display| ExportError::Render {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let canvas = Canvas {
        width: cfg.width,
        height: cfg.height,
    };
    let root = BitMapBackend::new(path, (canvas.width, canvas.height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_err(&e))?;

    for (disc, color) in [(Disc::One, cfg.disc1_color), (Disc::Two, cfg.disc2_color)] {
        let (xs, ys) = coords.disc(disc);
        let points: Vec<(i32, i32)> = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| canvas.to_pixel(x, y))
            .collect();
        if points.len() < 2 {
            continue;
        }
        root.draw(&PathElement::new(
            points,
            rgb(color).stroke_width(cfg.line_width),
        ))
        .map_err(|e| render_err(&e))?;
    }

    root.present().map_err(|e| render_err(&e))?;
    Ok(())
}
