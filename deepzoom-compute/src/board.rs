//! Boards: independently schedulable pixel regions.
//!
//! A board owns the per-pixel delta state for its rectangle. Exactly one
//! worker drives a board at a time; between slices a board is at rest and
//! can change hands.

use crate::error::OrbitError;
use crate::pixel::{PixelIter, PixelResult, Tolerances};
use crate::reference_orbit::ReferenceOrbitEngine;
use deepzoom_core::{Complex64, PixelRect};

/// What one bounded slice of work accomplished.
#[derive(Clone, Copy, Debug, Default)]
pub struct SliceReport {
    pub iterations_computed: u64,
    pub pixels_resolved: u32,
    /// Scheduler effort consumed: iterations plus the released remainder of
    /// every pixel that reached a terminal state.
    pub effort_consumed: f64,
}

pub struct Board {
    id: u32,
    rect: PixelRect,
    pixels: Vec<PixelIter>,
    active: u32,
}

impl Board {
    /// Build a board for `rect` within an image of `image_dims` pixels.
    /// Deltas are measured from the image center, which is the reference
    /// point.
    pub fn new(id: u32, rect: PixelRect, image_dims: (u32, u32), pixel_size: f64) -> Self {
        let (iw, ih) = image_dims;
        let cx = iw as f64 / 2.0;
        let cy = ih as f64 / 2.0;
        let mut pixels = Vec::with_capacity(rect.area() as usize);
        for py in rect.y..rect.y + rect.height {
            for px in rect.x..rect.x + rect.width {
                let dx = (px as f64 + 0.5 - cx) * pixel_size;
                // Pixel rows grow downward; the imaginary axis grows upward.
                let dy = (cy - (py as f64 + 0.5)) * pixel_size;
                pixels.push(PixelIter::new(Complex64::new(dx, dy)));
            }
        }
        let active = pixels.len() as u32;
        Self {
            id,
            rect,
            pixels,
            active,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Scheduler effort estimate at assignment time.
    pub fn initial_effort(&self, iteration_cap: u64) -> f64 {
        self.rect.area() as f64 * iteration_cap as f64
    }

    pub fn active_pixels(&self) -> u32 {
        self.active
    }

    pub fn is_done(&self) -> bool {
        self.active == 0
    }

    /// Advance every active pixel by up to `budget` iterations. Returning
    /// from this method is the board's safe suspension point.
    pub fn step_slice(
        &mut self,
        orbit: &mut ReferenceOrbitEngine,
        tol: &Tolerances,
        iteration_cap: u64,
        budget: u64,
    ) -> Result<SliceReport, OrbitError> {
        let mut report = SliceReport::default();
        for pixel in &mut self.pixels {
            if pixel.is_terminal() {
                continue;
            }
            for _ in 0..budget {
                let phase = pixel.step(orbit, tol, iteration_cap)?;
                report.iterations_computed += 1;
                if phase != crate::pixel::PixelPhase::Active {
                    break;
                }
            }
            if pixel.is_terminal() {
                self.active -= 1;
                report.pixels_resolved += 1;
                // Release the rest of this pixel's estimated effort.
                report.effort_consumed +=
                    iteration_cap.saturating_sub(pixel.iterations()) as f64;
            }
        }
        report.effort_consumed += report.iterations_computed as f64;
        Ok(report)
    }

    /// Row-major per-pixel results for this board's rectangle.
    pub fn results(&self) -> Vec<PixelResult> {
        self.pixels.iter().map(|p| p.result()).collect()
    }
}
