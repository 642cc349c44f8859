use crate::pixel::{PixelIter, PixelPhase, Tolerances};
use crate::reference_orbit::{ReferenceOrbitEngine, ESCAPE_RADIUS_SQ};
use deepzoom_core::{BigComplex, BigReal};

pub const TEST_BITS: usize = 128;

pub fn engine(re: f64, im: f64, exponent: u32) -> ReferenceOrbitEngine {
    let c = BigComplex::new(
        BigReal::with_precision(re, TEST_BITS),
        BigReal::with_precision(im, TEST_BITS),
    );
    ReferenceOrbitEngine::new(c, exponent)
}

/// Step one pixel until it leaves the active phase. The loop bound is twice
/// the cap so a stuck pixel fails the assertion rather than hanging.
pub fn drive_pixel(
    pixel: &mut PixelIter,
    orbit: &mut ReferenceOrbitEngine,
    tol: &Tolerances,
    cap: u64,
) -> PixelPhase {
    for _ in 0..cap * 2 {
        let phase = pixel.step(orbit, tol, cap).expect("orbit step failed");
        if phase != PixelPhase::Active {
            return phase;
        }
    }
    panic!("pixel did not reach a terminal phase within {} steps", cap * 2);
}

/// Escape iteration of `c` under direct high-precision iteration, with the
/// same escape radius the perturbation path uses. `None` means bounded
/// through `cap` iterations.
pub fn direct_escape(c: (f64, f64), exponent: u32, cap: u64) -> Option<u64> {
    let c = BigComplex::new(
        BigReal::with_precision(c.0, TEST_BITS),
        BigReal::with_precision(c.1, TEST_BITS),
    );
    let mut z = BigComplex::zero(TEST_BITS);
    for n in 1..=cap {
        z = z.powi(exponent).add(&c);
        if z.norm_sq_f64() > ESCAPE_RADIUS_SQ {
            return Some(n);
        }
    }
    None
}
