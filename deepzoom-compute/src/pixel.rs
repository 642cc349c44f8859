//! Per-pixel perturbation iteration.
//!
//! Each pixel tracks a low-precision delta from the shared reference orbit:
//! `δ' = Σ_{k=1..p} C(p,k)·Z^{p−k}·δ^k + δc`, so `Z_{m+1} + δ'` equals the
//! pixel's true iterate to floating error. Pixels detect escape, rebase
//! onto a newer checkpoint when the delta stops being small, and close
//! periodicity windows against baselines snapshotted at anchor iterations.

use crate::error::OrbitError;
use crate::period::checkpoint_distance;
use crate::reference_orbit::{ReferenceOrbitEngine, ESCAPE_RADIUS_SQ};
use deepzoom_core::Complex64;
use serde::{Deserialize, Serialize};

/// Consecutive unrecoverable glitch steps tolerated before the pixel is
/// written off as uninteresting.
const MAX_GLITCH_STREAK: u32 = 64;

/// Pixel lifecycle. `Escaped` and `Periodic` are terminal; `Uninteresting`
/// covers both the iteration cap and unrecoverable glitches (bounded orbit,
/// unknown period).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelPhase {
    Active,
    Escaped,
    Periodic,
    Uninteresting,
}

/// Iteration tolerances, fixed per session.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    /// Tight periodicity tolerance squared, scaled to pixel size.
    pub eps_sq: f64,
    /// Looser secondary tolerance squared; bounds false negatives under
    /// floating noise at depths where `eps` collapses toward zero.
    pub eps2_sq: f64,
    /// Glitch ratio squared: rebase when `|δ|² > ratio²·|actual|²`.
    pub glitch_ratio_sq: f64,
}

impl Tolerances {
    pub fn for_pixel_size(pixel_size: f64) -> Self {
        let eps = (pixel_size * 0.5).max(1e-14);
        Self {
            eps_sq: eps * eps,
            eps2_sq: 1e-18,
            glitch_ratio_sq: 1.0,
        }
    }
}

/// Final report for one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelResult {
    /// Escape iteration, or iterations completed when the pixel settled.
    pub iterations: u64,
    pub escaped: bool,
    /// Iteration at which periodicity closed; 0 = none.
    pub pp: u64,
    /// Reported orbital period; 0 = none.
    pub period: u64,
}

/// One pixel's delta iteration state.
#[derive(Clone, Debug)]
pub struct PixelIter {
    delta_c: Complex64,
    delta: Complex64,
    /// Completed pixel iterations.
    n: u64,
    /// Orbit position the delta is currently relative to.
    m: u64,
    /// Checkpoint iteration last rebased onto (0 = orbit start).
    base_iteration: u64,
    /// Baseline for periodicity closure: the value entering the most
    /// recent anchor iteration.
    baseline: Option<Complex64>,
    /// Value entering the next iteration.
    last_actual: Complex64,
    phase: PixelPhase,
    nn: u64,
    pp: u64,
    period: u64,
    glitch_streak: u32,
}

impl PixelIter {
    /// `delta_c` is this pixel's offset from the reference point.
    pub fn new(delta_c: Complex64) -> Self {
        Self {
            delta_c,
            delta: Complex64::ZERO,
            n: 0,
            m: 0,
            base_iteration: 0,
            baseline: None,
            last_actual: Complex64::ZERO,
            phase: PixelPhase::Active,
            nn: 0,
            pp: 0,
            period: 0,
            glitch_streak: 0,
        }
    }

    pub fn phase(&self) -> PixelPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase != PixelPhase::Active
    }

    pub fn iterations(&self) -> u64 {
        self.n
    }

    pub fn base_iteration(&self) -> u64 {
        self.base_iteration
    }

    pub fn delta(&self) -> Complex64 {
        self.delta
    }

    pub fn result(&self) -> PixelResult {
        PixelResult {
            iterations: if self.phase == PixelPhase::Escaped {
                self.nn
            } else {
                self.n
            },
            escaped: self.phase == PixelPhase::Escaped,
            pp: self.pp,
            period: self.period,
        }
    }

    /// Advance one iteration. Extends the reference orbit on demand; the
    /// only hard failure is orbit precision exhaustion.
    pub fn step(
        &mut self,
        orbit: &mut ReferenceOrbitEngine,
        tol: &Tolerances,
        iteration_cap: u64,
    ) -> Result<PixelPhase, OrbitError> {
        if self.is_terminal() {
            return Ok(self.phase);
        }

        let n = self.n + 1;
        // Anchor snapshot records the state *entering* the anchor
        // iteration, so a closure at iteration n spans exactly
        // checkpoint_distance(n) true iterations. The periodicity check
        // below still runs on this very iteration.
        if checkpoint_distance(n) == 1 {
            self.baseline = Some(self.last_actual);
        }

        orbit.extend_to(self.m + 1)?;
        if self.m + 1 > orbit.last_iteration() {
            // Reference escaped before position m+1: fold the pixel back
            // onto the orbit start, measuring the delta from the seed.
            self.delta = self.last_actual - orbit.value_at(0)?;
            self.m = 0;
            self.base_iteration = 0;
        }

        let z_m = orbit.value_at(self.m)?;
        self.delta = delta_step(z_m, self.delta, self.delta_c, orbit.exponent());
        self.m += 1;
        let actual = orbit.value_at(self.m)? + self.delta;
        self.n = n;

        if actual.norm_sq() > ESCAPE_RADIUS_SQ {
            self.nn = n;
            self.phase = PixelPhase::Escaped;
            return Ok(self.phase);
        }

        if self.delta.norm_sq() > tol.glitch_ratio_sq * actual.norm_sq() {
            self.rebase(orbit)?;
            if self.delta.norm_sq() > tol.glitch_ratio_sq * actual.norm_sq() {
                self.glitch_streak += 1;
                if self.glitch_streak >= MAX_GLITCH_STREAK {
                    self.phase = PixelPhase::Uninteresting;
                    return Ok(self.phase);
                }
            } else {
                self.glitch_streak = 0;
            }
        } else {
            self.glitch_streak = 0;
        }

        if let Some(baseline) = self.baseline {
            let dist_sq = (actual - baseline).norm_sq();
            if dist_sq < tol.eps_sq || dist_sq < tol.eps2_sq {
                self.pp = n;
                self.period = checkpoint_distance(n);
                self.phase = PixelPhase::Periodic;
            }
        }

        self.last_actual = actual;
        if self.phase == PixelPhase::Active && n >= iteration_cap {
            self.phase = PixelPhase::Uninteresting;
        }
        Ok(self.phase)
    }

    /// Re-express the delta against the checkpoint at or before the current
    /// orbit position. The pixel's actual value and iteration count are
    /// unchanged; only the internal representation moves. Idempotent when
    /// no iteration happens in between.
    pub fn rebase(&mut self, orbit: &ReferenceOrbitEngine) -> Result<(), OrbitError> {
        let actual = orbit.value_at(self.m)? + self.delta;
        match orbit.checkpoint_at_or_before(self.m) {
            Some(cp) => {
                self.delta = actual - cp.value;
                self.m = cp.iteration;
                self.base_iteration = cp.iteration;
            }
            None => {
                // No checkpoint yet: the orbit seed anchors.
                self.delta = actual - orbit.value_at(0)?;
                self.m = 0;
                self.base_iteration = 0;
            }
        }
        Ok(())
    }
}

/// One delta advance for exponent `p`:
/// `δ' = (Z + δ)^p − Z^p + δc = Σ_{k=1..p} C(p,k)·Z^{p−k}·δ^k + δc`.
fn delta_step(z: Complex64, delta: Complex64, delta_c: Complex64, p: u32) -> Complex64 {
    if p == 2 {
        // Hot path for the quadratic map.
        return (z * delta).scale(2.0) + delta.square() + delta_c;
    }
    let mut acc = Complex64::ZERO;
    let mut coeff: f64 = 1.0;
    for k in 1..=p {
        coeff = coeff * (p - k + 1) as f64 / k as f64;
        acc = acc + (z.powi(p - k) * delta.powi(k)).scale(coeff);
    }
    acc + delta_c
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepzoom_core::{BigComplex, BigReal};

    #[test]
    fn rebase_without_checkpoints_anchors_on_the_seed() {
        let c = BigComplex::new(
            BigReal::with_precision(0.25, 128),
            BigReal::with_precision(0.0, 128),
        );
        let seed = BigComplex::new(
            BigReal::with_precision(0.5, 128),
            BigReal::with_precision(0.0, 128),
        );
        let orbit = ReferenceOrbitEngine::with_seed(c, seed, 2);
        let mut pixel = PixelIter::new(Complex64::new(1e-3, 0.0));

        pixel.rebase(&orbit).unwrap();
        assert_eq!(pixel.base_iteration(), 0);
        // A fresh pixel sits exactly on the seed; the delta must stay zero
        // even though the seed itself is not.
        assert_eq!(pixel.delta(), Complex64::ZERO);
    }

    #[test]
    fn delta_step_quadratic_preserves_true_iterate() {
        // (Z + δ)² + (c + δc) must equal Z² + c + δ' to floating error.
        let z = Complex64::new(0.3, -0.4);
        let d = Complex64::new(0.01, 0.02);
        let dc = Complex64::new(1e-5, -2e-5);
        let dprime = delta_step(z, d, dc, 2);
        let truth = (z + d).square() + dc - z.square();
        assert!((dprime.re - truth.re).abs() < 1e-15);
        assert!((dprime.im - truth.im).abs() < 1e-15);
    }

    #[test]
    fn delta_step_cubic_preserves_true_iterate() {
        // (Z + δ)³ + (c + δc) must equal Z³ + c + δ' exactly.
        let z = Complex64::new(0.2, 0.1);
        let d = Complex64::new(0.003, -0.001);
        let dc = Complex64::new(1e-4, 1e-4);
        let dprime = delta_step(z, d, dc, 3);
        let truth = (z + d).powi(3) + dc - z.powi(3);
        assert!((dprime.re - truth.re).abs() < 1e-12);
        assert!((dprime.im - truth.im).abs() < 1e-12);
    }
}
