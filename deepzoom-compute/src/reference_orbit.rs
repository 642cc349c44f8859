//! Reference orbit engine.
//!
//! Iterates one shared orbit at high precision and stores f64 mirrors for
//! the delta arithmetic (orbit values are bounded by the escape radius, so
//! the mirror loses nothing the perturbation loop can use). Checkpoints are
//! recorded at the cadence from [`crate::period`] and serve as rebasing
//! anchors for pixel iterators.

use crate::error::OrbitError;
use crate::period::checkpoint_distance;
use deepzoom_core::{BigComplex, Complex64};

/// Escape radius 256; squared for norm comparisons.
pub const ESCAPE_RADIUS_SQ: f64 = 65536.0;

/// A recorded (iteration, value) snapshot of the reference orbit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkpoint {
    pub iteration: u64,
    pub value: Complex64,
}

/// Result of one successful `extend` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extension {
    /// Appended the value for this iteration.
    Extended(u64),
    /// The orbit escaped at this iteration; it will not grow further.
    Escaped(u64),
}

/// Owns and extends one reference orbit. The orbit is append-only: values
/// and checkpoints are never rewritten.
pub struct ReferenceOrbitEngine {
    c: BigComplex,
    c_mirror: Complex64,
    exponent: u32,
    /// High-precision state after `orbit.len() - 1` iterations.
    z: BigComplex,
    /// orbit[i] = z_i as f64; orbit[0] is the seed.
    orbit: Vec<Complex64>,
    checkpoints: Vec<Checkpoint>,
    escaped_at: Option<u64>,
}

impl ReferenceOrbitEngine {
    /// Start an orbit at the standard seed z_0 = 0.
    pub fn new(c: BigComplex, exponent: u32) -> Self {
        let bits = c.precision_bits();
        Self::with_seed(c, BigComplex::zero(bits), exponent)
    }

    pub fn with_seed(c: BigComplex, seed: BigComplex, exponent: u32) -> Self {
        debug_assert!(exponent >= 2);
        let c_mirror = {
            let (re, im) = c.to_f64_pair();
            Complex64::new(re, im)
        };
        let (sx, sy) = seed.to_f64_pair();
        Self {
            c,
            c_mirror,
            exponent,
            z: seed,
            orbit: vec![Complex64::new(sx, sy)],
            checkpoints: Vec::new(),
            escaped_at: None,
        }
    }

    /// Append one orbit value: z_{n} = z_{n-1}^p + c.
    ///
    /// Once escaped, further calls report the escape without growing the
    /// orbit. A non-finite mirror means the high-precision step can no
    /// longer be represented and the session must abort.
    pub fn extend(&mut self) -> Result<Extension, OrbitError> {
        if let Some(n) = self.escaped_at {
            return Ok(Extension::Escaped(n));
        }

        let next = self.z.powi(self.exponent).add(&self.c);
        let (re, im) = next.to_f64_pair();
        let mirror = Complex64::new(re, im);
        let n = self.orbit.len() as u64;
        if !mirror.is_finite() {
            return Err(OrbitError::PrecisionExhausted { iteration: n });
        }

        self.z = next;
        self.orbit.push(mirror);

        if mirror.norm_sq() > ESCAPE_RADIUS_SQ {
            self.escaped_at = Some(n);
            return Ok(Extension::Escaped(n));
        }
        if checkpoint_distance(n) == 1 {
            self.checkpoints.push(Checkpoint {
                iteration: n,
                value: mirror,
            });
        }
        Ok(Extension::Extended(n))
    }

    /// Extend until the orbit holds iterations 0..=n, stopping early on
    /// escape.
    pub fn extend_to(&mut self, n: u64) -> Result<(), OrbitError> {
        while self.len() <= n && self.escaped_at.is_none() {
            self.extend()?;
        }
        Ok(())
    }

    /// Number of stored orbit values (iterations 0..len-1).
    pub fn len(&self) -> u64 {
        self.orbit.len() as u64
    }

    pub fn escaped_at(&self) -> Option<u64> {
        self.escaped_at
    }

    /// Last usable orbit iteration index.
    pub fn last_iteration(&self) -> u64 {
        self.len() - 1
    }

    /// Direct indexed lookup; the caller extends first.
    pub fn value_at(&self, iteration: u64) -> Result<Complex64, OrbitError> {
        self.orbit
            .get(iteration as usize)
            .copied()
            .ok_or(OrbitError::IndexOutOfRange {
                requested: iteration,
                len: self.len(),
            })
    }

    /// Checkpoint with the greatest iteration `<= iteration`, if any has
    /// been recorded yet. Never returns a checkpoint beyond the orbit's
    /// current length (checkpoints are only written on append).
    pub fn checkpoint_at_or_before(&self, iteration: u64) -> Option<Checkpoint> {
        let idx = self
            .checkpoints
            .partition_point(|cp| cp.iteration <= iteration);
        idx.checked_sub(1).map(|i| self.checkpoints[i])
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Reference point as an f64 mirror, for delta-c construction.
    pub fn c_mirror(&self) -> Complex64 {
        self.c_mirror
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }
}
