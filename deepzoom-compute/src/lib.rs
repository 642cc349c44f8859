//! Perturbation-based escape-time computation for deep zooms.
//!
//! One high-precision reference orbit per worker, f64 deltas per pixel,
//! Fibonacci-cadence checkpoints for rebasing and periodicity windows, and
//! a scheduler that keeps board effort spread across workers.

pub mod backend;
pub mod board;
pub mod cancel;
pub mod error;
pub mod period;
pub mod pixel;
pub mod reference_orbit;
pub mod runner;
pub mod scheduler;

pub use backend::{gpu_buffers_fit, select_backend, BackendKind, GpuCaps};
pub use board::{Board, SliceReport};
pub use cancel::CancelToken;
pub use error::{OrbitError, SessionError};
pub use pixel::{PixelIter, PixelPhase, PixelResult, Tolerances};
pub use reference_orbit::{Checkpoint, Extension, ReferenceOrbitEngine, ESCAPE_RADIUS_SQ};
pub use runner::{render, RenderOutput};
pub use scheduler::{RebalanceOutcome, WorkScheduler};

#[cfg(test)]
mod tests;
