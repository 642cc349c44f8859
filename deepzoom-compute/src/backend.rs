//! Backend admission: CPU vs GPU selection at session construction.
//!
//! The core does not own GPU plumbing; it only consults a capability
//! predicate over buffer sizes and dispatch limits, and falls back to the
//! CPU path unconditionally when the predicate says no.

use serde::{Deserialize, Serialize};

/// Conservative budget for GPU-resident per-pixel buffers.
pub const DEFAULT_GPU_BYTE_BUDGET: u64 = 200 * 1024 * 1024;

/// Per-pixel state bytes a GPU residency would need: delta (2×f64),
/// iteration count, flags, baseline (2×f64), base iteration.
pub const PIXEL_STATE_BYTES: u32 = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Cpu,
    Gpu,
}

/// Device capability envelope supplied by the (external) GPU layer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GpuCaps {
    pub byte_budget: u64,
    /// Upper bound on workgroups per dispatch.
    pub max_workgroups: u32,
    pub workgroup_size: u32,
}

impl Default for GpuCaps {
    fn default() -> Self {
        Self {
            byte_budget: DEFAULT_GPU_BYTE_BUDGET,
            max_workgroups: 65_535,
            workgroup_size: 64,
        }
    }
}

/// True when per-pixel buffers for `dims` fit the byte budget and the
/// dispatch stays within workgroup limits. Monotonic: shrinking either
/// dimension never turns an admitted size into a rejected one.
pub fn gpu_buffers_fit(dims: (u32, u32), bytes_per_pixel: u32, caps: &GpuCaps) -> bool {
    let pixels = dims.0 as u64 * dims.1 as u64;
    let bytes = pixels.saturating_mul(bytes_per_pixel as u64);
    if bytes > caps.byte_budget {
        return false;
    }
    if caps.workgroup_size == 0 {
        return false;
    }
    let workgroups = pixels.div_ceil(caps.workgroup_size as u64);
    workgroups <= caps.max_workgroups as u64
}

/// Choose the execution backend for a session. `None` capabilities means
/// no GPU layer is present at all.
pub fn select_backend(dims: (u32, u32), bytes_per_pixel: u32, caps: Option<&GpuCaps>) -> BackendKind {
    match caps {
        Some(caps) if gpu_buffers_fit(dims, bytes_per_pixel, caps) => BackendKind::Gpu,
        Some(_) => {
            log::warn!(
                "{}x{} at {} B/px exceeds GPU capability; falling back to CPU",
                dims.0,
                dims.1,
                bytes_per_pixel
            );
            BackendKind::Cpu
        }
        None => BackendKind::Cpu,
    }
}
