//! Session configuration.
//!
//! A session is one rendering run tied to a fixed center and zoom. Center
//! and pixel size are carried as decimal strings so coordinates beyond f64
//! range survive serialization intact.

use crate::{precision_bits_for, BigComplex, BigReal};
use serde::{Deserialize, Serialize};

/// Parameters for one rendering session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Center real part, decimal string.
    pub center_x: String,
    /// Center imaginary part, decimal string.
    pub center_y: String,
    /// Fractal-space size of one pixel, decimal string.
    pub pixel_size: String,
    pub width: u32,
    pub height: u32,
    /// Escape-time map exponent; 2 is the classic quadratic map.
    pub exponent: u32,
    pub iteration_cap: u64,
    /// 0 means "pick from available parallelism".
    pub worker_count: usize,
    /// Board edge length in pixels.
    pub board_size: u32,
}

impl SessionConfig {
    pub fn new(center_x: &str, center_y: &str, pixel_size: &str, width: u32, height: u32) -> Self {
        Self {
            center_x: center_x.to_string(),
            center_y: center_y.to_string(),
            pixel_size: pixel_size.to_string(),
            width,
            height,
            exponent: 2,
            iteration_cap: 10_000,
            worker_count: 0,
            board_size: 64,
        }
    }

    /// Validate every field. Construction of engines and boards assumes
    /// this has passed.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("empty image: {}x{}", self.width, self.height));
        }
        if self.exponent < 2 {
            return Err(format!("exponent must be >= 2, got {}", self.exponent));
        }
        if self.iteration_cap == 0 {
            return Err("iteration_cap must be positive".to_string());
        }
        if self.board_size == 0 {
            return Err("board_size must be positive".to_string());
        }
        let bits = self.precision_bits()?;
        BigReal::from_decimal(&self.center_x, bits)?;
        BigReal::from_decimal(&self.center_y, bits)?;
        let ps = BigReal::from_decimal(&self.pixel_size, bits)?;
        if ps <= BigReal::zero(bits) {
            return Err(format!("pixel_size must be positive, got {}", self.pixel_size));
        }
        // Per-pixel deltas are f64; a pixel size whose f64 image is zero
        // would collapse every delta to the reference point and render a
        // constant frame.
        if ps.to_f64() == 0.0 {
            return Err(format!(
                "pixel_size {} is below the f64 delta range",
                self.pixel_size
            ));
        }
        Ok(())
    }

    /// Required mantissa bits for this session's reference orbit.
    pub fn precision_bits(&self) -> Result<usize, String> {
        precision_bits_for(&self.pixel_size, self.iteration_cap)
    }

    /// Center as a high-precision complex at session precision.
    pub fn center(&self) -> Result<BigComplex, String> {
        let bits = self.precision_bits()?;
        Ok(BigComplex::new(
            BigReal::from_decimal(&self.center_x, bits)?,
            BigReal::from_decimal(&self.center_y, bits)?,
        ))
    }

    /// Pixel size as a high-precision real at session precision.
    pub fn pixel_size_value(&self) -> Result<BigReal, String> {
        let bits = self.precision_bits()?;
        BigReal::from_decimal(&self.pixel_size, bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SessionConfig {
        SessionConfig::new("-0.5", "0.0", "0.01", 64, 64)
    }

    #[test]
    fn default_shape_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_empty_image() {
        let mut c = valid();
        c.width = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_linear_exponent() {
        let mut c = valid();
        c.exponent = 1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_pixel_size() {
        let mut c = valid();
        c.pixel_size = "-0.01".to_string();
        assert!(c.validate().is_err());
        c.pixel_size = "0".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn deep_zoom_config_validates() {
        let mut c = valid();
        c.center_x = "-0.74364388703715870475".to_string();
        c.center_y = "0.13182590420531251939".to_string();
        c.pixel_size = "1e-30".to_string();
        assert!(c.validate().is_ok());
        assert!(c.precision_bits().unwrap() >= 128);
    }

    #[test]
    fn rejects_pixel_size_below_f64_range() {
        let mut c = valid();
        c.pixel_size = "1e-400".to_string();
        let err = c.validate().unwrap_err();
        assert!(err.contains("delta range"), "unexpected message: {}", err);
    }

    #[test]
    fn serde_roundtrip() {
        let c = valid();
        let json = serde_json::to_string(&c).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.center_x, c.center_x);
        assert_eq!(back.iteration_cap, c.iteration_cap);
    }
}
