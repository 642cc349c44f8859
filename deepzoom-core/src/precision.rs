//! Precision selection for reference orbit computation.
//!
//! Determines how many mantissa bits the high-precision iteration needs to
//! distinguish adjacent pixels at the session's zoom depth and to survive
//! error amplification across the iteration cap.

/// Safety margin for rounding error accumulated by arithmetic operations.
const SAFETY_BITS: u64 = 64;

const LOG2_10: f64 = 3.321928094887362;

/// Approximate log2 of a decimal string, without ever materializing the
/// value as f64 (decimal exponents far beyond f64 range must not collapse
/// here; range enforcement is the session's job).
pub fn decimal_log2(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let (mantissa_str, exp) = match s.find(['e', 'E']) {
        Some(i) => {
            let exp = s[i + 1..]
                .parse::<i64>()
                .map_err(|e| format!("bad exponent in {:?}: {}", s, e))?;
            (&s[..i], exp)
        }
        None => (s, 0),
    };
    let (norm, shift) = normalize_mantissa(mantissa_str)?;
    Ok(libm::log2(norm) + (exp + shift) as f64 * LOG2_10)
}

/// Reduce a plain decimal mantissa to (m, e) with m in [1, 10) and
/// mantissa = m * 10^e. Survives strings like "0.0000004".
fn normalize_mantissa(m: &str) -> Result<(f64, i64), String> {
    let unsigned = m.strip_prefix('-').or_else(|| m.strip_prefix('+')).unwrap_or(m);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(format!("empty mantissa in {:?}", m));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!("bad mantissa {:?}", m));
    }

    let digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
    let first = match digits.iter().position(|&b| b != b'0') {
        Some(i) => i,
        None => return Err(format!("zero mantissa {:?}", m)),
    };
    // Exponent of the leading significant digit relative to the decimal point.
    let lead_exp = int_part.len() as i64 - 1 - first as i64;

    let mut value = 0.0f64;
    for &b in digits.iter().skip(first).take(17) {
        value = value * 10.0 + f64::from(b - b'0');
    }
    let taken = digits.len().saturating_sub(first).min(17) as i64;
    Ok((value / libm::pow(10.0, (taken - 1) as f64), lead_exp))
}

/// Mantissa bits for the reference orbit at the given pixel size and
/// iteration cap. Rounded up to a power of two, minimum 64.
pub fn precision_bits_for(pixel_size: &str, iteration_cap: u64) -> Result<usize, String> {
    let log2_pixel = decimal_log2(pixel_size)?;
    // Escape-time orbits live in |z| <= 2; resolving one pixel there takes
    // log2(2 / pixel_size) bits.
    let ratio_bits = (1.0 - log2_pixel).ceil().max(0.0) as u64;
    let iter_bits = if iteration_cap > 1 {
        (iteration_cap as f64).log2().ceil() as u64
    } else {
        0
    };
    let total = ratio_bits + iter_bits + SAFETY_BITS;
    Ok((total as usize).next_power_of_two().max(64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_log2_of_simple_values() {
        assert!((decimal_log2("8").unwrap() - 3.0).abs() < 1e-9);
        assert!((decimal_log2("0.25").unwrap() + 2.0).abs() < 1e-9);
        assert!((decimal_log2("1e10").unwrap() - 10.0 * LOG2_10).abs() < 1e-6);
    }

    #[test]
    fn decimal_log2_survives_extreme_exponents() {
        let l = decimal_log2("4e-1200").unwrap();
        assert!((l - (2.0 - 1200.0 * LOG2_10)).abs() < 1e-6);
    }

    #[test]
    fn decimal_log2_handles_leading_zeros_without_exponent() {
        let l = decimal_log2("0.0000004").unwrap();
        assert!((l - decimal_log2("4e-7").unwrap()).abs() < 1e-9);
    }

    #[test]
    fn decimal_log2_rejects_zero_and_garbage() {
        assert!(decimal_log2("0").is_err());
        assert!(decimal_log2("0.000").is_err());
        assert!(decimal_log2("abc").is_err());
    }

    #[test]
    fn shallow_zoom_needs_minimal_precision() {
        let bits = precision_bits_for("0.01", 1000).unwrap();
        assert!(bits >= 64);
        assert!(bits <= 128);
    }

    #[test]
    fn precision_grows_with_zoom_depth() {
        let shallow = precision_bits_for("1e-10", 10_000).unwrap();
        let deep = precision_bits_for("1e-300", 10_000).unwrap();
        assert!(deep > shallow);
        // ~300 decimal digits is ~1000 bits plus margins.
        assert!(deep >= 1024);
    }

    #[test]
    fn precision_is_power_of_two() {
        let bits = precision_bits_for("1e-50", 100_000).unwrap();
        assert!(bits.is_power_of_two());
    }
}
