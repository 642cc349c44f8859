//! Arbitrary-precision real and complex numbers for reference orbit iteration.
//!
//! Wraps `dashu-float`'s `FBig` behind an explicit-precision type. Values at
//! 64 bits or below ride on plain f64; the switch is invisible to callers.

use dashu_base::{Abs, Approximation};
use dashu_float::{DBig, FBig};
use serde::{Deserialize, Serialize};

/// Arbitrary-precision real with explicit mantissa precision.
///
/// Precision must always be specified at construction; there is no default.
#[derive(Clone, Debug)]
pub struct BigReal {
    repr: Repr,
    precision_bits: usize,
}

#[derive(Clone, Debug)]
enum Repr {
    Double(f64),
    Big(FBig),
}

impl BigReal {
    /// Construct from f64 at the given precision.
    pub fn with_precision(val: f64, precision_bits: usize) -> Self {
        let repr = if precision_bits <= 64 {
            Repr::Double(val)
        } else {
            Repr::Big(f64_to_fbig(val, precision_bits))
        };
        Self {
            repr,
            precision_bits,
        }
    }

    pub fn zero(precision_bits: usize) -> Self {
        Self::with_precision(0.0, precision_bits)
    }

    /// Parse a decimal string at the given precision.
    ///
    /// Accepts values beyond f64 range (e.g. "4e-1200"). The decimal is
    /// converted to binary with the target precision in one step so no
    /// intermediate rounding occurs.
    pub fn from_decimal(val: &str, precision_bits: usize) -> Result<Self, String> {
        if precision_bits <= 64 {
            return val
                .parse::<f64>()
                .map(|f| Self::with_precision(f, precision_bits))
                .map_err(|e| format!("invalid decimal {:?}: {}", val, e));
        }
        let dbig = val
            .parse::<DBig>()
            .map_err(|e| format!("invalid decimal {:?}: {}", val, e))?;
        let binary = match dbig.with_base_and_precision::<2>(precision_bits) {
            Approximation::Exact(v) => v,
            Approximation::Inexact(v, _) => v,
        };
        Ok(Self {
            repr: Repr::Big(binary.with_rounding::<dashu_float::round::mode::Zero>()),
            precision_bits,
        })
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Lossy conversion for low-precision mirrors and diagnostics.
    pub fn to_f64(&self) -> f64 {
        match &self.repr {
            Repr::Double(v) => *v,
            Repr::Big(v) => v.to_f64().value(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a * b, |a, b| a * b)
    }

    pub fn abs(&self) -> Self {
        let repr = match &self.repr {
            Repr::Double(v) => Repr::Double(v.abs()),
            Repr::Big(v) => Repr::Big(v.clone().abs()),
        };
        Self {
            repr,
            precision_bits: self.precision_bits,
        }
    }

    fn binop(
        &self,
        other: &Self,
        f_double: impl Fn(f64, f64) -> f64,
        f_big: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let precision_bits = self.precision_bits.max(other.precision_bits);
        let repr = match (&self.repr, &other.repr) {
            (Repr::Double(a), Repr::Double(b)) if precision_bits <= 64 => {
                Repr::Double(f_double(*a, *b))
            }
            _ => Repr::Big(f_big(
                &self.as_fbig(precision_bits),
                &other.as_fbig(precision_bits),
            )),
        };
        Self {
            repr,
            precision_bits,
        }
    }

    fn as_fbig(&self, precision_bits: usize) -> FBig {
        match &self.repr {
            Repr::Double(v) => f64_to_fbig(*v, precision_bits),
            Repr::Big(v) => v.clone(),
        }
    }
}

fn f64_to_fbig(val: f64, precision_bits: usize) -> FBig {
    if val == 0.0 {
        // FBig::try_from(0.0) yields a zero-precision value; size it explicitly.
        FBig::ZERO.with_precision(precision_bits).value()
    } else {
        FBig::try_from(val)
            .expect("finite f64 converts to FBig")
            .with_precision(precision_bits)
            .value()
    }
}

impl PartialEq for BigReal {
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Double(a), Repr::Double(b)) => a == b,
            _ => self.as_fbig(self.precision_bits) == other.as_fbig(other.precision_bits),
        }
    }
}

impl PartialOrd for BigReal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.repr, &other.repr) {
            (Repr::Double(a), Repr::Double(b)) => a.partial_cmp(b),
            _ => self
                .as_fbig(self.precision_bits)
                .partial_cmp(&other.as_fbig(other.precision_bits)),
        }
    }
}

impl std::fmt::Display for BigReal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repr {
            Repr::Double(v) => write!(f, "{}", v),
            Repr::Big(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BigRealWire {
    value: String,
    precision_bits: usize,
}

impl Serialize for BigReal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BigRealWire {
            value: self.to_string(),
            precision_bits: self.precision_bits,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigReal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = BigRealWire::deserialize(deserializer)?;
        if wire.precision_bits <= 64 {
            let v = wire
                .value
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("bad f64: {}", e)))?;
            Ok(Self::with_precision(v, wire.precision_bits))
        } else {
            let v = wire
                .value
                .parse::<FBig>()
                .map_err(|e| serde::de::Error::custom(format!("bad FBig: {}", e)))?;
            Ok(Self {
                repr: Repr::Big(v),
                precision_bits: wire.precision_bits,
            })
        }
    }
}

/// Arbitrary-precision complex number built from two [`BigReal`]s.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BigComplex {
    pub re: BigReal,
    pub im: BigReal,
}

impl BigComplex {
    pub fn new(re: BigReal, im: BigReal) -> Self {
        Self { re, im }
    }

    pub fn zero(precision_bits: usize) -> Self {
        Self {
            re: BigReal::zero(precision_bits),
            im: BigReal::zero(precision_bits),
        }
    }

    pub fn precision_bits(&self) -> usize {
        self.re.precision_bits().max(self.im.precision_bits())
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re.add(&other.re),
            im: self.im.add(&other.im),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self {
            re: self.re.mul(&other.re).sub(&self.im.mul(&other.im)),
            im: self.re.mul(&other.im).add(&self.im.mul(&other.re)),
        }
    }

    pub fn square(&self) -> Self {
        let re = self.re.mul(&self.re).sub(&self.im.mul(&self.im));
        let two = BigReal::with_precision(2.0, self.precision_bits());
        let im = two.mul(&self.re).mul(&self.im);
        Self { re, im }
    }

    /// z^p by repeated squaring-free multiplication; exponents are tiny.
    pub fn powi(&self, p: u32) -> Self {
        debug_assert!(p >= 1);
        let mut acc = self.clone();
        for _ in 1..p {
            acc = acc.mul(self);
        }
        acc
    }

    /// |z|² collapsed to f64; orbit values are escape-bounded so this is safe.
    pub fn norm_sq_f64(&self) -> f64 {
        self.re.mul(&self.re).add(&self.im.mul(&self.im)).to_f64()
    }

    pub fn to_f64_pair(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }
}
