//! Integration tests: BigReal arithmetic under escape-time iteration.

use deepzoom_core::{BigComplex, BigReal};

fn big(v: f64, bits: usize) -> BigReal {
    BigReal::with_precision(v, bits)
}

#[test]
fn quadratic_iteration_matches_f64_at_shallow_depth() {
    // z -> z^2 + c in BigComplex must track plain f64 for a few dozen
    // iterations at 128 bits.
    let c = BigComplex::new(big(-0.5, 128), big(0.1, 128));
    let mut z = BigComplex::zero(128);
    let (mut fx, mut fy) = (0.0f64, 0.0f64);

    for _ in 0..50 {
        z = z.square().add(&c);
        let (nx, ny) = (fx * fx - fy * fy - 0.5, 2.0 * fx * fy + 0.1);
        fx = nx;
        fy = ny;
        let (zx, zy) = z.to_f64_pair();
        assert!((zx - fx).abs() < 1e-9);
        assert!((zy - fy).abs() < 1e-9);
    }
}

#[test]
fn period_two_orbit_at_c_minus_one() {
    // c = -1: orbit is 0, -1, 0, -1, ...
    let c = BigComplex::new(big(-1.0, 128), big(0.0, 128));
    let mut z = BigComplex::zero(128);
    let mut values = Vec::new();
    for _ in 0..6 {
        z = z.square().add(&c);
        values.push(z.to_f64_pair());
    }
    assert!((values[0].0 + 1.0).abs() < 1e-14);
    assert!(values[1].0.abs() < 1e-14);
    assert!((values[2].0 + 1.0).abs() < 1e-14);
    assert!(values[3].0.abs() < 1e-14);
}

#[test]
fn cubic_map_iteration_is_bounded_at_origin() {
    // z -> z^3 + 0 stays at the origin.
    let c = BigComplex::zero(256);
    let mut z = BigComplex::zero(256);
    for _ in 0..10 {
        z = z.powi(3).add(&c);
    }
    assert_eq!(z.to_f64_pair(), (0.0, 0.0));
}

#[test]
fn high_precision_survives_values_below_f64_range() {
    let tiny = BigReal::from_decimal("1e-400", 2048).unwrap();
    let sum = tiny.add(&tiny);
    // Still exactly representable and ordered, even though f64 sees zero.
    assert!(sum > tiny);
    assert_eq!(sum.to_f64(), 0.0);
}
