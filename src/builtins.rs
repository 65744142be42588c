//! Math kernels shared by the evaluator's dispatch table.

use std::f64::consts::PI;

/// Rounds half away from zero before the integer-domain operators.
pub fn double_to_int(input: f64) -> i64 {
    if input >= 0.0 {
        (input + 0.5) as i64
    } else {
        (input - 0.5) as i64
    }
}

/// Any non-zero value counts as true.
pub fn truthy(value: f64) -> bool {
    value != 0.0
}

pub fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Greatest common divisor by the Euclidean algorithm on rounded integers.
pub fn gcd(a: f64, b: f64) -> f64 {
    let mut a = double_to_int(a);
    let mut b = double_to_int(b);
    while b != 0 {
        let swap = b;
        b = a.wrapping_rem(b);
        a = swap;
    }
    a as f64
}

/// Inverse cotangent on the (0, pi) branch, with acot(0) = pi/2.
pub fn acot(x: f64) -> f64 {
    if x > 0.0 {
        (1.0 / x).atan()
    } else if x < 0.0 {
        (1.0 / x).atan() + PI
    } else {
        PI / 2.0
    }
}

/// sin(x)/x with the removable singularity filled in: sinc(0) = 1.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Normalized sinc, sin(pi x)/(pi x), with nsinc(0) = 1.
pub fn nsinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
