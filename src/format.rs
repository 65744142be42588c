//! Result display: fixed-point with a steady overall width, or scientific.

/// Decimal places that keep the printed result near a constant number of
/// significant digits: 15 for magnitudes below ten, one fewer for every
/// additional power of ten, bottoming out at zero.
pub fn find_num_decimals(value: f64) -> usize {
    let mut decimals = 15;
    let mut magnitude = value.abs();
    while magnitude >= 10.0 && decimals > 0 {
        magnitude /= 10.0;
        decimals -= 1;
    }
    decimals
}

pub fn format_result(value: f64, scientific: bool) -> String {
    if scientific {
        format_scientific(value)
    } else {
        format!("{:.*}", find_num_decimals(value), value)
    }
}

/// 15 fractional digits and a signed two-digit exponent. The standard
/// `{:E}` prints exponents as `E4`, so the tail is rebuilt.
fn format_scientific(value: f64) -> String {
    let formatted = format!("{:.15E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}E{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}
