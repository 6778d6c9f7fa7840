//! JavaScript `Number.prototype.toString()` formatting.
//!
//! Rust's `{:e}` already yields the shortest digit string that round-trips,
//! which is the digit string ECMAScript picks; only the layout differs.

/// Format `value` exactly as JS `String(value)` does.
///
/// ```
/// use mask_wasm::js_number_to_string;
///
/// assert_eq!(js_number_to_string(42.0), "42");
/// assert_eq!(js_number_to_string(1e21), "1e+21");
/// assert_eq!(js_number_to_string(f64::NAN), "NaN");
/// ```
pub fn js_number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        // covers -0
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", js_number_to_string(-value));
    }
    if value.is_infinite() {
        return "Infinity".to_string();
    }

    let formatted = format!("{value:e}");
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let shown = (n - 1).abs();
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{shown}")
        } else {
            format!("{first}.{rest}e{sign}{shown}")
        }
    }
}
