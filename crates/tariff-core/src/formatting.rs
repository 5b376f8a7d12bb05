/// Replace `NaN` and `±∞` with `0.0`; finite values pass through.
///
/// Every figure that reaches a display or rounding step goes through here.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Fixed-point rendering that never prints `NaN` or `inf`.
///
/// ```
/// use tariff_core::formatting::to_fixed_safe;
///
/// assert_eq!(to_fixed_safe(8.0, 2), "8.00");
/// assert_eq!(to_fixed_safe(f64::NAN, 2), "0.00");
/// assert_eq!(to_fixed_safe(1234.6, 0), "1235");
/// ```
pub fn to_fixed_safe(value: f64, decimals: usize) -> String {
    format!("{:.prec$}", finite_or_zero(value), prec = decimals)
}

/// [`to_fixed_safe`] with a trailing `%`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{}%", to_fixed_safe(value, decimals))
}

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use tariff_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let value = finite_or_zero(value);
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact decimal midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let int_str = integer_part.to_string();
    let grouped = group_thousands(&int_str);

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` is "0.xx"; keep ".xx".
        let decimal_digits = &frac_str[1..];
        format!("{}{}", grouped, decimal_digits)
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a US dollar amount with thousands separators and no cents, the
/// way trade values are reported.
///
/// ```
/// use tariff_core::formatting::format_usd;
///
/// assert_eq!(format_usd(1234567.4), "$1,234,567");
/// assert_eq!(format_usd(0.0), "$0");
/// assert_eq!(format_usd(-950.0), "$-950");
/// ```
pub fn format_usd(amount: f64) -> String {
    let amount = finite_or_zero(amount);
    if amount < 0.0 {
        format!("$-{}", format_number(amount.abs(), 0))
    } else {
        format!("${}", format_number(amount, 0))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
