// Parsing and formatting helpers.
//
// Cell text from the tabular reader is messy (thousands separators, blank
// cells, stray text). These helpers turn it into typed values so the engine
// only ever sees numbers.
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64`, forgiving common spreadsheet-export noise.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","`.
/// - Accepts scientific notation (`1.5e3`).
/// - Returns `None` for blanks, text, and non-finite values.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a year cell. Spreadsheet exports often write years as `2012.0`.
pub fn parse_year(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let v = s.parse::<f64>().ok()?;
    if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale thousands separators (`1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // Avoid "-0.00" for values that round to zero.
    let rounds_to_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !rounds_to_zero {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Residuals are tiny; fixed decimals would print them as zero.
pub fn format_residual(n: f64) -> String {
    format!("{:.3e}", n)
}
