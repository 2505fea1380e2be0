//! Display formatting for balances and counts.
//!
//! Three renderings are supported:
//!
//! - raw: `400.0`, `12.75`
//! - grouped: thousands separators, at most two fractional digits,
//!   trailing zeros trimmed (`1,234.5`)
//! - abbreviated: `1.5K`, `2.3M`, `4.0B`, falling back to grouped below 1,000

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;
const BILLION: f64 = 1_000_000_000.0;

/// Render a balance with a magnitude suffix.
#[must_use]
pub fn format_abbreviated(value: f64) -> String {
    if value >= BILLION {
        format!("{:.1}B", value / BILLION)
    } else if value >= MILLION {
        format!("{:.1}M", value / MILLION)
    } else if value >= THOUSAND {
        format!("{:.1}K", value / THOUSAND)
    } else {
        format_grouped(value)
    }
}

/// Render a balance with comma thousands separators and up to two
/// fractional digits.
#[must_use]
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // Values that round to zero lose their sign.
    if value.is_sign_negative() && (int_part != "0" || !frac.is_empty()) {
        out.push('-');
    }
    let len = int_part.len();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Render a balance in its raw decimal form.
///
/// Integral values keep one fractional digit so a balance never reads like
/// a count.
#[must_use]
pub fn format_raw(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
