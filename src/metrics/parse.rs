// Counter coercion — turns whatever a spreadsheet cell holds into a u64.
//
// Operators type numbers by hand, so cells contain things like "1,234",
// "12.5K", "3M" or stray text. Blank cells are 0. Anything that can't be
// read as a non-negative integer is also 0, but comes back as a warning so
// the caller can log it.

use thiserror::Error;
use tracing::warn;

/// Why a raw counter value was coerced to 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("negative value {raw:?}")]
    Negative { raw: String },

    #[error("not a number: {raw:?}")]
    NotNumeric { raw: String },

    #[error("value {raw:?} overflows a 64-bit counter")]
    Overflow { raw: String },
}

/// Parse a raw counter string.
///
/// Accepts thousands separators (`,` `_` space and non-breaking space),
/// a leading `+`, decimals (truncated) and `K`/`M`/`B` suffixes.
pub fn parse_count(raw: &str) -> Result<u64, ParseWarning> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
        .collect();

    if cleaned.starts_with('-') {
        return Err(ParseWarning::Negative {
            raw: raw.to_string(),
        });
    }
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    let (number, multiplier) = match cleaned.chars().last() {
        Some('k' | 'K') => (&cleaned[..cleaned.len() - 1], 1_000),
        Some('m' | 'M') => (&cleaned[..cleaned.len() - 1], 1_000_000),
        Some('b' | 'B') => (&cleaned[..cleaned.len() - 1], 1_000_000_000),
        _ => (cleaned, 1),
    };

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(ParseWarning::NotNumeric {
            raw: raw.to_string(),
        });
    }

    scale(int_part, frac_part, multiplier).ok_or_else(|| ParseWarning::Overflow {
        raw: raw.to_string(),
    })
}

/// Parse a counter, logging and zeroing anything unreadable.
///
/// `field` and `context` only feed the log line.
pub fn coerce_count(raw: &str, field: &str, context: &str) -> u64 {
    match parse_count(raw) {
        Ok(value) => value,
        Err(warning) => {
            warn!(field, context, warning = %warning, "Unreadable counter, using 0");
            0
        }
    }
}

/// Integer-only decimal scaling so "1.2K" is exactly 1200.
/// Fraction digits beyond the multiplier's precision are dropped.
fn scale(int_part: &str, frac_part: &str, multiplier: u64) -> Option<u64> {
    let int_value: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut total = int_value.checked_mul(multiplier)?;

    let mut place = multiplier;
    for digit in frac_part.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        total = total.checked_add(u64::from(digit - b'0') * place)?;
    }
    Some(total)
}
