//! Lenient numeric parsing and presentation rounding.
//!
//! Every number the engine reads (reference cells, user edits) goes through
//! [`safe_number`], which never fails: anything unusable becomes `0.0`.

use serde::Serializer;

use crate::model::CellValue;

/// Parse a number the way a spreadsheet user would type it:
/// - Strip `$`, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Accept exponents (`1e3`)
/// - Returns None for anything else, and for NaN / infinity
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    // Only plain decimal notation; rejects "inf", "nan" and friends.
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    if is_negative && cleaned.starts_with(['-', '+']) {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if is_negative { -value } else { value })
}

/// Numeric value of a cell, `0.0` when missing or unparseable.
pub fn safe_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Empty => 0.0,
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::Number(_) => 0.0,
        CellValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        CellValue::Text(s) => parse_number(s).unwrap_or(0.0),
    }
}

/// Round to cents for display. Accumulation never goes through this.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid printing "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `serialize_with` helper: emit a cost rounded to 2 decimal places.
pub fn serialize_round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}
