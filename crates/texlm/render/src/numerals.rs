//! Numeral audit and numeric-core reader
//!
//! The styling step is free to add wrappers, captions and spacing but
//! must not touch a number. [`audit_numerals`] checks that every numeral
//! of the numeric core survives, in order, in the styled markup.

use crate::error::{RenderError, RenderResult};

/// Numerals in order of appearance.
///
/// A numeral is `[+-]?digits[.digits][e[+-]digits]`; a sign only counts
/// when it directly precedes the digits.
pub fn extract_numerals(markup: &str) -> Vec<String> {
    let bytes = markup.as_bytes();
    let mut numerals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let signed = matches!(bytes[i], b'+' | b'-')
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        // Digits glued to a preceding letter are part of a name (`h2`, `x10`).
        let glued = i > 0 && (bytes[i - 1].is_ascii_alphabetic() || bytes[i - 1] == b'.');
        if glued && !signed && bytes[i].is_ascii_digit() {
            i = skip_digits(bytes, i);
            continue;
        }
        if !(signed || bytes[i].is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = i;
        if signed {
            i += 1;
        }
        i = skip_digits(bytes, i);
        if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
            i = skip_digits(bytes, i + 1);
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let digit_at = if matches!(bytes.get(i + 1), Some(b'+' | b'-')) {
                i + 2
            } else {
                i + 1
            };
            if bytes.get(digit_at).is_some_and(u8::is_ascii_digit) {
                i = skip_digits(bytes, digit_at);
            }
        }

        numerals.push(markup[start..i].trim_start_matches('+').to_string());
    }

    numerals
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// Check that the numerals of `core` form a subsequence of those in `styled`.
pub fn audit_numerals(core: &str, styled: &str) -> RenderResult<()> {
    let styled_numerals = extract_numerals(styled);
    let mut remaining = styled_numerals.iter();

    for (position, numeral) in extract_numerals(core).into_iter().enumerate() {
        if !remaining.any(|candidate| *candidate == numeral) {
            return Err(RenderError::NumeralNotPreserved {
                numeral,
                position: position + 1,
            });
        }
    }
    Ok(())
}

/// Read a numeric core back into rows of floats.
///
/// Accepts any `\begin{env}` / `\end{env}` wrapper; rows are separated by
/// `\\` and cells by `&`.
pub fn parse_numeric_core(markup: &str) -> RenderResult<Vec<Vec<f64>>> {
    let body = strip_environment(markup);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (index, line) in body.split("\\\\").enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split('&')
            .map(|cell| parse_cell(cell.trim()))
            .collect::<RenderResult<Vec<f64>>>()
            .map_err(|err| match err {
                RenderError::NumericCore(msg) => {
                    RenderError::NumericCore(format!("row {}: {}", index + 1, msg))
                }
                other => other,
            })?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(RenderError::NumericCore(format!(
                    "row {} has {} cells, expected {}",
                    index + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(RenderError::NumericCore("no rows found".into()));
    }
    Ok(rows)
}

fn strip_environment(markup: &str) -> &str {
    let mut body = markup;
    if let Some(start) = body.find("\\begin{") {
        if let Some(close) = body[start..].find('}') {
            body = &body[start + close + 1..];
        }
    }
    if let Some(end) = body.find("\\end{") {
        body = &body[..end];
    }
    body
}

fn parse_cell(cell: &str) -> RenderResult<f64> {
    match cell {
        "\\infty" | "+\\infty" => Ok(f64::INFINITY),
        "-\\infty" => Ok(f64::NEG_INFINITY),
        "\\mathrm{NaN}" => Ok(f64::NAN),
        _ => cell
            .parse::<f64>()
            .map_err(|_| RenderError::NumericCore(format!("'{}' is not a number", cell))),
    }
}
