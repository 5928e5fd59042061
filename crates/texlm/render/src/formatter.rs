//! Numeric formatter: matrix value to a `bmatrix` fragment
//!
//! Each cell is printed in its natural decimal form when that form has
//! at most `significant_figures` digits, and in scientific notation
//! rounded to exactly that many significant figures otherwise. The
//! budget does not depend on matrix width.

use serde::{Deserialize, Serialize};
use texlm_matrix::{MatrixValue, Scalar};

pub const DEFAULT_SIGNIFICANT_FIGURES: usize = 5;

pub const BEGIN_GRID: &str = "\\begin{bmatrix}";
pub const END_GRID: &str = "\\end{bmatrix}";
pub const COLUMN_SEPARATOR: &str = " & ";
pub const ROW_SEPARATOR: &str = " \\\\\n";

fn default_significant_figures() -> usize {
    DEFAULT_SIGNIFICANT_FIGURES
}

/// Per-process formatting policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericFormatter {
    #[serde(default = "default_significant_figures")]
    pub significant_figures: usize,
}

impl Default for NumericFormatter {
    fn default() -> Self {
        Self {
            significant_figures: DEFAULT_SIGNIFICANT_FIGURES,
        }
    }
}

impl NumericFormatter {
    /// A budget of zero is raised to one.
    pub fn new(significant_figures: usize) -> Self {
        Self {
            significant_figures: significant_figures.max(1),
        }
    }

    fn budget(&self) -> usize {
        self.significant_figures.max(1)
    }

    /// Render a whole matrix as the numeric core.
    ///
    /// ```
    /// use texlm_matrix::{MatrixValue, Scalar};
    /// use texlm_render::NumericFormatter;
    ///
    /// let m = MatrixValue::from_rows(vec![
    ///     vec![Scalar::Int(1), Scalar::Int(3)],
    ///     vec![Scalar::Int(2), Scalar::Int(4)],
    /// ])
    /// .unwrap();
    /// assert_eq!(
    ///     NumericFormatter::default().format_matrix(&m),
    ///     "\\begin{bmatrix}\n1 & 3 \\\\\n2 & 4\n\\end{bmatrix}"
    /// );
    /// ```
    pub fn format_matrix(&self, matrix: &MatrixValue) -> String {
        let rows: Vec<String> = matrix
            .row_slices()
            .map(|row| {
                row.iter()
                    .map(|cell| self.format_scalar(*cell))
                    .collect::<Vec<_>>()
                    .join(COLUMN_SEPARATOR)
            })
            .collect();

        format!("{}\n{}\n{}", BEGIN_GRID, rows.join(ROW_SEPARATOR), END_GRID)
    }

    pub fn format_scalar(&self, cell: Scalar) -> String {
        match cell {
            Scalar::Int(v) => {
                let natural = v.to_string();
                if digit_count(&natural) <= self.budget() {
                    natural
                } else {
                    scientific(v as f64, self.budget())
                }
            }
            Scalar::Float(v) => self.format_float(v),
        }
    }

    pub fn format_float(&self, v: f64) -> String {
        if v.is_nan() {
            return "\\mathrm{NaN}".into();
        }
        if v.is_infinite() {
            return if v > 0.0 { "\\infty" } else { "-\\infty" }.into();
        }
        if v == 0.0 {
            return "0".into();
        }

        let natural = v.to_string();
        if digit_count(&natural) <= self.budget() {
            natural
        } else {
            scientific(v, self.budget())
        }
    }
}

fn digit_count(text: &str) -> usize {
    text.bytes().filter(u8::is_ascii_digit).count()
}

/// `d.dddde±XX` with exactly `figures` significant digits
fn scientific(v: f64, figures: usize) -> String {
    let raw = format!("{:.*e}", figures - 1, v);
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    match exponent.parse::<i32>() {
        Ok(exp) => format!(
            "{}e{}{:02}",
            mantissa,
            if exp < 0 { '-' } else { '+' },
            exp.unsigned_abs()
        ),
        Err(_) => raw,
    }
}
