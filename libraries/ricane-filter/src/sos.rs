//! Second-order section coefficient tables
//!
//! A [`SosTable`] is the coefficient side of a cascade: an ordered, non-empty
//! list of biquad [`Section`]s whose transfer functions multiply together.
//! Tables are immutable once built; changing the filter means building a new
//! table.

use crate::error::{FilterError, Result};
use num_complex::Complex64;

/// A single biquad stage
///
/// Transfer function:
/// `H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)`
///
/// `a0` is normalized to 1 on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    b: [f64; 3],
    a: [f64; 3],
}

impl Section {
    /// Create a section from numerator `[b0, b1, b2]` and denominator `[a0, a1, a2]`
    ///
    /// All six coefficients are divided by `a0`.
    ///
    /// # Errors
    /// Returns `InvalidCoefficients` if `a0` is zero or any coefficient is not finite.
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Result<Self> {
        if let Some(bad) = b.iter().chain(a.iter()).find(|c| !c.is_finite()) {
            return Err(FilterError::InvalidCoefficients(format!(
                "non-finite coefficient {}",
                bad
            )));
        }
        if a[0] == 0.0 {
            return Err(FilterError::InvalidCoefficients(
                "leading denominator coefficient a0 is zero".to_string(),
            ));
        }

        let a0 = a[0];
        Ok(Self {
            b: b.map(|c| c / a0),
            a: a.map(|c| c / a0),
        })
    }

    /// Create a section from one `[b0, b1, b2, a0, a1, a2]` row
    pub fn from_row(row: [f64; 6]) -> Result<Self> {
        Self::new([row[0], row[1], row[2]], [row[3], row[4], row[5]])
    }

    /// The section as a `[b0, b1, b2, a0, a1, a2]` row
    pub fn to_row(&self) -> [f64; 6] {
        [self.b[0], self.b[1], self.b[2], self.a[0], self.a[1], self.a[2]]
    }

    /// Numerator coefficients `[b0, b1, b2]`
    pub fn numerator(&self) -> [f64; 3] {
        self.b
    }

    /// Denominator coefficients `[a0, a1, a2]` (`a0 == 1`)
    pub fn denominator(&self) -> [f64; 3] {
        self.a
    }

    /// Sum of the denominator coefficients, i.e. the denominator evaluated at z = 1
    pub fn dc_denominator(&self) -> f64 {
        self.a[0] + self.a[1] + self.a[2]
    }

    /// Gain at zero frequency
    ///
    /// Infinite or NaN when the denominator is singular at DC.
    pub fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / self.dc_denominator()
    }

    /// Complex gain at angular frequency `omega` (radians/sample)
    pub fn response_at(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }

    /// Check if both poles lie strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        // Stability triangle for 1 + a1*z^-1 + a2*z^-2
        self.a[2].abs() < 1.0 && self.a[1].abs() < 1.0 + self.a[2]
    }
}

/// Ordered cascade of second-order sections
///
/// The output of section `i` feeds section `i + 1`. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SosTable {
    sections: Vec<Section>,
}

impl SosTable {
    /// Build a table from already constructed sections
    ///
    /// # Errors
    /// Returns `InvalidCoefficients` if `sections` is empty.
    pub fn new(sections: Vec<Section>) -> Result<Self> {
        if sections.is_empty() {
            return Err(FilterError::InvalidCoefficients(
                "coefficient table has no sections".to_string(),
            ));
        }
        Ok(Self { sections })
    }

    /// Build a table from `[b0, b1, b2, a0, a1, a2]` rows
    pub fn from_rows(rows: &[[f64; 6]]) -> Result<Self> {
        let sections = rows
            .iter()
            .map(|row| Section::from_row(*row))
            .collect::<Result<Vec<_>>>()?;
        Self::new(sections)
    }

    /// The table as `[b0, b1, b2, a0, a1, a2]` rows
    pub fn to_rows(&self) -> Vec<[f64; 6]> {
        self.sections.iter().map(Section::to_row).collect()
    }

    /// Sections in cascade order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false; a table holds at least one section
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Product of every section's DC gain
    pub fn dc_gain(&self) -> f64 {
        self.sections.iter().map(Section::dc_gain).product()
    }

    /// Combined complex gain at angular frequency `omega` (radians/sample)
    pub fn response_at(&self, omega: f64) -> Complex64 {
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, section| {
                acc * section.response_at(omega)
            })
    }

    /// Check if every section is stable
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Section::is_stable)
    }
}
