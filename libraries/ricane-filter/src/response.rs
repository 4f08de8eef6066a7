//! Frequency response of a coefficient table
//!
//! Purely diagnostic: evaluating the response never touches filter state.

use crate::sos::SosTable;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How evaluation points are distributed over `[0, π]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencySpacing {
    /// `w_k = π * k / n` for `k = 0..n` (DC included, Nyquist excluded)
    #[default]
    Linear,
    /// Geometric progression from `π / n` up to and including `π`
    Logarithmic,
}

impl FrequencySpacing {
    /// Angular frequencies (radians/sample) for `n_points` evaluation points
    pub fn grid(self, n_points: usize) -> Vec<f64> {
        match (self, n_points) {
            (_, 0) => Vec::new(),
            (Self::Linear, n) => (0..n).map(|k| PI * k as f64 / n as f64).collect(),
            (Self::Logarithmic, 1) => vec![PI],
            (Self::Logarithmic, n) => {
                let start = PI / n as f64;
                let ratio = n as f64;
                (0..n)
                    .map(|k| start * ratio.powf(k as f64 / (n - 1) as f64))
                    .collect()
            }
        }
    }
}

/// Complex gain of a cascade sampled at a set of angular frequencies
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponse {
    frequencies: Vec<f64>,
    gains: Vec<Complex64>,
}

impl FrequencyResponse {
    /// Evaluate `table` at `n_points` frequencies distributed per `spacing`
    pub fn compute(table: &SosTable, n_points: usize, spacing: FrequencySpacing) -> Self {
        let frequencies = spacing.grid(n_points);
        let gains = frequencies.iter().map(|&w| table.response_at(w)).collect();
        Self { frequencies, gains }
    }

    /// Angular frequencies in radians/sample, ascending, within `[0, π]`
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Complex gains, one per frequency
    pub fn gains(&self) -> &[Complex64] {
        &self.gains
    }

    /// Number of evaluation points
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True when no points were requested
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequencies converted to Hz for a given sample rate
    pub fn frequencies_hz(&self, sample_rate: u32) -> Vec<f64> {
        let scale = f64::from(sample_rate) * 0.5 / PI;
        self.frequencies.iter().map(|w| w * scale).collect()
    }

    /// Linear magnitude `|H|`
    pub fn magnitude(&self) -> Vec<f64> {
        self.gains.iter().map(|g| g.norm()).collect()
    }

    /// Magnitude in dB, floored at -300 dB for exact zeros
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.gains
            .iter()
            .map(|g| 20.0 * g.norm().max(1e-15).log10())
            .collect()
    }

    /// Phase in radians, wrapped to `(-π, π]`
    pub fn phase(&self) -> Vec<f64> {
        self.gains.iter().map(|g| g.arg()).collect()
    }

    /// Split into `(frequencies, gains)`
    pub fn into_parts(self) -> (Vec<f64>, Vec<Complex64>) {
        (self.frequencies, self.gains)
    }
}
