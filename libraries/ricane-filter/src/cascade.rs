//! Cascaded biquad recursion with carried state
//!
//! Every section runs the Direct Form II Transposed recursion:
//!
//! ```text
//! y  = b0*x + s0
//! s0 = b1*x + s1 - a1*y
//! s1 = b2*x      - a2*y
//! ```
//!
//! The two delay registers per section are the only memory of the filter, so
//! carrying them from one buffer to the next makes chunked filtering
//! bit-identical to filtering the whole signal at once.

use crate::error::{FilterError, Result};
use crate::response::{FrequencyResponse, FrequencySpacing};
use crate::sos::SosTable;
use tracing::warn;

/// Filter memory: two delay registers per section (the `zi` of the cascade)
#[derive(Debug, Clone, PartialEq)]
pub struct SosState {
    registers: Vec<[f64; 2]>,
}

impl SosState {
    /// All-zero state for `sections` sections
    pub fn zeros(sections: usize) -> Self {
        Self {
            registers: vec![[0.0; 2]; sections],
        }
    }

    /// State from explicit per-section registers
    pub fn from_registers(registers: Vec<[f64; 2]>) -> Self {
        Self { registers }
    }

    /// Per-section registers in cascade order
    pub fn registers(&self) -> &[[f64; 2]] {
        &self.registers
    }

    /// Number of sections this state covers
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// True when the state covers no sections
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Registers flattened to `2 * sections` values
    pub fn to_vec(&self) -> Vec<f64> {
        self.registers.iter().flatten().copied().collect()
    }
}

/// Steady-state registers for a constant unit input
///
/// Each section settles to `zi = scale * [g - b0, b2 - a2*g]` where `g` is its
/// DC gain and `scale` is the DC gain of everything upstream of it.
///
/// # Errors
/// Returns `InvalidCoefficients` if any section's denominator sums to zero.
pub fn compute_steady_state(table: &SosTable) -> Result<SosState> {
    let mut registers = Vec::with_capacity(table.len());
    let mut scale = 1.0;

    for (index, section) in table.sections().iter().enumerate() {
        let den = section.dc_denominator();
        if den == 0.0 {
            warn!("Section {} has a singular DC denominator", index);
            return Err(FilterError::InvalidCoefficients(format!(
                "section {} has a0 + a1 + a2 == 0, steady state is undefined",
                index
            )));
        }

        let [b0, b1, b2] = section.numerator();
        let [_, _, a2] = section.denominator();
        let gain = (b0 + b1 + b2) / den;

        registers.push([scale * (gain - b0), scale * (b2 - a2 * gain)]);
        scale *= gain;
    }

    Ok(SosState { registers })
}

/// Run `samples` through the cascade in place, advancing `state`
///
/// # Errors
/// Returns `InvalidCoefficients` if `state` does not cover exactly the
/// sections of `table`; neither `state` nor `samples` is touched then.
pub fn filter_in_place(
    table: &SosTable,
    state: &mut SosState,
    samples: &mut [f64],
) -> Result<()> {
    check_coverage(table, state)?;
    run_sections(table, state, samples);
    Ok(())
}

/// Run `input` through the cascade, returning a new buffer of the same length
///
/// # Errors
/// Same as [`filter_in_place`].
pub fn filter(table: &SosTable, state: &mut SosState, input: &[f64]) -> Result<Vec<f64>> {
    let mut output = input.to_vec();
    filter_in_place(table, state, &mut output)?;
    Ok(output)
}

fn check_coverage(table: &SosTable, state: &SosState) -> Result<()> {
    if table.len() != state.len() {
        return Err(FilterError::InvalidCoefficients(format!(
            "state covers {} sections but the table has {}",
            state.len(),
            table.len()
        )));
    }
    Ok(())
}

/// Section-major recursion; callers guarantee `state` covers `table`
fn run_sections(table: &SosTable, state: &mut SosState, samples: &mut [f64]) {
    for (section, zi) in table.sections().iter().zip(state.registers.iter_mut()) {
        let [b0, b1, b2] = section.numerator();
        let [_, a1, a2] = section.denominator();
        let [mut s0, mut s1] = *zi;

        for x in samples.iter_mut() {
            let input = *x;
            let y = b0 * input + s0;
            s0 = b1 * input + s1 - a1 * y;
            s1 = b2 * input - a2 * y;
            *x = y;
        }

        *zi = [s0, s1];
    }
}

/// A coefficient table paired with the state it is currently running with
#[derive(Debug, Clone, PartialEq)]
pub struct SosCascade {
    table: SosTable,
    state: SosState,
}

impl SosCascade {
    /// Pair a table with an explicit state
    ///
    /// # Errors
    /// Returns `InvalidCoefficients` if the state does not cover every section.
    pub fn new(table: SosTable, state: SosState) -> Result<Self> {
        check_coverage(&table, &state)?;
        Ok(Self { table, state })
    }

    /// Cascade starting from the steady state of a unit step
    pub fn with_steady_state(table: SosTable) -> Result<Self> {
        let state = compute_steady_state(&table)?;
        Ok(Self { table, state })
    }

    /// Cascade starting from silence
    pub fn zeroed(table: SosTable) -> Self {
        let state = SosState::zeros(table.len());
        Self { table, state }
    }

    /// Filter one sample
    pub fn process_sample(&mut self, sample: f64) -> f64 {
        let mut buffer = [sample];
        run_sections(&self.table, &mut self.state, &mut buffer);
        buffer[0]
    }

    /// Filter a buffer, returning the output
    pub fn process(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = input.to_vec();
        run_sections(&self.table, &mut self.state, &mut output);
        output
    }

    /// Filter a buffer in place
    pub fn process_in_place(&mut self, samples: &mut [f64]) {
        run_sections(&self.table, &mut self.state, samples);
    }

    /// Frequency response of the table; does not touch state
    pub fn frequency_response(&self, n_points: usize, spacing: FrequencySpacing) -> FrequencyResponse {
        FrequencyResponse::compute(&self.table, n_points, spacing)
    }

    /// Coefficient table
    pub fn table(&self) -> &SosTable {
        &self.table
    }

    /// Current filter memory
    pub fn state(&self) -> &SosState {
        &self.state
    }

    /// Give back the table, dropping the state
    pub fn into_table(self) -> SosTable {
        self.table
    }
}
