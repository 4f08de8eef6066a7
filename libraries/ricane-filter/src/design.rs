//! Coefficient design
//!
//! Sessions do not know how coefficient tables are produced; they ask a
//! [`SosDesigner`]. [`Butterworth`] is the stock designer: analog Butterworth
//! prototype, frequency pre-warping, lowpass-to-highpass or
//! lowpass-to-bandpass transform, bilinear transform, then pairing of poles
//! and zeros into second-order sections.
//!
//! Analog frequencies are kept in units of `2 * fs`, so the bilinear
//! transform is `z = (1 + s) / (1 - s)` and root magnitudes stay near the
//! unit circle at every order. The overall gain is not tracked through the
//! transforms; it is set at the end from the passband reference point.

use crate::error::{FilterError, Result};
use crate::kind::FilterKind;
use crate::sos::{Section, SosTable};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// Roots with an imaginary part below this are treated as real
const IMAG_TOLERANCE: f64 = 1e-10;

/// Produces a coefficient table for a filter kind at a sample rate
pub trait SosDesigner {
    /// Design the table for `kind` at `sample_rate`
    ///
    /// # Errors
    /// `InvalidParameters` for kinds the designer cannot realize,
    /// `InvalidCoefficients` if the resulting table is degenerate.
    fn design(&self, kind: &FilterKind, sample_rate: u32) -> Result<SosTable>;
}

/// Maximally flat (Butterworth) IIR design
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Butterworth;

impl SosDesigner for Butterworth {
    fn design(&self, kind: &FilterKind, sample_rate: u32) -> Result<SosTable> {
        kind.validate(sample_rate)?;
        let fs = f64::from(sample_rate);

        // Unity gain at the band centre for bandpass, at Nyquist for highpass
        let (analog, reference) = match *kind {
            FilterKind::Bandpass {
                low_cut,
                high_cut,
                order,
            } => {
                let (wl, wh) = (prewarp(low_cut, fs), prewarp(high_cut, fs));
                let center = 2.0 * (wl * wh).sqrt().atan();
                (prototype(order).into_bandpass(wl, wh), center)
            }
            FilterKind::Highpass { cut, order } => {
                (prototype(order).into_highpass(prewarp(cut, fs)), PI)
            }
            FilterKind::Unconfigured => {
                return Err(FilterError::InvalidParameters(
                    "no filter kind selected".to_string(),
                ))
            }
        };

        let table = analog.bilinear().into_sos(reference)?;
        debug!("Designed {} as {} sections", kind, table.len());
        Ok(table)
    }
}

/// Zeros and poles of a transfer function
#[derive(Debug, Clone)]
struct Roots {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
}

/// Analog frequency (in units of `2 * fs`) that the bilinear transform maps onto `freq_hz`
fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    (PI * freq_hz / sample_rate).tan()
}

/// Unit-cutoff analog Butterworth lowpass: poles on the left half of the unit circle
fn prototype(order: u32) -> Roots {
    let n = order as usize;
    let poles = (0..n)
        .map(|k| {
            let theta = PI * (2 * k + n + 1) as f64 / (2 * n) as f64;
            Complex64::from_polar(1.0, theta)
        })
        .collect();

    Roots {
        zeros: Vec::new(),
        poles,
    }
}

impl Roots {
    fn degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }

    /// `s -> wc / s`
    fn into_highpass(self, wc: f64) -> Roots {
        let degree = self.degree();
        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| wc / z).collect();
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

        Roots {
            zeros,
            poles: self.poles.iter().map(|&p| wc / p).collect(),
        }
    }

    /// `s -> (s^2 + w0^2) / (s * bw)` with `w0 = sqrt(wl * wh)`, `bw = wh - wl`
    fn into_bandpass(self, wl: f64, wh: f64) -> Roots {
        let bw = wh - wl;
        let w0_sq = Complex64::new(wl * wh, 0.0);
        let degree = self.degree();

        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<Complex64> = roots.iter().map(|&r| r * bw / 2.0).collect();
            let mut out: Vec<Complex64> = scaled
                .iter()
                .map(|&r| r + (r * r - w0_sq).sqrt())
                .collect();
            out.extend(scaled.iter().map(|&r| r - (r * r - w0_sq).sqrt()));
            out
        };

        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

        Roots {
            zeros,
            poles: split(&self.poles),
        }
    }

    /// Map the s-plane onto the z-plane; zeros at infinity land on z = -1
    fn bilinear(self) -> Roots {
        let degree = self.degree();
        let one = Complex64::new(1.0, 0.0);

        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| (one + z) / (one - z)).collect();
        zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

        Roots {
            zeros,
            poles: self.poles.iter().map(|&p| (one + p) / (one - p)).collect(),
        }
    }

    /// Group roots into sections, then scale the first section so the
    /// cascade has unit gain at `reference` (radians/sample)
    fn into_sos(self, reference: f64) -> Result<SosTable> {
        let (pole_quads, pole_single) = root_polynomials(&self.poles)?;
        let (zero_quads, zero_single) = root_polynomials(&self.zeros)?;

        if pole_quads.len() != zero_quads.len() || pole_single.is_some() != zero_single.is_some() {
            return Err(FilterError::InvalidCoefficients(format!(
                "cannot pair {} zeros with {} poles",
                self.zeros.len(),
                self.poles.len()
            )));
        }

        let mut sections = Vec::with_capacity(pole_quads.len() + 1);
        for (b, a) in zero_quads.into_iter().zip(pole_quads) {
            sections.push(Section::new(b, a)?);
        }
        if let (Some(b), Some(a)) = (zero_single, pole_single) {
            sections.push(Section::new(b, a)?);
        }

        // Summed in the log domain so long cascades cannot overflow
        let log_magnitude: f64 = sections
            .iter()
            .map(|s| s.response_at(reference).norm().ln())
            .sum();
        let gain = (-log_magnitude).exp();

        if let Some(first) = sections.first_mut() {
            let [b0, b1, b2] = first.numerator();
            *first = Section::new(
                [b0 * gain, b1 * gain, b2 * gain],
                first.denominator(),
            )?;
        }

        SosTable::new(sections)
    }
}

/// Turn roots into monic polynomials in `z^-1`
///
/// Conjugate pairs become one quadratic each, ordered by distance from the
/// origin. Real roots are paired outermost-first (largest with smallest), and
/// an odd one out becomes the returned first-order polynomial.
fn root_polynomials(roots: &[Complex64]) -> Result<(Vec<[f64; 3]>, Option<[f64; 3]>)> {
    let mut upper: Vec<Complex64> = roots.iter().filter(|r| r.im > IMAG_TOLERANCE).copied().collect();
    let lower = roots.iter().filter(|r| r.im < -IMAG_TOLERANCE).count();
    if upper.len() != lower {
        return Err(FilterError::InvalidCoefficients(
            "complex roots without conjugates".to_string(),
        ));
    }

    let mut real: Vec<f64> = roots
        .iter()
        .filter(|r| r.im.abs() <= IMAG_TOLERANCE)
        .map(|r| r.re)
        .collect();

    upper.sort_by(|a, b| a.norm().total_cmp(&b.norm()));
    real.sort_by(f64::total_cmp);

    let mut quads: Vec<[f64; 3]> = upper
        .iter()
        .map(|r| [1.0, -2.0 * r.re, r.norm_sqr()])
        .collect();

    let (mut lo, mut hi) = (0, real.len());
    while hi - lo >= 2 {
        let (r1, r2) = (real[lo], real[hi - 1]);
        quads.push([1.0, -(r1 + r2), r1 * r2]);
        lo += 1;
        hi -= 1;
    }
    let single = if hi > lo {
        Some([1.0, -real[lo], 0.0])
    } else {
        None
    };

    Ok((quads, single))
}
