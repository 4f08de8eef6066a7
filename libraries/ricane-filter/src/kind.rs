//! Filter kinds and their parameter validation

use crate::error::{FilterError, Result};
use crate::{BANDPASS_DEFAULT_ORDER, HIGHPASS_DEFAULT_CUT, HIGHPASS_DEFAULT_ORDER, MAX_FILTER_ORDER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which filter a session runs
///
/// Cutoffs are in Hz and must lie strictly between 0 and Nyquist
/// (`sample_rate / 2`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    /// Passes `low_cut..high_cut`
    Bandpass {
        /// Lower -3 dB edge in Hz
        low_cut: f64,
        /// Upper -3 dB edge in Hz
        high_cut: f64,
        /// Prototype order (the table has `order` sections)
        order: u32,
    },
    /// Passes everything above `cut`
    Highpass {
        /// -3 dB cutoff in Hz
        cut: f64,
        /// Prototype order (the table has `ceil(order / 2)` sections)
        order: u32,
    },
    /// No filter selected yet
    #[default]
    Unconfigured,
}

impl FilterKind {
    /// Bandpass with explicit order
    pub fn bandpass(low_cut: f64, high_cut: f64, order: u32) -> Self {
        Self::Bandpass {
            low_cut,
            high_cut,
            order,
        }
    }

    /// Bandpass with the default order
    pub fn bandpass_default(low_cut: f64, high_cut: f64) -> Self {
        Self::bandpass(low_cut, high_cut, BANDPASS_DEFAULT_ORDER)
    }

    /// Highpass with explicit order
    pub fn highpass(cut: f64, order: u32) -> Self {
        Self::Highpass { cut, order }
    }

    /// Highpass at the default cutoff and order (1 kHz, order 4)
    pub fn highpass_default() -> Self {
        Self::highpass(HIGHPASS_DEFAULT_CUT, HIGHPASS_DEFAULT_ORDER)
    }

    /// Filter order, `None` when unconfigured
    pub fn order(&self) -> Option<u32> {
        match *self {
            Self::Bandpass { order, .. } | Self::Highpass { order, .. } => Some(order),
            Self::Unconfigured => None,
        }
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bandpass { .. } => "bandpass",
            Self::Highpass { .. } => "highpass",
            Self::Unconfigured => "unconfigured",
        }
    }

    /// True for every kind except `Unconfigured`
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Unconfigured)
    }

    /// Check order and cutoffs against the Nyquist frequency of `sample_rate`
    ///
    /// # Errors
    /// Returns `InvalidParameters` for a zero sample rate, an order outside
    /// `1..=MAX_FILTER_ORDER`, a cutoff outside `(0, nyquist)`, a bandpass whose
    /// `low_cut >= high_cut`, or an unconfigured kind.
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(FilterError::InvalidParameters(
                "sample rate must be positive".to_string(),
            ));
        }
        let nyquist = f64::from(sample_rate) / 2.0;

        match *self {
            Self::Bandpass {
                low_cut,
                high_cut,
                order,
            } => {
                check_order(order)?;
                check_cutoff("low_cut", low_cut, nyquist)?;
                check_cutoff("high_cut", high_cut, nyquist)?;
                if low_cut >= high_cut {
                    return Err(FilterError::InvalidParameters(format!(
                        "low_cut {} Hz must be below high_cut {} Hz",
                        low_cut, high_cut
                    )));
                }
                Ok(())
            }
            Self::Highpass { cut, order } => {
                check_order(order)?;
                check_cutoff("cut", cut, nyquist)
            }
            Self::Unconfigured => Err(FilterError::InvalidParameters(
                "no filter kind selected".to_string(),
            )),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bandpass {
                low_cut,
                high_cut,
                order,
            } => write!(f, "bandpass {}-{} Hz, order {}", low_cut, high_cut, order),
            Self::Highpass { cut, order } => write!(f, "highpass {} Hz, order {}", cut, order),
            Self::Unconfigured => write!(f, "unconfigured"),
        }
    }
}

fn check_order(order: u32) -> Result<()> {
    if order == 0 || order > MAX_FILTER_ORDER {
        return Err(FilterError::InvalidParameters(format!(
            "order {} outside 1..={}",
            order, MAX_FILTER_ORDER
        )));
    }
    Ok(())
}

fn check_cutoff(name: &str, value: f64, nyquist: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 || value >= nyquist {
        return Err(FilterError::InvalidParameters(format!(
            "{} {} Hz outside (0, {}) Hz",
            name, value, nyquist
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_kinds_pass() {
        assert!(FilterKind::bandpass(300.0, 3000.0, 4).validate(44100).is_ok());
        assert!(FilterKind::highpass(1000.0, 4).validate(44100).is_ok());
        assert!(FilterKind::bandpass_default(20.0, 20000.0)
            .validate(48000)
            .is_ok());
    }

    #[test]
    fn cutoff_at_or_above_nyquist_rejected() {
        assert!(FilterKind::bandpass(300.0, 22050.0, 4).validate(44100).is_err());
        assert!(FilterKind::bandpass(300.0, 30000.0, 4).validate(44100).is_err());
        assert!(FilterKind::highpass(22050.0, 2).validate(44100).is_err());
    }

    #[test]
    fn inverted_band_rejected() {
        let err = FilterKind::bandpass(3000.0, 300.0, 4)
            .validate(44100)
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameters(_)));
        assert!(FilterKind::bandpass(1000.0, 1000.0, 4).validate(44100).is_err());
    }

    #[test]
    fn order_bounds() {
        assert!(FilterKind::highpass(1000.0, 0).validate(44100).is_err());
        assert!(FilterKind::highpass(1000.0, MAX_FILTER_ORDER)
            .validate(44100)
            .is_ok());
        assert!(FilterKind::highpass(1000.0, MAX_FILTER_ORDER + 1)
            .validate(44100)
            .is_err());
    }

    #[test]
    fn non_positive_and_nan_cutoffs_rejected() {
        assert!(FilterKind::highpass(0.0, 2).validate(44100).is_err());
        assert!(FilterKind::highpass(-10.0, 2).validate(44100).is_err());
        assert!(FilterKind::highpass(f64::NAN, 2).validate(44100).is_err());
    }

    #[test]
    fn unconfigured_and_zero_rate_rejected() {
        assert!(FilterKind::Unconfigured.validate(44100).is_err());
        assert!(FilterKind::highpass(1000.0, 2).validate(0).is_err());
    }

    #[test]
    fn accessors() {
        let kind = FilterKind::bandpass_default(300.0, 3000.0);
        assert_eq!(kind.order(), Some(BANDPASS_DEFAULT_ORDER));
        assert_eq!(kind.name(), "bandpass");
        assert!(kind.is_configured());
        assert_eq!(FilterKind::default(), FilterKind::Unconfigured);
        assert_eq!(FilterKind::Unconfigured.order(), None);
        assert_eq!(FilterKind::highpass_default(), FilterKind::highpass(1000.0, 4));
        assert_eq!(
            FilterKind::highpass(1000.0, 4).to_string(),
            "highpass 1000 Hz, order 4"
        );
    }
}
