//! Filter settings
//!
//! Defaults mirror the stock configuration: 44.1 kHz, 1024-frame buffers,
//! order-5 bandpass, 2000-point frequency response, 1024-sample impulse probe.

use crate::error::{FilterError, Result};
use crate::kind::FilterKind;
use crate::response::FrequencySpacing;
use crate::session::StateInit;
use crate::{
    BANDPASS_DEFAULT_ORDER, DEFAULT_IMPULSE_LENGTH, DEFAULT_RESPONSE_POINTS, DEFAULT_SAMPLE_RATE,
    FRAMES_PER_BUFFER, VALID_SAMPLE_RATES,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Settings for building and analysing a filter session
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterSettings {
    /// Sample rate in Hz, one of `VALID_SAMPLE_RATES`
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames per buffer handed to the session
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Order used by [`FilterSettings::bandpass`]
    #[serde(default = "default_bandpass_order")]
    pub bandpass_order: u32,

    /// Number of frequency response points
    #[serde(default = "default_response_points")]
    pub response_points: usize,

    /// Frequency grid for the response
    #[serde(default)]
    pub response_spacing: FrequencySpacing,

    /// Impulse probe length in samples
    #[serde(default = "default_impulse_length")]
    pub impulse_length: usize,

    /// How filter memory starts on the first buffer
    #[serde(default)]
    pub state_init: StateInit,

    /// Filter to configure immediately, if any
    #[serde(default)]
    pub filter: Option<FilterKind>,
}

impl FilterSettings {
    /// Load settings from a file (format picked from the extension, e.g. `.toml`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?;

        let parsed: Self = settings.try_deserialize()?;
        parsed.validate()?;
        debug!("Loaded filter settings from {:?}", path);
        Ok(parsed)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if !VALID_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(FilterError::Config(format!(
                "sample rate {} Hz is not one of {:?}",
                self.sample_rate, VALID_SAMPLE_RATES
            )));
        }
        if self.buffer_size == 0 || self.response_points == 0 || self.impulse_length == 0 {
            return Err(FilterError::Config(
                "buffer_size, response_points and impulse_length must be positive".to_string(),
            ));
        }
        if self.bandpass_order == 0 {
            return Err(FilterError::Config(
                "bandpass_order must be positive".to_string(),
            ));
        }
        if let Some(kind) = &self.filter {
            kind.validate(self.sample_rate)
                .map_err(|e| FilterError::Config(e.to_string()))?;
        }
        Ok(())
    }

    /// Bandpass using the configured default order
    pub fn bandpass(&self, low_cut: f64, high_cut: f64) -> FilterKind {
        FilterKind::bandpass(low_cut, high_cut, self.bandpass_order)
    }
}

// Default values
fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_buffer_size() -> usize {
    FRAMES_PER_BUFFER
}

fn default_bandpass_order() -> u32 {
    BANDPASS_DEFAULT_ORDER
}

fn default_response_points() -> usize {
    DEFAULT_RESPONSE_POINTS
}

fn default_impulse_length() -> usize {
    DEFAULT_IMPULSE_LENGTH
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            bandpass_order: default_bandpass_order(),
            response_points: default_response_points(),
            response_spacing: FrequencySpacing::default(),
            impulse_length: default_impulse_length(),
            state_init: StateInit::default(),
            filter: None,
        }
    }
}
