//! Streaming IIR filtering for Ricane
//!
//! This crate provides:
//! - Second-order-section (SOS) coefficient tables and the cascaded biquad
//!   recursion that runs them
//! - Steady-state filter memory, so a stream starts without a transient
//! - A streaming session that carries filter memory across buffers, making
//!   chunked filtering identical to one-pass filtering
//! - Butterworth bandpass/highpass coefficient design
//! - Frequency and impulse response analysis
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐     ┌─────────────┐     ┌──────────┐
//! │ FilterKind │ ──► │ SosDesigner │ ──► │ SosTable │
//! └────────────┘     └─────────────┘     └──────────┘
//!                                             │
//!                                             ▼
//! ┌──────────────┐     ┌───────────────────────────┐     ┌─────────────────┐
//! │ Audio buffer │ ──► │ FilterSession             │ ──► │ Filtered buffer │
//! └──────────────┘     │  (SosCascade + SosState)  │     └─────────────────┘
//!                      └───────────────────────────┘
//!                                   │
//!                                   ▼
//!                  FrequencyResponse / impulse response
//! ```
//!
//! # Example
//!
//! ```
//! use ricane_filter::{FilterKind, FilterSession};
//!
//! let mut session = FilterSession::new();
//! session.configure(FilterKind::highpass(1000.0, 4), 44100)?;
//!
//! // Feed the stream buffer by buffer; filter memory carries over
//! for _ in 0..4 {
//!     let filtered = session.filter_buffer(&[0.25; 1024])?;
//!     assert_eq!(filtered.len(), 1024);
//! }
//!
//! let response = session.frequency_response(2000)?;
//! let magnitude = response.magnitude();
//! assert!(magnitude[0] < 1e-9); // DC is rejected
//! # Ok::<(), ricane_filter::FilterError>(())
//! ```

#![deny(unsafe_code)]

pub mod cascade;
mod channels;
pub mod design;
mod error;
mod kind;
mod response;
mod session;
mod settings;
pub mod sos;

pub use cascade::{compute_steady_state, filter, filter_in_place, SosCascade, SosState};
pub use channels::ChannelBank;
pub use design::{Butterworth, SosDesigner};
pub use error::{FilterError, Result};
pub use kind::FilterKind;
pub use num_complex::Complex64;
pub use response::{FrequencyResponse, FrequencySpacing};
pub use session::{FilterSession, SessionState, StateInit};
pub use settings::FilterSettings;
pub use sos::{Section, SosTable};

/// Sample rates accepted by [`FilterSettings`]
pub const VALID_SAMPLE_RATES: [u32; 4] = [44100, 48000, 88200, 96000];

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default frames per buffer
pub const FRAMES_PER_BUFFER: usize = 1024;

/// Default bandpass order
pub const BANDPASS_DEFAULT_ORDER: u32 = 5;

/// Default highpass cutoff in Hz
pub const HIGHPASS_DEFAULT_CUT: f64 = 1000.0;

/// Default highpass order
pub const HIGHPASS_DEFAULT_ORDER: u32 = 4;

/// Highest accepted filter order
pub const MAX_FILTER_ORDER: u32 = 32;

/// Default number of frequency response points
pub const DEFAULT_RESPONSE_POINTS: usize = 2000;

/// Default impulse probe length in samples
pub const DEFAULT_IMPULSE_LENGTH: usize = 1024;
