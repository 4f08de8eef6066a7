//! Streaming filter session
//!
//! A [`FilterSession`] owns one cascade and walks it through three stages:
//!
//! ```text
//!            configure()                 filter_buffer()
//!   Empty ───────────────► Configured ───────────────────► Streaming
//!     ▲                     ▲    ▲          (state built)      │
//!     │                     │    └──────── reset() ────────────┤
//!     │                     └───────────── configure() ────────┘
//! ```
//!
//! State is materialized lazily on the first buffer, as the steady-state
//! response to a unit step (no start-up transient) or as silence. Any
//! reconfiguration throws the state away; continuity is only guaranteed
//! between two reconfigurations.
//!
//! # Example
//!
//! ```
//! use ricane_filter::{FilterKind, FilterSession};
//!
//! let mut session = FilterSession::new();
//! session.configure(FilterKind::bandpass(300.0, 3000.0, 4), 44100)?;
//!
//! let first = session.filter_buffer(&[1.0; 512])?;
//! let second = session.filter_buffer(&[1.0; 512])?;
//! assert_eq!(first.len() + second.len(), 1024);
//! # Ok::<(), ricane_filter::FilterError>(())
//! ```

use crate::cascade::{SosCascade, SosState};
use crate::design::{Butterworth, SosDesigner};
use crate::error::{FilterError, Result};
use crate::kind::FilterKind;
use crate::response::{FrequencyResponse, FrequencySpacing};
use crate::settings::FilterSettings;
use crate::sos::SosTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// How filter memory is initialized on the first buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateInit {
    /// Registers settled on a constant unit input
    #[default]
    SteadyState,
    /// All registers zero
    Zero,
}

impl StateInit {
    fn build(self, table: SosTable) -> Result<SosCascade> {
        match self {
            Self::SteadyState => SosCascade::with_steady_state(table),
            Self::Zero => Ok(SosCascade::zeroed(table)),
        }
    }
}

/// Observable stage of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No coefficients
    Empty,
    /// Coefficients set, filter memory not yet built
    Configured,
    /// Filter memory built and carried between buffers
    Streaming,
}

/// What the current table was built from
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterSetup {
    kind: FilterKind,
    sample_rate: u32,
}

#[derive(Debug, Clone)]
enum Stage {
    Empty,
    Configured { setup: FilterSetup, table: SosTable },
    Streaming { setup: FilterSetup, cascade: SosCascade },
}

/// Cached frequency response, keyed by its request
#[derive(Debug, Clone)]
struct CachedResponse {
    n_points: usize,
    spacing: FrequencySpacing,
    response: FrequencyResponse,
}

/// One filter, one stream of buffers
///
/// Mutating calls take `&mut self`, so a session can only be fed by one
/// producer at a time. Use one session per channel for multichannel audio.
#[derive(Debug, Clone)]
pub struct FilterSession<D: SosDesigner = Butterworth> {
    designer: D,
    state_init: StateInit,
    stage: Stage,
    response_cache: Option<CachedResponse>,
}

impl FilterSession<Butterworth> {
    /// Create an empty session using Butterworth designs and steady-state init
    pub fn new() -> Self {
        Self::with_designer(Butterworth)
    }

    /// Create a session from settings, configuring it if a filter is given
    pub fn from_settings(settings: &FilterSettings) -> Result<Self> {
        settings.validate()?;
        let mut session = Self::new().with_state_init(settings.state_init);
        if let Some(kind) = settings.filter {
            session.configure(kind, settings.sample_rate)?;
        }
        Ok(session)
    }
}

impl Default for FilterSession<Butterworth> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SosDesigner> FilterSession<D> {
    /// Create an empty session with a custom coefficient designer
    pub fn with_designer(designer: D) -> Self {
        Self {
            designer,
            state_init: StateInit::default(),
            stage: Stage::Empty,
            response_cache: None,
        }
    }

    /// Choose how filter memory is initialized on the next materialization
    #[must_use]
    pub fn with_state_init(mut self, state_init: StateInit) -> Self {
        self.state_init = state_init;
        self
    }

    /// Select a filter, designing its coefficients with the session's designer
    ///
    /// Any existing filter memory and cached analysis are discarded.
    ///
    /// # Errors
    /// `InvalidParameters` if the kind does not fit `sample_rate`; the session
    /// is left exactly as it was.
    pub fn configure(&mut self, kind: FilterKind, sample_rate: u32) -> Result<()> {
        if let Err(err) = kind.validate(sample_rate) {
            warn!("Rejected {} at {} Hz: {}", kind, sample_rate, err);
            return Err(err);
        }
        let table = self.designer.design(&kind, sample_rate)?;
        self.install(kind, sample_rate, table);
        Ok(())
    }

    /// Select a filter whose coefficients were designed elsewhere
    ///
    /// `kind` is still validated against `sample_rate`; the table itself is
    /// taken as given.
    pub fn configure_with_table(
        &mut self,
        kind: FilterKind,
        sample_rate: u32,
        table: SosTable,
    ) -> Result<()> {
        if let Err(err) = kind.validate(sample_rate) {
            warn!("Rejected {} at {} Hz: {}", kind, sample_rate, err);
            return Err(err);
        }
        self.install(kind, sample_rate, table);
        Ok(())
    }

    fn install(&mut self, kind: FilterKind, sample_rate: u32, table: SosTable) {
        debug!(
            "Configured {} at {} Hz ({} sections)",
            kind,
            sample_rate,
            table.len()
        );
        self.stage = Stage::Configured {
            setup: FilterSetup { kind, sample_rate },
            table,
        };
        self.response_cache = None;
    }

    /// Build filter memory now instead of on the first buffer
    ///
    /// No-op when already streaming.
    ///
    /// # Errors
    /// `NotConfigured` when empty; `InvalidCoefficients` if the steady state is
    /// undefined, in which case the session stays `Configured`.
    pub fn prepare(&mut self) -> Result<()> {
        let next = match &self.stage {
            Stage::Empty => return Err(FilterError::NotConfigured),
            Stage::Streaming { .. } => return Ok(()),
            Stage::Configured { setup, table } => Stage::Streaming {
                setup: *setup,
                cascade: self.state_init.build(table.clone())?,
            },
        };

        debug!("Materialized filter state ({:?})", self.state_init);
        self.stage = next;
        Ok(())
    }

    /// Filter one buffer, carrying filter memory over from the previous one
    ///
    /// The output has the same length as `samples`.
    pub fn filter_buffer(&mut self, samples: &[f64]) -> Result<Vec<f64>> {
        let mut output = samples.to_vec();
        self.filter_in_place(&mut output)?;
        Ok(output)
    }

    /// Filter one buffer in place
    pub fn filter_in_place(&mut self, samples: &mut [f64]) -> Result<()> {
        self.prepare()?;
        match &mut self.stage {
            Stage::Streaming { cascade, .. } => {
                trace!("Filtering {} samples", samples.len());
                cascade.process_in_place(samples);
                Ok(())
            }
            Stage::Empty | Stage::Configured { .. } => Err(FilterError::NotConfigured),
        }
    }

    /// Frequency response on a linear grid of `n_points` over `[0, π)`
    pub fn frequency_response(&mut self, n_points: usize) -> Result<FrequencyResponse> {
        self.frequency_response_with(n_points, FrequencySpacing::Linear)
    }

    /// Frequency response with a chosen grid
    ///
    /// Reads only the coefficient table; filter memory is never touched.
    /// Results are cached until the next reconfiguration.
    pub fn frequency_response_with(
        &mut self,
        n_points: usize,
        spacing: FrequencySpacing,
    ) -> Result<FrequencyResponse> {
        if let Some(cached) = &self.response_cache {
            if cached.n_points == n_points && cached.spacing == spacing {
                return Ok(cached.response.clone());
            }
        }

        let response = FrequencyResponse::compute(self.table()?, n_points, spacing);
        self.response_cache = Some(CachedResponse {
            n_points,
            spacing,
            response: response.clone(),
        });
        Ok(response)
    }

    /// Output for a unit impulse of `length` samples
    ///
    /// The probe goes through [`filter_buffer`](Self::filter_buffer), so it
    /// advances this session's filter memory. Probe a separate session (see
    /// [`analysis_session`](Self::analysis_session)) to keep a live stream intact.
    pub fn impulse_response(&mut self, length: usize) -> Result<Vec<f64>> {
        let mut probe = vec![0.0; length];
        if let Some(first) = probe.first_mut() {
            *first = 1.0;
        }
        self.filter_buffer(&probe)
    }

    /// Drop filter memory so the next buffer starts a fresh stream
    pub fn reset(&mut self) {
        if let Stage::Streaming { setup, cascade } = &self.stage {
            debug!("Reset filter state for {}", setup.kind);
            self.stage = Stage::Configured {
                setup: *setup,
                table: cascade.table().clone(),
            };
        }
    }

    /// Current stage
    pub fn state(&self) -> SessionState {
        match self.stage {
            Stage::Empty => SessionState::Empty,
            Stage::Configured { .. } => SessionState::Configured,
            Stage::Streaming { .. } => SessionState::Streaming,
        }
    }

    /// Active filter kind, `Unconfigured` when empty
    pub fn kind(&self) -> FilterKind {
        self.setup().map_or(FilterKind::Unconfigured, |s| s.kind)
    }

    /// Sample rate of the active filter
    pub fn sample_rate(&self) -> Option<u32> {
        self.setup().map(|s| s.sample_rate)
    }

    /// Active coefficient table
    pub fn table(&self) -> Result<&SosTable> {
        match &self.stage {
            Stage::Empty => Err(FilterError::NotConfigured),
            Stage::Configured { table, .. } => Ok(table),
            Stage::Streaming { cascade, .. } => Ok(cascade.table()),
        }
    }

    /// Filter memory, present only while streaming
    pub fn zi(&self) -> Option<&SosState> {
        match &self.stage {
            Stage::Streaming { cascade, .. } => Some(cascade.state()),
            Stage::Empty | Stage::Configured { .. } => None,
        }
    }

    /// State initialization mode
    pub fn state_init(&self) -> StateInit {
        self.state_init
    }

    fn setup(&self) -> Option<&FilterSetup> {
        match &self.stage {
            Stage::Empty => None,
            Stage::Configured { setup, .. } | Stage::Streaming { setup, .. } => Some(setup),
        }
    }
}

impl<D: SosDesigner + Clone> FilterSession<D> {
    /// A fresh `Configured` session with the same table, for probing without
    /// disturbing this one
    pub fn analysis_session(&self) -> Result<Self> {
        let setup = *self.setup().ok_or(FilterError::NotConfigured)?;
        Ok(Self {
            designer: self.designer.clone(),
            state_init: self.state_init,
            stage: Stage::Configured {
                setup,
                table: self.table()?.clone(),
            },
            response_cache: None,
        })
    }
}
