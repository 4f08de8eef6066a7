//! One independent session per audio channel
//!
//! Interleaved buffers (L, R, L, R, ...) are split per channel, filtered with
//! that channel's own memory, and interleaved again. Channels never share
//! state, so each could equally be driven from its own thread.

use crate::error::{FilterError, Result};
use crate::kind::FilterKind;
use crate::session::{FilterSession, StateInit};

/// Bank of identically configured filter sessions, one per channel
#[derive(Debug, Clone)]
pub struct ChannelBank {
    sessions: Vec<FilterSession>,
}

impl ChannelBank {
    /// Configure `channels` sessions with the same filter
    ///
    /// # Errors
    /// `InvalidParameters` for zero channels or a kind that does not fit
    /// `sample_rate`.
    pub fn new(channels: usize, kind: FilterKind, sample_rate: u32) -> Result<Self> {
        Self::with_state_init(channels, kind, sample_rate, StateInit::default())
    }

    /// Same as [`new`](Self::new) with an explicit state initialization mode
    pub fn with_state_init(
        channels: usize,
        kind: FilterKind,
        sample_rate: u32,
        state_init: StateInit,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(FilterError::InvalidParameters(
                "channel count must be at least 1".to_string(),
            ));
        }

        let mut template = FilterSession::new().with_state_init(state_init);
        template.configure(kind, sample_rate)?;

        Ok(Self {
            sessions: vec![template; channels],
        })
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.sessions.len()
    }

    /// Session for one channel
    pub fn channel(&self, index: usize) -> Option<&FilterSession> {
        self.sessions.get(index)
    }

    /// Mutable session for one channel
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut FilterSession> {
        self.sessions.get_mut(index)
    }

    /// Filter an interleaved buffer
    ///
    /// # Errors
    /// `InvalidBuffer` if the length is not a multiple of the channel count.
    /// Filter memory is only advanced when every channel can be filtered.
    pub fn process_interleaved(&mut self, samples: &[f64]) -> Result<Vec<f64>> {
        let channels = self.sessions.len();
        if samples.len() % channels != 0 {
            return Err(FilterError::InvalidBuffer(format!(
                "sample count {} is not divisible by channel count {}",
                samples.len(),
                channels
            )));
        }

        for session in &mut self.sessions {
            session.prepare()?;
        }

        let mut output = vec![0.0; samples.len()];
        let mut lane = Vec::with_capacity(samples.len() / channels);

        for (ch, session) in self.sessions.iter_mut().enumerate() {
            lane.clear();
            lane.extend(samples.iter().skip(ch).step_by(channels));
            session.filter_in_place(&mut lane)?;

            for (slot, value) in output.iter_mut().skip(ch).step_by(channels).zip(&lane) {
                *slot = *value;
            }
        }

        Ok(output)
    }

    /// Drop filter memory on every channel
    pub fn reset(&mut self) {
        for session in &mut self.sessions {
            session.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_channels_rejected() {
        let result = ChannelBank::new(0, FilterKind::highpass(1000.0, 2), 44100);
        assert!(matches!(result, Err(FilterError::InvalidParameters(_))));
    }

    #[test]
    fn ragged_buffer_rejected() {
        let mut bank = ChannelBank::new(2, FilterKind::highpass(1000.0, 2), 44100).unwrap();
        let result = bank.process_interleaved(&[0.0; 5]);
        assert!(matches!(result, Err(FilterError::InvalidBuffer(_))));
        assert!(bank.channel(0).unwrap().zi().is_none());
    }

    #[test]
    fn channels_match_mono_sessions() {
        let kind = FilterKind::bandpass(200.0, 4000.0, 3);
        let left: Vec<f64> = (0..200).map(|i| (i as f64 * 0.05).sin()).collect();
        let right: Vec<f64> = (0..200).map(|i| (i as f64 * 0.31).cos()).collect();
        let interleaved: Vec<f64> = left
            .iter()
            .zip(&right)
            .flat_map(|(l, r)| [*l, *r])
            .collect();

        let mut bank = ChannelBank::new(2, kind, 44100).unwrap();
        let out = bank.process_interleaved(&interleaved).unwrap();

        let mut mono_l = FilterSession::new();
        mono_l.configure(kind, 44100).unwrap();
        let mut mono_r = mono_l.clone();

        let expected_l = mono_l.filter_buffer(&left).unwrap();
        let expected_r = mono_r.filter_buffer(&right).unwrap();

        for i in 0..200 {
            assert_eq!(out[2 * i], expected_l[i]);
            assert_eq!(out[2 * i + 1], expected_r[i]);
        }
    }

    #[test]
    fn reset_returns_every_channel_to_configured() {
        let mut bank = ChannelBank::new(3, FilterKind::highpass(500.0, 3), 48000).unwrap();
        bank.process_interleaved(&[0.1; 30]).unwrap();
        assert!(bank.channel(2).unwrap().zi().is_some());

        bank.reset();
        assert_eq!(bank.channels(), 3);
        assert!((0..3).all(|ch| bank.channel(ch).unwrap().zi().is_none()));
    }
}
