//! Frequency and impulse response analysis


use proptest::prelude::*;
use ricane_filter::{
    FilterKind, FilterSession, FrequencySpacing, SessionState, SosTable, StateInit,
};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;
use test_helpers::{generate_noise, init_tracing, lowpass_rows, max_abs_diff};

fn configured(kind: FilterKind, sample_rate: u32) -> FilterSession {
    let mut session = FilterSession::new();
    session.configure(kind, sample_rate).unwrap();
    session
}

// ========== DC gain ==========

#[test]
fn dc_gain_matches_response_at_zero() {
    init_tracing();
    let table = SosTable::from_rows(&lowpass_rows()).unwrap();
    let mut session = FilterSession::new();
    session
        .configure_with_table(FilterKind::highpass(100.0, 1), 44100, table.clone())
        .unwrap();

    let response = session.frequency_response(512).unwrap();

    assert_eq!(response.frequencies()[0], 0.0);
    let at_dc = response.gains()[0];
    assert!((at_dc.re - table.dc_gain()).abs() < 1e-12);
    assert!(at_dc.im.abs() < 1e-12);

    let product: f64 = table.sections().iter().map(|s| s.dc_gain()).product();
    assert!((product - table.dc_gain()).abs() < 1e-12);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn designed_dc_gain_matches_response(
        low in 50.0_f64..2000.0,
        ratio in 1.5_f64..6.0,
        order in 1_u32..7,
    ) {
        let mut session = configured(FilterKind::bandpass(low, low * ratio, order), 44100);
        let dc = session.table().unwrap().dc_gain();
        let response = session.frequency_response(64).unwrap();

        prop_assert!((response.gains()[0].re - dc).abs() < 1e-9);
        prop_assert!(response.magnitude()[0] < 1e-6);
    }
}

// ========== Analysis does not disturb the stream ==========

#[test]
fn frequency_response_is_idempotent() {
    let mut session = configured(FilterKind::bandpass(300.0, 3000.0, 4), 44100);

    let first = session.frequency_response(2000).unwrap();
    let second = session.frequency_response(2000).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2000);
}

#[test]
fn frequency_response_leaves_filter_memory_alone() {
    let kind = FilterKind::highpass(1000.0, 4);
    let first = generate_noise(300, 1);
    let second = generate_noise(300, 2);

    let mut plain = configured(kind, 44100);
    plain.filter_buffer(&first).unwrap();
    let expected = plain.filter_buffer(&second).unwrap();

    let mut probed = configured(kind, 44100);
    probed.filter_buffer(&first).unwrap();
    let zi_before = probed.zi().cloned();
    probed.frequency_response(2000).unwrap();
    probed
        .frequency_response_with(100, FrequencySpacing::Logarithmic)
        .unwrap();
    assert_eq!(probed.zi().cloned(), zi_before);

    assert_eq!(probed.filter_buffer(&second).unwrap(), expected);
}

#[test]
fn frequency_response_before_filtering_keeps_session_configured() {
    let mut session = configured(FilterKind::highpass(1000.0, 4), 44100);
    session.frequency_response(128).unwrap();
    assert_eq!(session.state(), SessionState::Configured);
    assert!(session.zi().is_none());
}

#[test]
fn cache_follows_reconfiguration() {
    let mut session = configured(FilterKind::highpass(500.0, 2), 44100);
    let before = session.frequency_response(256).unwrap();

    session
        .configure(FilterKind::highpass(5000.0, 2), 44100)
        .unwrap();
    let after = session.frequency_response(256).unwrap();

    assert_ne!(before, after);
    let expected = configured(FilterKind::highpass(5000.0, 2), 44100)
        .frequency_response(256)
        .unwrap();
    assert_eq!(after, expected);
}

#[test]
fn response_requires_configuration() {
    let mut session = FilterSession::new();
    assert!(session.frequency_response(16).is_err());
    assert!(session.impulse_response(16).is_err());
}

// ========== Highpass shape ==========

#[test]
fn highpass_response_in_hz() {
    let mut session = configured(FilterKind::highpass(1000.0, 4), 44100);
    let response = session.frequency_response(2000).unwrap();
    let hz = response.frequencies_hz(44100);
    let db = response.magnitude_db();

    // Well below cutoff: heavy attenuation; well above: flat
    let at = |target: f64| {
        hz.iter()
            .position(|&f| f >= target)
            .unwrap_or(hz.len() - 1)
    };
    assert!(db[at(100.0)] < -60.0);
    assert!(db[at(10000.0)].abs() < 0.1);
    assert!(*hz.last().unwrap() < 22050.0);
}

#[test]
fn logarithmic_grid_ends_at_nyquist() {
    let mut session = configured(FilterKind::bandpass(300.0, 3000.0, 4), 44100);
    let response = session
        .frequency_response_with(100, FrequencySpacing::Logarithmic)
        .unwrap();
    let w = response.frequencies();

    assert_eq!(w.len(), 100);
    assert!(w[0] > 0.0);
    assert!((w[99] - PI).abs() < 1e-12);
    assert!(w.windows(2).all(|p| p[1] > p[0]));
}

// ========== Impulse response ==========

fn fft_magnitude(signal: &[f64]) -> Vec<f64> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(signal.len());
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft.process(&mut buffer);
    buffer.iter().map(|c| c.norm()).collect()
}

#[test]
fn impulse_spectrum_matches_frequency_response() {
    for kind in [
        FilterKind::highpass(1000.0, 2),
        FilterKind::highpass(3000.0, 5),
        FilterKind::bandpass(1000.0, 5000.0, 2),
    ] {
        let n = 8192;
        let mut session = FilterSession::new().with_state_init(StateInit::Zero);
        session.configure(kind, 44100).unwrap();

        let impulse = session.impulse_response(n).unwrap();
        let spectrum = fft_magnitude(&impulse);
        let response = session.frequency_response(n / 2).unwrap();

        let diff = max_abs_diff(&spectrum[..n / 2], &response.magnitude());
        assert!(diff < 1e-6, "{}: spectrum differs by {}", kind, diff);
    }
}

#[test]
fn impulse_response_advances_stream() {
    let mut session = FilterSession::new().with_state_init(StateInit::Zero);
    session
        .configure(FilterKind::highpass(1000.0, 2), 44100)
        .unwrap();

    let first = session.impulse_response(64).unwrap();
    assert_eq!(session.state(), SessionState::Streaming);

    // Memory from the first probe is still ringing
    let second = session.impulse_response(64).unwrap();
    assert_ne!(first, second);

    session.reset();
    assert_eq!(session.impulse_response(64).unwrap(), first);
}

#[test]
fn analysis_session_probes_without_disturbing() {
    let kind = FilterKind::bandpass(300.0, 3000.0, 4);
    let signal = generate_noise(256, 4);

    let mut reference = configured(kind, 44100);
    let expected = reference.filter_buffer(&signal).unwrap();

    let mut live = configured(kind, 44100);
    let mut output = live.filter_buffer(&signal[..100]).unwrap();

    let mut probe = live.analysis_session().unwrap();
    assert_eq!(probe.state(), SessionState::Configured);
    probe.impulse_response(1024).unwrap();

    output.extend(live.filter_buffer(&signal[100..]).unwrap());
    assert_eq!(output, expected);
}
