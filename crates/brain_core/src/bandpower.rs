//! Windowed band power extraction over raw sample windows.

use std::f32::consts::PI;

use crate::fft::fft_in_place;

/// The five canonical EEG frequency bands tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::Beta,
        Band::Gamma,
    ];

    /// Band edges in Hz.
    pub fn range_hz(self) -> (f32, f32) {
        match self {
            Band::Delta => (1.0, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 12.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 50.0),
        }
    }
}

/// Absolute power per band, raw or smoothed depending on context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandPowers {
    pub delta: f32,
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl BandPowers {
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }

    pub fn set(&mut self, band: Band, value: f32) {
        match band {
            Band::Delta => self.delta = value,
            Band::Theta => self.theta = value,
            Band::Alpha => self.alpha = value,
            Band::Beta => self.beta = value,
            Band::Gamma => self.gamma = value,
        }
    }

    pub fn total(&self) -> f32 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }
}

/// Average power per frequency bin of `samples` between `low_hz` and
/// `high_hz` inclusive; µV² when the samples are in µV.
///
/// A Hann window is applied before the transform to limit spectral leakage.
/// Band edges that straddle no integer bin (`hi < lo`) yield 0 — the fixed
/// 256-point / 256 Hz configuration never produces that case, but the guard
/// keeps the function total.
pub fn band_power(samples: &[f32], sample_rate: f32, low_hz: f32, high_hz: f32) -> f32 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }

    let mut re = vec![0.0f32; n];
    let mut im = vec![0.0f32; n];
    for (i, &s) in samples.iter().enumerate() {
        let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / (n - 1) as f32).cos());
        re[i] = s * w;
    }

    fft_in_place(&mut re, &mut im);

    let bin_hz = sample_rate / n as f32;
    let lo = (low_hz / bin_hz).ceil() as usize;
    let hi = ((high_hz / bin_hz).floor() as usize).min(n - 1);
    if hi < lo {
        return 0.0;
    }

    let sum: f32 = (lo..=hi).map(|k| re[k] * re[k] + im[k] * im[k]).sum();
    sum / (hi - lo + 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sine(freq_hz: f32, amplitude: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn alpha_tone_lands_in_the_alpha_band() {
        let samples = sine(10.0, 50.0, 256.0, 256);
        let (alpha_lo, alpha_hi) = Band::Alpha.range_hz();
        let alpha = band_power(&samples, 256.0, alpha_lo, alpha_hi);
        for band in [Band::Delta, Band::Theta, Band::Beta, Band::Gamma] {
            let (lo, hi) = band.range_hz();
            let power = band_power(&samples, 256.0, lo, hi);
            assert!(
                alpha > power * 10.0,
                "10 Hz tone should dominate alpha over {:?}",
                band
            );
        }
    }

    #[test]
    fn empty_bin_range_yields_zero() {
        let samples = sine(10.0, 50.0, 256.0, 256);
        // 0.2..0.8 Hz straddles no integer bin at 1 Hz resolution.
        assert_eq!(band_power(&samples, 256.0, 0.2, 0.8), 0.0);
    }

    #[test]
    fn degenerate_windows_yield_zero() {
        assert_eq!(band_power(&[], 256.0, 1.0, 4.0), 0.0);
        assert_eq!(band_power(&[1.0], 256.0, 1.0, 4.0), 0.0);
    }

    #[test]
    fn band_powers_indexing_round_trips() {
        let mut powers = BandPowers::default();
        for (i, band) in Band::ALL.iter().enumerate() {
            powers.set(*band, i as f32 + 1.0);
        }
        for (i, band) in Band::ALL.iter().enumerate() {
            assert_eq!(powers.get(*band), i as f32 + 1.0);
        }
        assert_eq!(powers.total(), 15.0);
    }

    proptest! {
        #[test]
        fn band_power_is_never_negative(
            samples in proptest::collection::vec(-500.0f32..500.0, 256),
            low in 0.0f32..60.0,
            span in 0.0f32..60.0,
        ) {
            let power = band_power(&samples, 256.0, low, low + span);
            prop_assert!(power >= 0.0);
        }
    }
}
