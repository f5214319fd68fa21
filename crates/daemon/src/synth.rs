//! Synthetic EEG generator used by the mock producer: per-band phase
//! accumulator oscillators with channel-specific weights plus broadband
//! noise, so the analysis pipeline sees plausible spectra without hardware.

use std::f32::consts::PI;

use brain_core::NUM_CHANNELS;
use rand::Rng;

/// Center frequencies of the five synthesized bands, in Hz.
const BAND_FREQS_HZ: [f32; 5] = [2.5, 6.0, 10.0, 20.0, 40.0];

/// Band amplitude weights per channel, [delta, theta, alpha, beta, gamma]
/// in µV. Temporal channels (TP9/TP10) lean alpha, frontal channels
/// (AF7/AF8) carry more slow-wave content, roughly matching scalp topography.
const CHANNEL_WEIGHTS: [[f32; 5]; NUM_CHANNELS] = [
    [20.0, 12.0, 35.0, 10.0, 3.0], // TP9
    [30.0, 18.0, 15.0, 12.0, 4.0], // AF7
    [30.0, 18.0, 15.0, 12.0, 4.0], // AF8
    [20.0, 12.0, 35.0, 10.0, 3.0], // TP10
];

const NOISE_AMPLITUDE_UV: f32 = 5.0;

/// Streaming generator; each call to [`SynthEeg::next_sample`] advances one
/// channel by one sample period.
pub struct SynthEeg {
    sample_rate: f32,
    phases: [[f32; 5]; NUM_CHANNELS],
}

impl SynthEeg {
    pub fn new(sample_rate: f32) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            sample_rate,
            // Random starting phases decorrelate the channels.
            phases: std::array::from_fn(|_| std::array::from_fn(|_| rng.gen::<f32>() * 2.0 * PI)),
        }
    }

    /// Next sample for `channel`, in µV.
    pub fn next_sample(&mut self, channel: usize) -> f32 {
        let mut rng = rand::thread_rng();
        let mut signal = 0.0f32;
        for (band, &freq) in BAND_FREQS_HZ.iter().enumerate() {
            let phase = &mut self.phases[channel][band];
            *phase += 2.0 * PI * freq / self.sample_rate;
            if *phase > 2.0 * PI {
                *phase -= 2.0 * PI;
            }
            signal += phase.sin() * CHANNEL_WEIGHTS[channel][band];
        }
        signal + (rng.gen::<f32>() - 0.5) * NOISE_AMPLITUDE_UV
    }

    /// A burst of `count` consecutive samples for `channel`.
    pub fn next_burst(&mut self, channel: usize, count: usize) -> Vec<f32> {
        (0..count).map(|_| self.next_sample(channel)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::{band_power, Band};

    #[test]
    fn output_stays_in_a_plausible_eeg_range() {
        let mut synth = SynthEeg::new(256.0);
        for ch in 0..NUM_CHANNELS {
            for _ in 0..1024 {
                let v = synth.next_sample(ch);
                assert!(v.abs() < 200.0, "channel {} produced {} µV", ch, v);
            }
        }
    }

    #[test]
    fn temporal_channels_lean_alpha() {
        let mut synth = SynthEeg::new(256.0);
        let window = synth.next_burst(0, 256); // TP9
        let (alpha_lo, alpha_hi) = Band::Alpha.range_hz();
        let (beta_lo, beta_hi) = Band::Beta.range_hz();
        let alpha = band_power(&window, 256.0, alpha_lo, alpha_hi);
        let beta = band_power(&window, 256.0, beta_lo, beta_hi);
        assert!(alpha > beta, "alpha {} should exceed beta {}", alpha, beta);
    }

    #[test]
    fn bursts_advance_the_oscillator_state() {
        let mut synth = SynthEeg::new(256.0);
        let a = synth.next_burst(1, 64);
        let b = synth.next_burst(1, 64);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
