//! The stateful analysis core: event detection, smoothing, calibration and
//! scoring, advanced by an externally scheduled tick.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::debug;

use crate::bandpower::{band_power, Band, BandPowers};
use crate::ring::ChannelRing;
use crate::state::{BrainState, Xyz};

/// Number of EEG channels in the montage (TP9, AF7, AF8, TP10).
pub const NUM_CHANNELS: usize = 4;
/// Frontal electrodes (AF7, AF8): dominant during eye blinks.
pub const FRONTAL_CHANNELS: [usize; 2] = [1, 2];
/// Temporal electrodes (TP9, TP10): dominant during jaw clenches.
pub const TEMPORAL_CHANNELS: [usize; 2] = [0, 3];

// Focus score mapping: clamp01((ratio/threshold - MARGIN) * GAIN), so the
// score crosses zero a little below the calibrated threshold and saturates
// somewhat above it.
const FOCUS_MARGIN: f32 = 0.5;
const FOCUS_GAIN: f32 = 1.2;

/// Tunable parameters of the brain state engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate of the incoming EEG stream in Hz.
    pub sample_rate: f32,
    /// FFT window length in samples; must be a power of two.
    pub fft_size: usize,
    /// Seconds of raw signal retained per channel for rendering/analysis.
    pub window_secs: usize,
    /// EMA weight applied to each new band power observation.
    pub smoothing: f32,
    /// Length of the baseline calibration phase.
    pub calibration: Duration,
    /// Percentile of the calibration focus ratios frozen as the threshold.
    pub focus_percentile: f32,
    /// Minimum frontal peak amplitude for a blink, in µV.
    pub blink_threshold_uv: f32,
    /// Minimum temporal peak amplitude for a jaw clench, in µV.
    pub clench_threshold_uv: f32,
    /// How much larger the dominant region's peak must be than the other
    /// region's to classify the artifact.
    pub artifact_dominance: f32,
    /// Minimum spacing between two recorded events of the same kind.
    pub refractory: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 256.0,
            fft_size: 256,
            window_secs: 4,
            smoothing: 0.2,
            calibration: Duration::from_secs(8),
            focus_percentile: 0.6,
            blink_threshold_uv: 400.0,
            clench_threshold_uv: 300.0,
            artifact_dominance: 1.5,
            refractory: Duration::from_millis(600),
        }
    }
}

impl EngineConfig {
    /// Ring capacity implied by the sample rate and retention window.
    pub fn ring_capacity(&self) -> usize {
        self.sample_rate as usize * self.window_secs
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate <= 0.0 {
            bail!("sample rate must be positive");
        }
        if !self.fft_size.is_power_of_two() {
            bail!("FFT size must be a power of 2");
        }
        if self.fft_size > self.ring_capacity() {
            bail!("FFT size exceeds the ring capacity");
        }
        if self.smoothing <= 0.0 || self.smoothing > 1.0 {
            bail!("smoothing weight must be in (0, 1]");
        }
        if !(0.0..1.0).contains(&self.focus_percentile) {
            bail!("focus percentile must be in [0, 1)");
        }
        if self.artifact_dominance < 1.0 {
            bail!("artifact dominance ratio must be at least 1");
        }
        Ok(())
    }
}

/// Calibration lifecycle. An explicit tagged state rather than zero-valued
/// sentinels, so a legitimately-zero threshold cannot retrigger calibration.
#[derive(Debug, Clone)]
enum Phase {
    /// Not streaming; ticks are no-ops.
    Idle,
    /// Collecting baseline focus ratios since `started`.
    Calibrating {
        started: Instant,
        focus_ratios: Vec<f32>,
    },
    /// Thresholds frozen for the remainder of the stream. The baseline is
    /// unset when calibration collected no samples, in which case calm
    /// falls back to raw relative alpha.
    Active {
        focus_threshold: f32,
        calm_baseline: Option<f32>,
    },
}

/// Owns every piece of mutable analysis state and exposes a synchronous
/// `push_sample`/`tick`/`latest_state` surface. The periodic scheduler is
/// an external dependency; ticks must be driven from a single caller so
/// they never overlap.
pub struct BrainEngine {
    config: EngineConfig,
    rings: [ChannelRing; NUM_CHANNELS],
    accel: Xyz,
    gyro: Xyz,
    phase: Phase,
    smoothed: BandPowers,
    blink_count: u32,
    clench_count: u32,
    last_blink: Option<Instant>,
    last_clench: Option<Instant>,
    /// Per-channel cursor snapshot from the prior tick, delimiting the
    /// "new since last tick" range for the event scan.
    prev_cursors: [u64; NUM_CHANNELS],
    latest: BrainState,
}

impl BrainEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.ring_capacity();
        Ok(Self {
            rings: std::array::from_fn(|_| ChannelRing::new(capacity)),
            accel: Xyz::default(),
            gyro: Xyz::default(),
            phase: Phase::Idle,
            smoothed: BandPowers::default(),
            blink_count: 0,
            clench_count: 0,
            last_blink: None,
            last_clench: None,
            prev_cursors: [0; NUM_CHANNELS],
            latest: BrainState::default(),
            config,
        })
    }

    /// Append one EEG sample in µV. An out-of-range channel is a silent
    /// no-op: a guard against producer bugs, not a caller-facing fault.
    pub fn push_sample(&mut self, channel: usize, value: f32) {
        if let Some(ring) = self.rings.get_mut(channel) {
            ring.push(value);
        }
    }

    pub fn set_accel(&mut self, v: Xyz) {
        self.accel = v;
    }

    pub fn set_gyro(&mut self, v: Xyz) {
        self.gyro = v;
    }

    pub fn accel(&self) -> Xyz {
        self.accel
    }

    pub fn gyro(&self) -> Xyz {
        self.gyro
    }

    /// Most recent `count` raw samples of a channel, oldest first, for
    /// waveform rendering. Unknown channels read as empty.
    pub fn channel_samples(&self, channel: usize, count: usize) -> Vec<f32> {
        self.rings
            .get(channel)
            .map(|ring| ring.read_newest(count))
            .unwrap_or_default()
    }

    /// The snapshot produced by the last tick that emitted one.
    pub fn latest_state(&self) -> BrainState {
        self.latest
    }

    pub fn is_streaming(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Cumulative blinks recorded since the stream started.
    pub fn blinks(&self) -> u32 {
        self.blink_count
    }

    /// Cumulative jaw clenches recorded since the stream started.
    pub fn clenches(&self) -> u32 {
        self.clench_count
    }

    /// Begin (or restart) a stream at `now`, discarding all per-stream
    /// state and snapshotting the current write cursors. Nothing survives a
    /// disconnect/reconnect.
    pub fn start_stream(&mut self, now: Instant) {
        self.phase = Phase::Calibrating {
            started: now,
            focus_ratios: Vec::new(),
        };
        self.smoothed = BandPowers::default();
        self.blink_count = 0;
        self.clench_count = 0;
        self.last_blink = None;
        self.last_clench = None;
        for (snap, ring) in self.prev_cursors.iter_mut().zip(&self.rings) {
            *snap = ring.cursor();
        }
        self.latest = BrainState::default();
        debug!("stream started, entering calibration");
    }

    /// Stop streaming. Subsequent ticks emit nothing until `start_stream`
    /// is called again, so no partial tick can land after shutdown.
    pub fn stop_stream(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Run one analysis pass at `now`. Returns the fresh snapshot, or
    /// `None` when not streaming or when no channel holds a full FFT window
    /// yet (the previous snapshot then stands for consumers).
    pub fn tick(&mut self, now: Instant) -> Option<BrainState> {
        if matches!(self.phase, Phase::Idle) {
            return None;
        }

        self.detect_events(now);

        let raw = self.raw_band_average()?;
        self.smooth(raw);

        let rel = self.relative_powers();
        let focus_ratio = if self.smoothed.alpha > 0.0 {
            self.smoothed.beta / self.smoothed.alpha
        } else {
            0.0
        };

        let mut state = BrainState {
            delta: rel.delta,
            theta: rel.theta,
            alpha: rel.alpha,
            beta: rel.beta,
            gamma: rel.gamma,
            focus: 0.0,
            calm: 0.0,
            focused: false,
            blinks: self.blink_count,
            clenches: self.clench_count,
            calibrating: false,
            calibration_progress: 1.0,
        };

        self.phase = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => unreachable!("checked streaming above"),
            Phase::Calibrating {
                started,
                mut focus_ratios,
            } => {
                let elapsed = now.duration_since(started);
                if elapsed < self.config.calibration {
                    focus_ratios.push(focus_ratio);
                    state.calibrating = true;
                    state.calibration_progress = (elapsed.as_secs_f32()
                        / self.config.calibration.as_secs_f32())
                    .min(1.0);
                    Phase::Calibrating {
                        started,
                        focus_ratios,
                    }
                } else {
                    // One-shot transition: both scalars freeze here until
                    // the next stream restart. A window that collected no
                    // ratios leaves the baseline unset so calm keeps
                    // reporting raw relative alpha.
                    let focus_threshold =
                        percentile(&focus_ratios, self.config.focus_percentile);
                    let calm_baseline = (!focus_ratios.is_empty()).then_some(rel.alpha);
                    debug!(
                        focus_threshold = %focus_threshold,
                        ?calm_baseline,
                        "calibration complete"
                    );
                    Phase::Active {
                        focus_threshold,
                        calm_baseline,
                    }
                }
            }
            active @ Phase::Active { .. } => active,
        };

        if let Phase::Active {
            focus_threshold,
            calm_baseline,
        } = self.phase
        {
            state.focus = if focus_threshold > 0.0 {
                clamp01((focus_ratio / focus_threshold - FOCUS_MARGIN) * FOCUS_GAIN)
            } else {
                0.0
            };
            state.calm = match calm_baseline {
                Some(baseline) if baseline > 0.0 => clamp01(rel.alpha / (baseline * 2.0)),
                _ => rel.alpha,
            };
            state.focused = focus_ratio > focus_threshold;
        }

        self.latest = state;
        Some(state)
    }

    /// Scan samples written since the previous tick and update the blink
    /// and clench counters, then snapshot the cursors.
    fn detect_events(&mut self, now: Instant) {
        let mut frontal_peak = 0.0f32;
        let mut temporal_peak = 0.0f32;

        for (ch, ring) in self.rings.iter().enumerate() {
            let cursor = ring.cursor();
            let prev = self.prev_cursors[ch];
            if cursor <= prev {
                continue;
            }
            // A scan that fell behind by more than one buffer has lost the
            // oldest unread slots to overwrite; clamp to what is resident.
            let start = prev.max(cursor.saturating_sub(ring.capacity() as u64));
            let peak = if FRONTAL_CHANNELS.contains(&ch) {
                &mut frontal_peak
            } else {
                &mut temporal_peak
            };
            for i in start..cursor {
                let v = ring.slot(i).abs();
                if v > *peak {
                    *peak = v;
                }
            }
        }

        if frontal_peak > self.config.blink_threshold_uv
            && frontal_peak > temporal_peak * self.config.artifact_dominance
            && past_refractory(self.last_blink, now, self.config.refractory)
        {
            self.blink_count += 1;
            self.last_blink = Some(now);
            debug!(peak_uv = %frontal_peak, total = self.blink_count, "blink detected");
        }

        if temporal_peak > self.config.clench_threshold_uv
            && temporal_peak > frontal_peak * self.config.artifact_dominance
            && past_refractory(self.last_clench, now, self.config.refractory)
        {
            self.clench_count += 1;
            self.last_clench = Some(now);
            debug!(peak_uv = %temporal_peak, total = self.clench_count, "jaw clench detected");
        }

        for (snap, ring) in self.prev_cursors.iter_mut().zip(&self.rings) {
            *snap = ring.cursor();
        }
    }

    /// Per-band power averaged over channels holding a full FFT window;
    /// `None` when no channel qualifies this tick.
    fn raw_band_average(&self) -> Option<BandPowers> {
        let mut sums = BandPowers::default();
        let mut valid = 0u32;

        for ring in &self.rings {
            if ring.len() < self.config.fft_size {
                continue;
            }
            valid += 1;
            let window = ring.read_newest(self.config.fft_size);
            for band in Band::ALL {
                let (lo, hi) = band.range_hz();
                let power = band_power(&window, self.config.sample_rate, lo, hi);
                sums.set(band, sums.get(band) + power);
            }
        }

        if valid == 0 {
            return None;
        }
        for band in Band::ALL {
            sums.set(band, sums.get(band) / valid as f32);
        }
        Some(sums)
    }

    fn smooth(&mut self, raw: BandPowers) {
        let w = self.config.smoothing;
        for band in Band::ALL {
            let prev = self.smoothed.get(band);
            // The first contribution seeds the average directly; blending
            // up from zero would fake a ramp-in.
            let next = if prev == 0.0 {
                raw.get(band)
            } else {
                prev * (1.0 - w) + raw.get(band) * w
            };
            self.smoothed.set(band, next);
        }
    }

    fn relative_powers(&self) -> BandPowers {
        let total = self.smoothed.total();
        if total <= 0.0 {
            return BandPowers::default();
        }
        BandPowers {
            delta: self.smoothed.delta / total,
            theta: self.smoothed.theta / total,
            alpha: self.smoothed.alpha / total,
            beta: self.smoothed.beta / total,
            gamma: self.smoothed.gamma / total,
        }
    }
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

fn past_refractory(last: Option<Instant>, now: Instant, refractory: Duration) -> bool {
    match last {
        None => true,
        Some(t) => now.duration_since(t) >= refractory,
    }
}

/// Value at the given fraction of the ascending-sorted input; 0 when empty.
fn percentile(values: &[f32], fraction: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let idx = ((sorted.len() as f32 * fraction) as usize).min(sorted.len() - 1);
    sorted[idx]
}
