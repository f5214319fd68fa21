//! Real-time brain state estimation from a four-channel EEG stream.
//!
//! This crate is the synchronous analysis core: raw samples are pushed into
//! per-channel ring buffers by an ingestion collaborator, and a periodic
//! tick (driven by an external scheduler) runs spectral analysis, baseline
//! calibration, focus/calm scoring and blink/clench detection, emitting one
//! [`BrainState`] snapshot per tick.

pub mod bandpower;
pub mod engine;
pub mod fft;
pub mod ring;
pub mod state;

pub use bandpower::{band_power, Band, BandPowers};
pub use engine::{BrainEngine, EngineConfig, FRONTAL_CHANNELS, NUM_CHANNELS, TEMPORAL_CHANNELS};
pub use ring::ChannelRing;
pub use state::{BrainState, Xyz};
