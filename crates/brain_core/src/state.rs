//! Snapshot types consumed by presentation collaborators.

use serde::{Deserialize, Serialize};

/// 3-axis motion vector: one accelerometer or gyroscope reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Immutable snapshot of the estimated cognitive/physiological state.
///
/// Produced fresh on each analysis tick; it has no identity beyond the tick
/// that produced it and is meant to be consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrainState {
    /// Relative band powers in [0,1]; they sum to ≈1 once at least one
    /// channel holds a full analysis window.
    pub delta: f32,
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
    /// Derived scores in [0,1]; zero until calibration completes.
    pub focus: f32,
    pub calm: f32,
    pub focused: bool,
    /// Cumulative event counters since streaming started.
    pub blinks: u32,
    pub clenches: u32,
    pub calibrating: bool,
    /// Fraction of the calibration window elapsed, pinned to 1 once active.
    pub calibration_progress: f32,
}

impl Default for BrainState {
    fn default() -> Self {
        Self {
            delta: 0.0,
            theta: 0.0,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            focus: 0.0,
            calm: 0.0,
            focused: false,
            blinks: 0,
            clenches: 0,
            calibrating: true,
            calibration_progress: 0.0,
        }
    }
}
