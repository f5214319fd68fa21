//! Wire format of the headset feed: one JSON object per WebSocket text
//! frame, discriminated by a `type` field.

use brain_core::{BrainEngine, Xyz};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed feed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One frame of the producer-to-consumer feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    /// A burst of consecutive EEG samples for one channel, in µV.
    Eeg { ch: usize, samples: Vec<f32> },
    /// Latest accelerometer reading, in g.
    Accel { x: f32, y: f32, z: f32 },
    /// Latest gyroscope reading, in deg/s.
    Gyro { x: f32, y: f32, z: f32 },
    /// Headset housekeeping; currently informational only.
    Telemetry { battery: f32, temp: f32 },
}

impl FeedMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Feed this frame into the engine. EEG bursts land in the ring
    /// buffers, motion frames overwrite the latest vectors, telemetry is
    /// accepted and ignored.
    pub fn apply(&self, engine: &mut BrainEngine) {
        match *self {
            FeedMessage::Eeg { ch, ref samples } => {
                for &v in samples {
                    engine.push_sample(ch, v);
                }
            }
            FeedMessage::Accel { x, y, z } => engine.set_accel(Xyz { x, y, z }),
            FeedMessage::Gyro { x, y, z } => engine.set_gyro(Xyz { x, y, z }),
            FeedMessage::Telemetry { .. } => {}
        }
    }
}
