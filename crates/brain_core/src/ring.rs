//! Per-channel circular sample storage.

/// Fixed-capacity circular store of raw samples for one EEG channel.
///
/// The write cursor increases monotonically for the lifetime of the stream
/// and is never reset; the physical slot for logical index `i` is
/// `i % capacity`. The buffer always holds the most recent
/// `min(cursor, capacity)` samples in arrival order and self-evicts by
/// overwrite — there is no delete operation.
///
/// Writes are owned exclusively by the ingestion path; the analysis engine
/// only reads indices strictly behind the cursor. A reader that falls more
/// than one capacity behind silently loses the oldest unread data, which is
/// acceptable here: the system favors freshness over completeness.
#[derive(Debug, Clone)]
pub struct ChannelRing {
    samples: Vec<f32>,
    cursor: u64,
}

impl ChannelRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            samples: vec![0.0; capacity],
            cursor: 0,
        }
    }

    /// Append one sample, overwriting the oldest slot once full. O(1),
    /// never fails, never blocks.
    pub fn push(&mut self, sample: f32) {
        let idx = (self.cursor % self.samples.len() as u64) as usize;
        self.samples[idx] = sample;
        self.cursor += 1;
    }

    /// Total number of samples ever written.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.cursor.min(self.samples.len() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Read the slot holding logical index `index`.
    ///
    /// Only meaningful for indices within one capacity behind the cursor;
    /// older indices return whatever sample has since overwritten the slot.
    pub fn slot(&self, index: u64) -> f32 {
        self.samples[(index % self.samples.len() as u64) as usize]
    }

    /// The last `count` samples in arrival order, without mutating state.
    /// Requests beyond what has ever been written are clamped.
    pub fn read_newest(&self, count: usize) -> Vec<f32> {
        let count = count.min(self.len());
        let start = self.cursor - count as u64;
        (start..self.cursor).map(|i| self.slot(i)).collect()
    }
}
