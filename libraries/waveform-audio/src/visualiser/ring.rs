//! Fixed-capacity ring of equally sized frame buffers

/// Ring of `depth` slots, each `slot_len` samples long
///
/// Tracks `(write_index, count)` explicitly: a slot is populated iff it is
/// one of the last `count` slots written.
#[derive(Debug, Clone)]
pub(crate) struct FrameRing {
    slots: Vec<Vec<f32>>,
    write_index: usize,
    count: usize,
}

impl FrameRing {
    pub(crate) fn new(depth: usize, slot_len: usize) -> Self {
        Self {
            slots: vec![vec![0.0; slot_len]; depth.max(1)],
            write_index: 0,
            count: 0,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Overwrite the oldest slot (or the next free one) and advance
    pub(crate) fn push_with<F>(&mut self, fill: F)
    where
        F: FnOnce(&mut [f32]),
    {
        let depth = self.depth();
        fill(&mut self.slots[self.write_index]);
        self.write_index = (self.write_index + 1) % depth;
        self.count = (self.count + 1).min(depth);
    }

    /// Most recently written slot
    pub(crate) fn latest(&self) -> Option<&[f32]> {
        if self.count == 0 {
            return None;
        }
        let depth = self.depth();
        Some(&self.slots[(self.write_index + depth - 1) % depth])
    }

    /// Populated slots, oldest first
    pub(crate) fn populated(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let depth = self.depth();
        let start = (self.write_index + depth - self.count) % depth;
        (0..self.count).map(move |k| self.slots[(start + k) % depth].as_slice())
    }

    /// Mark every slot empty, keeping the allocations
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.fill(0.0);
        }
        self.write_index = 0;
        self.count = 0;
    }
}
