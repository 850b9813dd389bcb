// Magic Wand - Sample Buffer
//
// Fixed-capacity ring holding the last `W` accelerometer samples as three
// planar arrays (one per axis). Once full, every push overwrites the oldest
// sample. Nothing here allocates.

use crate::events::Sample;

#[derive(Debug, Clone)]
pub struct SampleBuffer<const W: usize> {
    x: [f32; W],
    y: [f32; W],
    z: [f32; W],
    /// Slot the next sample is written to.
    head: usize,
    len: usize,
}

impl<const W: usize> SampleBuffer<W> {
    pub const fn new() -> Self {
        Self {
            x: [0.0; W],
            y: [0.0; W],
            z: [0.0; W],
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        W
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once a whole window has been collected.
    pub fn is_full(&self) -> bool {
        self.len == W
    }

    pub fn push(&mut self, sample: Sample) {
        if W == 0 {
            return;
        }
        self.x[self.head] = sample.x;
        self.y[self.head] = sample.y;
        self.z[self.head] = sample.z;
        self.head = (self.head + 1) % W;
        if self.len < W {
            self.len += 1;
        }
    }

    /// The `i`-th stored sample, 0 being the oldest.
    pub fn get(&self, i: usize) -> Option<Sample> {
        if i >= self.len {
            return None;
        }
        let slot = (self.oldest_slot() + i) % W;
        Some(Sample::new(self.x[slot], self.y[slot], self.z[slot]))
    }

    pub fn latest(&self) -> Option<Sample> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Samples in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Copy the buffer into `out` as `x0 y0 z0 x1 y1 z1 ...`, oldest first.
    /// Returns the number of floats written (3 * len, capped by `out`).
    pub fn write_interleaved(&self, out: &mut [f32]) -> usize {
        let mut written = 0;
        for (frame, sample) in out.chunks_exact_mut(3).zip(self.iter()) {
            frame[0] = sample.x;
            frame[1] = sample.y;
            frame[2] = sample.z;
            written += 3;
        }
        written
    }

    fn oldest_slot(&self) -> usize {
        if self.len < W {
            0
        } else {
            self.head
        }
    }
}

impl<const W: usize> Default for SampleBuffer<W> {
    fn default() -> Self {
        Self::new()
    }
}
