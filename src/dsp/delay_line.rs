use super::lerp;

/// Circular buffer with fractional-delay reads
///
/// `write` steps the write index backwards before storing, so a delay of
/// `d` samples is simply `write_index + d` (mod size).
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_index: usize,
}

impl DelayLine {
    /// Create a zeroed delay line of `size` samples (at least 1)
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            write_index: 0,
        }
    }

    /// Change the length. Reallocates and clears the contents.
    pub fn resize(&mut self, size: usize) {
        self.buffer = vec![0.0; size.max(1)];
        self.write_index = 0;
    }

    /// Clear the contents
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_index = 0;
    }

    /// Length in samples
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Push one sample
    #[inline]
    pub fn write(&mut self, x: f32) {
        self.write_index = if self.write_index == 0 {
            self.buffer.len() - 1
        } else {
            self.write_index - 1
        };
        self.buffer[self.write_index] = x;
    }

    /// Read `delay` samples back from the last write, linearly interpolated
    ///
    /// A delay of 0 returns the last written sample. Negative delays are
    /// treated as 0.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let delay = delay.max(0.0);
        let whole = delay.floor();
        let frac = delay - whole;
        let size = self.buffer.len();
        let index = (whole as usize + self.write_index) % size;
        let next = if index + 1 < size { index + 1 } else { 0 };
        lerp(self.buffer[index], self.buffer[next], frac)
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new(1024)
    }
}
