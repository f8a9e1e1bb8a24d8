/// Schroeder comb feedback and damping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombSpec {
    pub feedback: f32,
    pub damp: f32,
}

/// Lowpass-feedback comb filter with a fixed delay length
///
/// The buffer is allocated once at construction.
#[derive(Debug, Clone)]
pub struct CombState {
    buffer: Box<[f32]>,
    index: usize,
    filter_store: f32,
}

impl CombState {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)].into_boxed_slice(),
            index: 0,
            filter_store: 0.0,
        }
    }

    /// Delay length in samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filter_store = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, spec: &CombSpec, x: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - spec.damp) + self.filter_store * spec.damp;
        self.buffer[self.index] = x + self.filter_store * spec.feedback;
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }

    pub fn process(&mut self, spec: &CombSpec, input: &[f32], output: &mut [f32]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.tick(spec, x);
        }
    }
}
