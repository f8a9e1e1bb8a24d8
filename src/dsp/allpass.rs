/// Schroeder all-pass feedback
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllPassSpec {
    pub feedback: f32,
}

/// All-pass diffuser with a fixed delay length
#[derive(Debug, Clone)]
pub struct AllPassState {
    buffer: Box<[f32]>,
    index: usize,
}

impl AllPassState {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)].into_boxed_slice(),
            index: 0,
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
    }

    #[inline]
    pub fn tick(&mut self, spec: &AllPassSpec, x: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = x + buffered * spec.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - x
    }

    pub fn process(&mut self, spec: &AllPassSpec, input: &[f32], output: &mut [f32]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.tick(spec, x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_response() {
        let spec = AllPassSpec { feedback: 0.5 };
        let mut ap = AllPassState::new(2);
        let input = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut output = [0.0f32; 6];
        ap.process(&spec, &input, &mut output);
        // Direct path inverted, then the buffered echoes
        assert_eq!(output, [-1.0, 0.0, 1.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_energy_preserved_roughly() {
        let spec = AllPassSpec { feedback: 0.5 };
        let mut ap = AllPassState::new(7);
        let mut energy = ap.tick(&spec, 1.0).powi(2);
        for _ in 0..2000 {
            energy += ap.tick(&spec, 0.0).powi(2);
        }
        // Schroeder form: direct -x plus buffered echoes; bounded and non-zero
        assert!(energy > 1.0 && energy < 3.0, "energy {}", energy);
        assert_eq!(ap.len(), 7);
    }
}
