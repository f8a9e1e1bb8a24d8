/// One-pole DC blocker coefficients
///
/// `y[n] = x[n] - x[n-1] + alpha * y[n-1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcBlockerSpec {
    pub alpha: f32,
}

impl Default for DcBlockerSpec {
    fn default() -> Self {
        Self { alpha: 0.995 }
    }
}

/// Per-channel DC blocker history
#[derive(Debug, Clone, Copy, Default)]
pub struct DcBlockerState {
    x1: f32,
    y1: f32,
}

impl DcBlockerState {
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, spec: &DcBlockerSpec, x: f32) -> f32 {
        self.y1 = x - self.x1 + spec.alpha * self.y1;
        self.x1 = x;
        self.y1
    }

    pub fn process(&mut self, spec: &DcBlockerSpec, input: &[f32], output: &mut [f32]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.tick(spec, x);
        }
    }
}
