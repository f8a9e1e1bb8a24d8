use super::{frame_count, Effect};
use crate::generator::ParameterPool;

/// Soft clipper `x / (1 + x^2)` on a pre-gained, hard-clamped input
#[inline]
fn distort(x: f32) -> f32 {
    x / (1.0 + x * x)
}

pub struct Distortion {
    params: ParameterPool,
}

impl Distortion {
    pub const DRY: usize = 0;
    pub const WET: usize = 1;
    /// Input gain, 1-10
    pub const GAIN: usize = 2;
    pub const NUM_PARAMS: usize = 3;

    pub fn new() -> Self {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::DRY].set_value(0.0, true);
        params[Self::WET].set_value(1.0, true);
        params[Self::GAIN].set_range(1.0, 10.0);
        params[Self::GAIN].set_value(1.0, true);
        Self { params }
    }

    fn smoothing(&self) -> bool {
        self.params[Self::DRY].is_smoothing()
            || self.params[Self::WET].is_smoothing()
            || self.params[Self::GAIN].is_smoothing()
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Distortion {
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = frame_count(in_l, in_r, out_l, out_r);
        let mut dry = self.params[Self::DRY].value();
        let mut wet = self.params[Self::WET].value();
        let mut gain = self.params[Self::GAIN].value();

        let mut i = 0;
        while i < frames && self.smoothing() {
            dry = self.params[Self::DRY].next_value();
            wet = self.params[Self::WET].next_value();
            gain = self.params[Self::GAIN].next_value();
            out_l[i] = dry * in_l[i] + wet * distort((in_l[i] * gain).clamp(-1.0, 1.0));
            out_r[i] = dry * in_r[i] + wet * distort((in_r[i] * gain).clamp(-1.0, 1.0));
            i += 1;
        }

        for i in i..frames {
            out_l[i] = dry * in_l[i] + wet * distort((in_l[i] * gain).clamp(-1.0, 1.0));
            out_r[i] = dry * in_r[i] + wet * distort((in_r[i] * gain).clamp(-1.0, 1.0));
        }
    }

    fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "distortion"
    }
}
