use super::{frame_count, Effect};
use crate::config::SAMPLE_RATE;
use crate::dsp::{BiquadSpec, BiquadState, BiquadType};
use crate::generator::ParameterPool;

/// Stereo resonant low-pass
///
/// While frequency or Q is moving, coefficients are recomputed every
/// sample; the rest of the block runs with the settled coefficients.
pub struct LowPass {
    params: ParameterPool,
    spec: BiquadSpec,
    filter_l: BiquadState,
    filter_r: BiquadState,
}

impl LowPass {
    /// Cutoff in Hz, 1-20000
    pub const FREQUENCY: usize = 0;
    pub const Q_FACTOR: usize = 1;
    pub const NUM_PARAMS: usize = 2;

    pub fn new() -> Self {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::FREQUENCY].set_range(1.0, 20_000.0);
        params[Self::FREQUENCY].set_value(15_000.0, true);
        // A zero Q has no valid design
        params[Self::Q_FACTOR].set_range(0.1, 10.0);
        params[Self::Q_FACTOR].set_value(0.7071, true);

        let spec = BiquadSpec::new(
            BiquadType::LowPass,
            SAMPLE_RATE,
            params[Self::FREQUENCY].value(),
            params[Self::Q_FACTOR].value(),
            0.0,
        );
        Self {
            params,
            spec,
            filter_l: BiquadState::default(),
            filter_r: BiquadState::default(),
        }
    }

    /// Coefficients currently in use
    pub fn spec(&self) -> &BiquadSpec {
        &self.spec
    }

    fn update_filter(&mut self, freq: f32, q: f32) {
        self.spec.freq = freq;
        self.spec.q = q;
        self.spec.update();
    }
}

impl Default for LowPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for LowPass {
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = frame_count(in_l, in_r, out_l, out_r);
        let mut i = 0;
        while i < frames
            && (self.params[Self::FREQUENCY].is_smoothing() || self.params[Self::Q_FACTOR].is_smoothing())
        {
            let f = self.params[Self::FREQUENCY].next_value();
            let q = self.params[Self::Q_FACTOR].next_value();
            self.update_filter(f, q);
            out_l[i] = self.filter_l.tick(&self.spec, in_l[i]);
            out_r[i] = self.filter_r.tick(&self.spec, in_r[i]);
            i += 1;
        }

        let (f, q) = (self.params[Self::FREQUENCY].value(), self.params[Self::Q_FACTOR].value());
        if f != self.spec.freq || q != self.spec.q {
            self.update_filter(f, q);
        }
        self.filter_l.process(&self.spec, &in_l[i..frames], &mut out_l[i..frames]);
        self.filter_r.process(&self.spec, &in_r[i..frames], &mut out_r[i..frames]);
    }

    fn reset(&mut self) {
        self.filter_l.reset();
        self.filter_r.reset();
    }

    fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "lowpass"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (TAU * freq * n as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_default_is_nearly_transparent() {
        let mut fx = LowPass::new();
        let input = tone(440.0, 4096);
        let mut out_l = vec![0.0f32; 4096];
        let mut out_r = vec![0.0f32; 4096];
        fx.process(&input, &input, &mut out_l, &mut out_r);
        assert!((peak(&out_l[2048..]) - 1.0).abs() < 0.02);
        assert_eq!(out_l, out_r);
    }

    #[test]
    fn test_cutoff_attenuates() {
        let mut fx = LowPass::new();
        fx.parameters_mut()[LowPass::FREQUENCY].set_value(500.0, true);
        let input = tone(8000.0, 4096);
        let mut out_l = vec![0.0f32; 4096];
        let mut out_r = vec![0.0f32; 4096];
        fx.process(&input, &input, &mut out_l, &mut out_r);
        assert!(peak(&out_l[2048..]) < 0.01);
    }

    #[test]
    fn test_smoothed_sweep_reaches_target() {
        let mut fx = LowPass::new();
        fx.parameters_mut()[LowPass::FREQUENCY].set_value(1000.0, false);
        let input = tone(100.0, 256);
        let mut out_l = vec![0.0f32; 256];
        let mut out_r = vec![0.0f32; 256];
        fx.process(&input, &input, &mut out_l, &mut out_r);
        assert!(!fx.parameters()[LowPass::FREQUENCY].is_smoothing());
        assert_eq!(fx.spec().freq, 1000.0);
        assert!(out_l.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_cutoff_change_returns_to_block_coefficients() {
        let mut fx = LowPass::new();
        let input = tone(100.0, 128);
        let mut out_l = vec![0.0f32; 128];
        let mut out_r = vec![0.0f32; 128];
        for target in [69.811, 1234.567, 19_876.5, 333.3] {
            fx.parameters_mut()[LowPass::FREQUENCY].set_value(target, false);
            let mut blocks = 0;
            while fx.parameters()[LowPass::FREQUENCY].is_smoothing() {
                fx.process(&input, &input, &mut out_l, &mut out_r);
                blocks += 1;
                assert!(blocks < 10, "cutoff {} still smoothing", target);
            }
            assert_eq!(fx.spec().freq, target);
        }
    }

    #[test]
    fn test_q_range_excludes_zero() {
        let mut fx = LowPass::new();
        fx.parameters_mut()[LowPass::Q_FACTOR].set_value(0.0, true);
        assert!(fx.parameters()[LowPass::Q_FACTOR].value() > 0.0);
    }
}
