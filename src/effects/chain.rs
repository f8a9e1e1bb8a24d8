use super::{frame_count, Effect};
use crate::config::BLOCK_SIZE;

/// Ordered series of effects with pre-allocated scratch buffers
///
/// With two or more effects the chain ping-pongs between the caller's
/// output buffers and an internal scratch pair. Buffer roles are chosen from
/// the parity of the effect count so the last effect always writes straight
/// into the caller's output.
///
/// # Example
/// ```
/// use fmsynth::effects::{Distortion, EffectChain, LowPass};
///
/// let mut chain = EffectChain::new();
/// chain.push(Box::new(Distortion::new()));
/// chain.push(Box::new(LowPass::new()));
///
/// let input = [0.25f32; 64];
/// let mut out_l = [0.0f32; 64];
/// let mut out_r = [0.0f32; 64];
/// chain.process(&input, &input, &mut out_l, &mut out_r);
/// ```
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    mix_l: Box<[f32]>,
    mix_r: Box<[f32]>,
    input_l: Box<[f32]>,
    input_r: Box<[f32]>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::with_effects(Vec::new())
    }

    pub fn with_effects(effects: Vec<Box<dyn Effect>>) -> Self {
        let chain = Self {
            effects,
            mix_l: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            mix_r: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            input_l: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            input_r: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
        };
        log::debug!("Effect chain: [{}]", chain.names().join(" -> "));
        chain
    }

    /// Append an effect at the end of the chain
    ///
    /// Allocates; build the chain before rendering starts.
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        log::debug!("Effect chain: appending {}", effect.name());
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Effect>> {
        self.effects.get_mut(index)
    }

    /// Effect names in processing order
    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    /// Clear the history of every effect
    pub fn reset(&mut self) {
        for effect in self.effects.iter_mut() {
            effect.reset();
        }
    }

    /// Run the chain from the inputs into the outputs
    ///
    /// With no effects the input is copied through unchanged.
    pub fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = frame_count(in_l, in_r, out_l, out_r);
        let mut start = 0;
        while start < frames {
            let end = (start + BLOCK_SIZE).min(frames);
            let n = end - start;
            process_block(
                &mut self.effects,
                &mut self.mix_l[..n],
                &mut self.mix_r[..n],
                &in_l[start..end],
                &in_r[start..end],
                &mut out_l[start..end],
                &mut out_r[start..end],
            );
            start = end;
        }
    }

    /// Run the chain over a buffer pair that is both input and output
    pub fn process_in_place(&mut self, left: &mut [f32], right: &mut [f32]) {
        if self.effects.is_empty() {
            return;
        }
        let frames = left.len().min(right.len());
        let mut start = 0;
        while start < frames {
            let end = (start + BLOCK_SIZE).min(frames);
            let n = end - start;
            self.input_l[..n].copy_from_slice(&left[start..end]);
            self.input_r[..n].copy_from_slice(&right[start..end]);
            process_block(
                &mut self.effects,
                &mut self.mix_l[..n],
                &mut self.mix_r[..n],
                &self.input_l[..n],
                &self.input_r[..n],
                &mut left[start..end],
                &mut right[start..end],
            );
            start = end;
        }
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

/// One block through every effect; all slices have the same length
fn process_block(
    effects: &mut [Box<dyn Effect>],
    mix_l: &mut [f32],
    mix_r: &mut [f32],
    in_l: &[f32],
    in_r: &[f32],
    out_l: &mut [f32],
    out_r: &mut [f32],
) {
    let count = effects.len();
    match count {
        0 => {
            out_l.copy_from_slice(in_l);
            out_r.copy_from_slice(in_r);
        }
        1 => effects[0].process(in_l, in_r, out_l, out_r),
        _ => {
            for (i, effect) in effects.iter_mut().enumerate() {
                // Odd counts start on the output pair, even counts on scratch
                let to_out = (i % 2 == 0) == (count % 2 == 1);
                match (i, to_out) {
                    (0, true) => effect.process(in_l, in_r, out_l, out_r),
                    (0, false) => effect.process(in_l, in_r, mix_l, mix_r),
                    (_, true) => effect.process(mix_l, mix_r, out_l, out_r),
                    (_, false) => effect.process(out_l, out_r, mix_l, mix_r),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Delay, Distortion, LowPass};
    use crate::config::SAMPLE_RATE;
    use approx::assert_abs_diff_eq;

    fn signal(len: usize) -> Vec<f32> {
        (0..len).map(|n| 0.8 * (n as f32 * 0.031).sin()).collect()
    }

    fn distortion() -> Box<dyn Effect> {
        let mut fx = Distortion::new();
        fx.parameters_mut()[Distortion::GAIN].set_value(4.0, true);
        Box::new(fx)
    }

    fn lowpass() -> Box<dyn Effect> {
        let mut fx = LowPass::new();
        fx.parameters_mut()[LowPass::FREQUENCY].set_value(2000.0, true);
        Box::new(fx)
    }

    fn delay() -> Box<dyn Effect> {
        let mut fx = Delay::new();
        fx.parameters_mut()[Delay::DELAY].set_value(50.0 / SAMPLE_RATE, true);
        Box::new(fx)
    }

    /// Apply each effect as a separate call into fresh buffers
    fn sequential(mut effects: Vec<Box<dyn Effect>>, input: &[f32]) -> Vec<f32> {
        let mut l = input.to_vec();
        let mut r = input.to_vec();
        for effect in effects.iter_mut() {
            let mut out_l = vec![0.0f32; input.len()];
            let mut out_r = vec![0.0f32; input.len()];
            effect.process(&l, &r, &mut out_l, &mut out_r);
            l = out_l;
            r = out_r;
        }
        l
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = EffectChain::new();
        let input = signal(300);

        let mut out_l = vec![0.0f32; 300];
        let mut out_r = vec![0.0f32; 300];
        chain.process(&input, &input, &mut out_l, &mut out_r);
        assert_eq!(out_l, input, "copy through");

        let mut l = input.clone();
        let mut r = input.clone();
        chain.process_in_place(&mut l, &mut r);
        assert_eq!(l, input, "in place");
    }

    #[test]
    fn test_single_effect_matches_direct_call() {
        let input = signal(300);
        let expected = sequential(vec![distortion()], &input);

        let mut chain = EffectChain::with_effects(vec![distortion()]);
        let mut out_l = vec![0.0f32; 300];
        let mut out_r = vec![0.0f32; 300];
        chain.process(&input, &input, &mut out_l, &mut out_r);
        assert_eq!(out_l, expected);
    }

    #[test]
    fn test_chain_matches_sequential_composition() {
        let input = signal(1000);
        for count in 2..=3 {
            let build = || -> Vec<Box<dyn Effect>> {
                let mut effects = vec![distortion(), lowpass()];
                if count == 3 {
                    effects.push(delay());
                }
                effects
            };
            let expected = sequential(build(), &input);

            let mut chain = EffectChain::with_effects(build());
            let mut out_l = vec![0.0f32; 1000];
            let mut out_r = vec![0.0f32; 1000];
            chain.process(&input, &input, &mut out_l, &mut out_r);
            for (a, b) in out_l.iter().zip(expected.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-5);
            }
            assert_eq!(out_l, out_r, "{} effects: channels diverged", count);
        }
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let input = signal(500);
        let mut a = EffectChain::with_effects(vec![distortion(), lowpass(), delay()]);
        let mut b = EffectChain::with_effects(vec![distortion(), lowpass(), delay()]);

        let mut out_l = vec![0.0f32; 500];
        let mut out_r = vec![0.0f32; 500];
        a.process(&input, &input, &mut out_l, &mut out_r);

        let mut l = input.clone();
        let mut r = input.clone();
        b.process_in_place(&mut l, &mut r);
        assert_eq!(l, out_l);
    }

    #[test]
    fn test_reset_and_names() {
        let mut chain = EffectChain::new();
        chain.push(delay());
        chain.push(distortion());
        assert_eq!(chain.names(), vec!["delay", "distortion"]);
        assert_eq!(chain.len(), 2);

        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        let mut l = impulse.clone();
        let mut r = impulse;
        chain.process_in_place(&mut l, &mut r);
        chain.reset();

        let mut l = vec![0.0f32; 256];
        let mut r = vec![0.0f32; 256];
        chain.process_in_place(&mut l, &mut r);
        assert!(l.iter().all(|&s| s == 0.0), "echo survived reset");
    }
}
