//! Stereo effects built from the [`crate::dsp`] primitives
//!
//! Every effect owns a [`ParameterPool`] of smoothed controls addressed by
//! the associated index constants of the effect (`Delay::WET`, ...). While
//! a control is moving, effects advance it once per sample so sweeps stay
//! click-free; once everything has settled they fall back to block-constant
//! coefficients.

pub mod chain;
pub mod delay;
pub mod distortion;
pub mod lowpass;
pub mod pitch_shift;
pub mod reverb;

pub use chain::EffectChain;
pub use delay::Delay;
pub use distortion::Distortion;
pub use lowpass::LowPass;
pub use pitch_shift::PitchShift;
pub use reverb::Reverb;

use crate::generator::ParameterPool;

/// Uniform stereo processing contract
pub trait Effect: Send {
    /// Process `out_l.len()` frames from the inputs into the outputs
    ///
    /// All four slices have the same length. Outputs are overwritten.
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]);

    /// Clear internal history (delay lines, filter state)
    fn reset(&mut self) {}

    /// Controls of this effect
    fn parameters(&self) -> &ParameterPool;

    /// Mutable controls of this effect
    fn parameters_mut(&mut self) -> &mut ParameterPool;

    /// Short name used in log output
    fn name(&self) -> &'static str;
}

/// Number of frames all four buffers can supply
#[inline]
pub(crate) fn frame_count(in_l: &[f32], in_r: &[f32], out_l: &[f32], out_r: &[f32]) -> usize {
    in_l.len().min(in_r.len()).min(out_l.len()).min(out_r.len())
}
