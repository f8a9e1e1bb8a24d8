//! Filter and delay building blocks
//!
//! Each primitive is split into a *spec* holding derived coefficients and a
//! *state* holding per-channel history. A spec is recomputed only when one of
//! its controls changes and may be shared by both channels; a state is never
//! shared, so stereo processing always uses two state instances.

pub mod allpass;
pub mod biquad;
pub mod comb;
pub mod dc_blocker;
pub mod delay_line;
pub mod reverb;

pub use allpass::{AllPassSpec, AllPassState};
pub use biquad::{BiquadSpec, BiquadState, BiquadType};
pub use comb::{CombSpec, CombState};
pub use dc_blocker::{DcBlockerSpec, DcBlockerState};
pub use delay_line::DelayLine;
pub use reverb::{ReverbSpec, ReverbState, STEREO_SPREAD};

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, frac: f32) -> f32 {
    a + (b - a) * frac
}
