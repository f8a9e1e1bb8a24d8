//! Freeverb-style mono reverb core

use super::allpass::{AllPassSpec, AllPassState};
use super::comb::{CombSpec, CombState};

/// Comb delay lengths in samples (at 44.1 kHz)
pub const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// All-pass delay lengths in samples (at 44.1 kHz)
pub const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
/// Length offset applied to the right channel to decorrelate the image
pub const STEREO_SPREAD: usize = 23;

const ALLPASS_FEEDBACK: f32 = 0.5;
const COMB_GAIN: f32 = 1.0 / COMB_TUNING.len() as f32;

/// Room controls and the comb/all-pass coefficients derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSpec {
    /// Comb feedback, [0, 1)
    pub room_size: f32,
    /// Comb damping, [0, 1]
    pub damp: f32,
    comb: CombSpec,
    all_pass: AllPassSpec,
}

impl ReverbSpec {
    pub fn new(room_size: f32, damp: f32) -> Self {
        let mut spec = Self {
            room_size,
            damp,
            comb: CombSpec::default(),
            all_pass: AllPassSpec::default(),
        };
        spec.update();
        spec
    }

    /// Propagate `room_size` and `damp` to the filter coefficients
    pub fn update(&mut self) {
        self.comb = CombSpec {
            feedback: self.room_size,
            damp: self.damp,
        };
        self.all_pass = AllPassSpec {
            feedback: ALLPASS_FEEDBACK,
        };
    }
}

impl Default for ReverbSpec {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Eight parallel combs into four series all-passes
#[derive(Debug, Clone)]
pub struct ReverbState {
    combs: [CombState; 8],
    all_passes: [AllPassState; 4],
}

impl ReverbState {
    /// Allocate the filter buffers, every length extended by `offset`
    pub fn new(offset: usize) -> Self {
        Self {
            combs: COMB_TUNING.map(|len| CombState::new(len + offset)),
            all_passes: ALLPASS_TUNING.map(|len| AllPassState::new(len + offset)),
        }
    }

    pub fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombState::reset);
        self.all_passes.iter_mut().for_each(AllPassState::reset);
    }

    #[inline]
    pub fn tick(&mut self, spec: &ReverbSpec, x: f32) -> f32 {
        let mut y = 0.0;
        for comb in self.combs.iter_mut() {
            y += comb.tick(&spec.comb, x);
        }
        y *= COMB_GAIN;
        for all_pass in self.all_passes.iter_mut() {
            y = all_pass.tick(&spec.all_pass, y);
        }
        y
    }

    pub fn process(&mut self, spec: &ReverbSpec, input: &[f32], output: &mut [f32]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.tick(spec, x);
        }
    }

    /// Delay lengths of the combs
    pub fn comb_lengths(&self) -> [usize; 8] {
        let mut lengths = [0; 8];
        for (len, comb) in lengths.iter_mut().zip(self.combs.iter()) {
            *len = comb.len();
        }
        lengths
    }
}
