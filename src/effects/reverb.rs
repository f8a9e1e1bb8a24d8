use super::pitch_shift::PitchShift;
use super::{frame_count, Effect};
use crate::config::BLOCK_SIZE;
use crate::dsp::{ReverbSpec, ReverbState, STEREO_SPREAD};
use crate::generator::ParameterPool;

/// Stereo Freeverb with an optional shimmer loop
///
/// With `FEEDBACK > 0` and `PITCH != 1` the previous block's wet signal is
/// pitch-shifted, scaled by the feedback and added to the input before it
/// enters the reverb, which builds the rising "shimmer" tail. Otherwise the
/// input goes straight into the reverb.
///
/// Width blends the channels:
/// ```text
/// wet1 = wet * (0.5 * width + 0.5)
/// wet2 = wet * 0.5 * (1 - width)
/// out_l = wet1 * rev_l + wet2 * rev_r + dry * in_l
/// ```
pub struct Reverb {
    params: ParameterPool,
    spec: ReverbSpec,
    left: ReverbState,
    right: ReverbState,
    wet_l: Box<[f32]>,
    wet_r: Box<[f32]>,
    shimmer_l: Box<[f32]>,
    shimmer_r: Box<[f32]>,
    pitch_shift: PitchShift,
}

impl Reverb {
    pub const DRY: usize = 0;
    pub const WET: usize = 1;
    pub const ROOM_SIZE: usize = 2;
    pub const DAMP: usize = 3;
    pub const WIDTH: usize = 4;
    /// Shimmer pitch ratio, 0-2
    pub const PITCH: usize = 5;
    /// Shimmer feedback, 0-1
    pub const FEEDBACK: usize = 6;
    pub const NUM_PARAMS: usize = 7;

    pub const DEFAULT_DRY: f32 = 0.8;
    pub const DEFAULT_WET: f32 = 0.4;
    pub const DEFAULT_ROOM_SIZE: f32 = 0.98;
    pub const DEFAULT_DAMP: f32 = 0.2;
    pub const DEFAULT_WIDTH: f32 = 1.0;
    pub const DEFAULT_PITCH: f32 = 2.0;
    pub const DEFAULT_FEEDBACK: f32 = 0.02;

    pub fn new() -> Self {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::DRY].set_value_with_smoothing(Self::DEFAULT_DRY, 0.5, true);
        params[Self::WET].set_value_with_smoothing(Self::DEFAULT_WET, 0.5, true);
        params[Self::ROOM_SIZE].set_value_with_smoothing(Self::DEFAULT_ROOM_SIZE, 0.5, true);
        params[Self::DAMP].set_value_with_smoothing(Self::DEFAULT_DAMP, 0.5, true);
        params[Self::WIDTH].set_value_with_smoothing(Self::DEFAULT_WIDTH, 0.5, true);
        params[Self::PITCH].set_range(0.0, 2.0);
        params[Self::PITCH].set_value_with_smoothing(Self::DEFAULT_PITCH, 0.5, true);
        params[Self::FEEDBACK].set_value_with_smoothing(Self::DEFAULT_FEEDBACK, 0.5, true);

        let mut pitch_shift = PitchShift::new();
        pitch_shift.parameters_mut()[PitchShift::DRY].set_value(0.0, true);
        pitch_shift.parameters_mut()[PitchShift::WET].set_value(1.0, true);
        pitch_shift.parameters_mut()[PitchShift::PITCH].set_value(Self::DEFAULT_PITCH, true);

        Self {
            params,
            spec: ReverbSpec::new(Self::DEFAULT_ROOM_SIZE, Self::DEFAULT_DAMP),
            left: ReverbState::new(0),
            right: ReverbState::new(STEREO_SPREAD),
            wet_l: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            wet_r: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            shimmer_l: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            shimmer_r: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            pitch_shift,
        }
    }

    /// True if the next block runs through the shimmer loop
    pub fn is_shimmering(&self) -> bool {
        self.params[Self::FEEDBACK].value() > 0.0 && self.params[Self::PITCH].value() != 1.0
    }

    fn update_spec(&mut self) {
        self.spec.room_size = self.params[Self::ROOM_SIZE].target();
        self.spec.damp = self.params[Self::DAMP].target();
        self.spec.update();
    }

    fn process_block(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let n = out_l.len();
        let shimmering = self.is_shimmering();
        let feedback = self.params[Self::FEEDBACK].value();
        let pitch = self.params[Self::PITCH].value();
        let wet_l = &mut self.wet_l[..n];
        let wet_r = &mut self.wet_r[..n];

        if shimmering {
            let shimmer_l = &mut self.shimmer_l[..n];
            let shimmer_r = &mut self.shimmer_r[..n];
            self.pitch_shift.parameters_mut()[PitchShift::PITCH].set_value(pitch, true);
            self.pitch_shift.process(wet_l, wet_r, shimmer_l, shimmer_r);
            for i in 0..n {
                shimmer_l[i] = in_l[i] + feedback * shimmer_l[i];
                shimmer_r[i] = in_r[i] + feedback * shimmer_r[i];
            }
            self.left.process(&self.spec, shimmer_l, wet_l);
            self.right.process(&self.spec, shimmer_r, wet_r);
        } else {
            self.left.process(&self.spec, in_l, wet_l);
            self.right.process(&self.spec, in_r, wet_r);
        }

        for i in 0..n {
            self.params[Self::PITCH].next_value();
            self.params[Self::FEEDBACK].next_value();
            let width = self.params[Self::WIDTH].next_value();
            let dry = self.params[Self::DRY].next_value();
            let wet = self.params[Self::WET].next_value();
            let wet1 = wet * (0.5 * width + 0.5);
            let wet2 = wet * 0.5 * (1.0 - width);

            out_l[i] = wet_l[i] * wet1 + wet_r[i] * wet2 + in_l[i] * dry;
            out_r[i] = wet_r[i] * wet1 + wet_l[i] * wet2 + in_r[i] * dry;
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Reverb {
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        self.update_spec();
        let frames = frame_count(in_l, in_r, out_l, out_r);
        let mut start = 0;
        while start < frames {
            let end = (start + BLOCK_SIZE).min(frames);
            self.process_block(
                &in_l[start..end],
                &in_r[start..end],
                &mut out_l[start..end],
                &mut out_r[start..end],
            );
            start = end;
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.wet_l.fill(0.0);
        self.wet_r.fill(0.0);
        self.pitch_shift.reset();
    }

    fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "reverb"
    }
}
