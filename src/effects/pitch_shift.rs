use super::{frame_count, Effect};
use crate::config::SAMPLE_RATE;
use crate::dsp::{BiquadSpec, BiquadState, BiquadType, DcBlockerSpec, DcBlockerState, DelayLine};
use crate::generator::ParameterPool;
use std::f32::consts::PI;

/// Length of the grain delay line in seconds
const MAX_DELAY: f32 = 0.035;
/// Anti-alias cutoff used when shifting down (or not at all)
const FILTER_OPEN_FREQ: f32 = 22_000.0;

/// Two-tap granular pitch shifter
///
/// Input is DC-blocked and low-passed into a short delay line. Two read taps
/// half a line apart sweep through it at `1 - pitch` samples per sample,
/// each weighted by a half-sine window of its position, and are crossfaded.
/// When shifting up, the low-pass cutoff tracks `0.5 * sample_rate / pitch`.
pub struct PitchShift {
    params: ParameterPool,
    filter_spec: BiquadSpec,
    filter_l: BiquadState,
    filter_r: BiquadState,
    dc_spec: DcBlockerSpec,
    dc_l: DcBlockerState,
    dc_r: DcBlockerState,
    delay_l: DelayLine,
    delay_r: DelayLine,
    tap_a: f32,
    tap_b: f32,
    window: f32,
    filter_pitch: f32,
}

impl PitchShift {
    pub const DRY: usize = 0;
    pub const WET: usize = 1;
    /// Frequency ratio, 0-4
    pub const PITCH: usize = 2;
    pub const NUM_PARAMS: usize = 3;

    pub fn new() -> Self {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::DRY].set_value(0.0, true);
        params[Self::WET].set_value(1.0, true);
        params[Self::PITCH].set_range(0.0, 4.0);
        params[Self::PITCH].set_value(1.0, true);

        let size = (SAMPLE_RATE * MAX_DELAY) as usize;
        let mut shifter = Self {
            params,
            filter_spec: BiquadSpec::new(BiquadType::LowPass, SAMPLE_RATE, FILTER_OPEN_FREQ, 0.7071, 0.0),
            filter_l: BiquadState::default(),
            filter_r: BiquadState::default(),
            dc_spec: DcBlockerSpec::default(),
            dc_l: DcBlockerState::default(),
            dc_r: DcBlockerState::default(),
            delay_l: DelayLine::new(size),
            delay_r: DelayLine::new(size),
            tap_a: 0.0,
            tap_b: 0.0,
            window: 0.0,
            filter_pitch: 1.0,
        };
        shifter.init_taps();
        shifter
    }

    /// Anti-alias cutoff currently applied
    pub fn filter_frequency(&self) -> f32 {
        self.filter_spec.freq
    }

    fn init_taps(&mut self) {
        let size = self.delay_l.size() as f32;
        self.tap_a = 0.0;
        self.tap_b = 0.5 * size;
        self.window = PI / size;
    }

    fn update_filter(&mut self) {
        let pitch = self.params[Self::PITCH].value();
        self.filter_spec.freq = if pitch > 1.0 {
            0.5 * self.filter_spec.sample_rate / pitch
        } else {
            FILTER_OPEN_FREQ
        };
        self.filter_spec.update();
        self.filter_pitch = pitch;
    }
}

impl Default for PitchShift {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn wrap_tap(tap: f32, size: f32) -> f32 {
    if tap < 0.0 {
        tap + size
    } else if tap > size {
        tap - size
    } else {
        tap
    }
}

impl Effect for PitchShift {
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        if self.params[Self::PITCH].is_smoothing() || self.params[Self::PITCH].value() != self.filter_pitch {
            self.update_filter();
        }

        let size = self.delay_l.size() as f32;
        for i in 0..frame_count(in_l, in_r, out_l, out_r) {
            let dry = self.params[Self::DRY].next_value();
            let wet = self.params[Self::WET].next_value();
            let step = 1.0 - self.params[Self::PITCH].next_value();

            let x = self.dc_l.tick(&self.dc_spec, in_l[i]);
            self.delay_l.write(self.filter_l.tick(&self.filter_spec, x));
            let x = self.dc_r.tick(&self.dc_spec, in_r[i]);
            self.delay_r.write(self.filter_r.tick(&self.filter_spec, x));

            let wa = (self.window * self.tap_a).sin();
            let wb = (self.window * self.tap_b).sin();
            let l = 0.5 * (self.delay_l.read(self.tap_a) * wa + self.delay_l.read(self.tap_b) * wb);
            let r = 0.5 * (self.delay_r.read(self.tap_a) * wa + self.delay_r.read(self.tap_b) * wb);

            self.tap_a = wrap_tap(self.tap_a + step, size);
            self.tap_b = wrap_tap(self.tap_b + step, size);

            out_l[i] = l * wet + in_l[i] * dry;
            out_r[i] = r * wet + in_r[i] * dry;
        }
    }

    fn reset(&mut self) {
        self.filter_l.reset();
        self.filter_r.reset();
        self.dc_l.reset();
        self.dc_r.reset();
        self.delay_l.reset();
        self.delay_r.reset();
        self.init_taps();
    }

    fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "pitch-shift"
    }
}
