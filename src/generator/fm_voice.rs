use super::envelope::{Envelope, EnvelopeSpec};
use super::parameter::{Parameter, ParameterPool};
use super::{GeneratorState, Voice};
use crate::config::SAMPLE_RATE_R;
use crate::midi::CC_MODULATION;
use crate::tables::{self, Tables};

/// Vibrato LFO frequency in Hz
const MODULATION_FREQUENCY: f32 = 7.0;
/// Phase deviation of the vibrato LFO at full modulation
const MODULATION_DEPTH: f32 = 2e-4;
/// Modulation index scale shared by the operator pairs
const TONE_SCALE: f32 = 1.0 / 128.0;
/// Pitch bend range in semitones
const BEND_SEMITONES: f32 = 2.0;

const NUM_OPS: usize = 6;

/// Carrier pan weights (left, right) for the three operator pairs
const PAN: [(f32, f32); 3] = [(0.04, 0.06), (0.06, 0.04), (0.01, 0.01)];

/// Fixed modulator envelopes, prepared once and re-triggered per note
const MODULATOR_ENVELOPES: [EnvelopeSpec; 3] = [
    EnvelopeSpec::new(0.0, 6.0, 0.2, 0.5),
    EnvelopeSpec::new(0.0, 4.0, 0.3, 0.5),
    EnvelopeSpec::new(0.0, 1.0, 0.0, 0.0),
];

/// Modulator frequency ratios for the three pairs
const MODULATOR_RATIOS: [f32; 3] = [14.0, 1.0, 1.0];

/// Sine oscillator with its own amplitude envelope
#[derive(Default)]
pub struct FmOperator {
    /// Phase in periods, always in [0, 1)
    pub phase: f32,
    /// Phase increment per sample in periods
    pub phase_inc: f32,
    /// Amplitude envelope
    pub env: Envelope,
    /// Last output sample
    pub value: f32,
}

impl FmOperator {
    /// Advance by `phase_inc + pmod` and return the enveloped sine
    #[inline]
    pub fn tick(&mut self, tables: &Tables, pmod: f32) -> f32 {
        self.phase = wrap_phase(self.phase + self.phase_inc + pmod);
        self.value = self.env.next() * tables.sine(self.phase);
        self.value
    }
}

/// Wrap a phase into [0, 1)
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // floor() of a tiny negative number can round the result up to 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Six-operator FM voice
///
/// Operators form three carrier/modulator pairs:
/// ```text
/// a = op0(tone * op1(14x) + lfo)
/// b = op2(tone * op3(1x)  + lfo)
/// c = op4(tone * op5(1x, self-feedback))
/// ```
/// `tone` is the TONE parameter scaled to a modulation index and `lfo` a 7 Hz
/// vibrato scaled by MODULATION. Carriers are panned to stereo with fixed
/// weights and the sum is scaled by a velocity-dependent gain. The voice is
/// done once all three carrier envelopes are off.
pub struct FmVoice {
    key: u8,
    velocity: u8,
    gain: f32,
    mod_phase: f32,
    base_inc: [f32; NUM_OPS],
    ops: [FmOperator; NUM_OPS],
}

impl FmVoice {
    /// Mod wheel depth of the vibrato LFO
    pub const MODULATION: usize = 0;
    /// Modulation index of the operator pairs
    pub const TONE: usize = 1;
    /// Normalised pitch bend, [-1, 1]
    pub const PITCH_BEND: usize = 2;
    pub const NUM_PARAMS: usize = 3;

    /// Controller routing: CC1 to MODULATION, CC16 to TONE
    pub const CONTROLLERS: [(u8, usize); 2] = [(CC_MODULATION, Self::MODULATION), (16, Self::TONE)];

    pub fn new() -> Self {
        let mut ops: [FmOperator; NUM_OPS] = Default::default();
        for (pair, spec) in MODULATOR_ENVELOPES.iter().enumerate() {
            ops[2 * pair + 1].env.prepare(spec);
        }
        Self {
            key: 0,
            velocity: 0,
            gain: 0.0,
            mod_phase: 0.0,
            base_inc: [0.0; NUM_OPS],
            ops,
        }
    }

    /// Velocity this voice was last triggered with
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Output gain derived from the trigger velocity
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Operator `index` (0-5); even indices are carriers
    pub fn operator(&self, index: usize) -> &FmOperator {
        &self.ops[index]
    }

    /// Level of the first carrier envelope
    pub fn envelope_level(&self) -> f32 {
        self.ops[0].env.level()
    }
}

impl Default for FmVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for FmVoice {
    fn trigger(&mut self, key: u8, velocity: u8) {
        let tables = tables::get();
        self.key = key;
        self.velocity = velocity;
        self.gain = 0.2 + 0.8 * tables.velocity(velocity);
        self.mod_phase = 0.0;

        let v = (velocity & 0x7F) as f32 / 127.0;
        let attack = 0.1 / (1.0 + 500.0 * v);
        let decay = 3.0 + 7.0 * v;
        let carriers = [
            EnvelopeSpec::new(attack, 0.5 * decay, 0.0, 0.25),
            EnvelopeSpec::new(attack, decay, 0.0, 0.25),
            EnvelopeSpec::new(attack, 3.0, 0.0, 0.25),
        ];

        let dp = tables.phase_increment(key);
        for pair in 0..3 {
            let carrier = 2 * pair;
            let modulator = carrier + 1;
            self.base_inc[carrier] = dp;
            self.base_inc[modulator] = MODULATOR_RATIOS[pair] * dp;
            self.ops[carrier].env.trigger(&carriers[pair]);
            self.ops[modulator].env.retrigger();
        }
    }

    fn release(&mut self) {
        for op in self.ops.iter_mut() {
            op.env.release();
        }
    }

    fn reset(&mut self) {
        for op in self.ops.iter_mut() {
            op.phase = 0.0;
            op.value = 0.0;
        }
        self.mod_phase = 0.0;
    }

    fn render(
        &mut self,
        params: &ParameterPool,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> GeneratorState {
        let tables = tables::get();
        let tone = 2.0 * TONE_SCALE * params.value(Self::TONE);
        let modulation = MODULATION_DEPTH * params.value(Self::MODULATION);

        let bend = 2f32.powf(params.value(Self::PITCH_BEND) * BEND_SEMITONES / 12.0);
        for (op, inc) in self.ops.iter_mut().zip(self.base_inc.iter()) {
            op.phase_inc = inc * bend;
        }

        let mod_inc = MODULATION_FREQUENCY * SAMPLE_RATE_R;
        for (l, r) in out_l.iter_mut().zip(out_r.iter_mut()) {
            let lfo = modulation * tables.sine(self.mod_phase);

            let m = self.ops[1].tick(tables, 0.0);
            let a = self.ops[0].tick(tables, tone * m + lfo);
            let m = self.ops[3].tick(tables, 0.0);
            let b = self.ops[2].tick(tables, tone * m + lfo);
            let feedback = TONE_SCALE * self.ops[5].value;
            let m = self.ops[5].tick(tables, feedback);
            let c = self.ops[4].tick(tables, tone * m);

            self.mod_phase = wrap_phase(self.mod_phase + mod_inc);

            *l += (PAN[0].0 * a + PAN[1].0 * b + PAN[2].0 * c) * self.gain;
            *r += (PAN[0].1 * a + PAN[1].1 * b + PAN[2].1 * c) * self.gain;
        }

        if self.should_recycle() {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn should_recycle(&self) -> bool {
        self.ops[0].env.is_off() && self.ops[2].env.is_off() && self.ops[4].env.is_off()
    }

    fn key(&self) -> u8 {
        self.key
    }

    fn parameters() -> ParameterPool {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::MODULATION].set_value(0.0, true);
        params[Self::TONE].set_value(0.5, true);
        params[Self::PITCH_BEND] = Parameter::new(0.0, -1.0, 1.0, Parameter::DEFAULT_SMOOTHING);
        params
    }

    fn controller_map() -> &'static [(u8, usize)] {
        &Self::CONTROLLERS
    }

    fn pitch_bend_parameter() -> Option<usize> {
        Some(Self::PITCH_BEND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BLOCK_SIZE, SAMPLE_RATE};
    use crate::generator::EnvelopeState;

    fn render_block(voice: &mut FmVoice, params: &ParameterPool) -> (Vec<f32>, Vec<f32>, GeneratorState) {
        let mut l = vec![0.0f32; BLOCK_SIZE];
        let mut r = vec![0.0f32; BLOCK_SIZE];
        let state = voice.render(params, &mut l, &mut r);
        (l, r, state)
    }

    fn energy(buffer: &[f32]) -> f32 {
        buffer.iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_new_voice_is_recyclable() {
        let voice = FmVoice::new();
        assert!(voice.should_recycle());
        // Modulators are prepared but idle
        assert_eq!(voice.operator(1).env.state(), EnvelopeState::Off);
    }

    #[test]
    fn test_trigger_sounds_within_one_block() {
        let params = FmVoice::parameters();
        let mut voice = FmVoice::new();
        voice.trigger(60, 100);
        assert_eq!(voice.key(), 60);
        assert!(!voice.should_recycle());

        let (l, r, state) = render_block(&mut voice, &params);
        assert_eq!(state, GeneratorState::Running);
        assert!(energy(&l) > 0.0, "left channel silent");
        assert!(energy(&r) > 0.0, "right channel silent");
    }

    #[test]
    fn test_render_adds_into_bus() {
        let params = FmVoice::parameters();
        let mut a = FmVoice::new();
        let mut b = FmVoice::new();
        a.trigger(64, 90);
        b.trigger(64, 90);

        let (single, _, _) = render_block(&mut a, &params);
        let mut l = vec![0.5f32; BLOCK_SIZE];
        let mut r = vec![0.0f32; BLOCK_SIZE];
        b.render(&params, &mut l, &mut r);
        for (mixed, alone) in l.iter().zip(single.iter()) {
            assert!((mixed - 0.5 - alone).abs() < 1e-6);
        }
    }

    #[test]
    fn test_output_bounded() {
        let mut params = FmVoice::parameters();
        params[FmVoice::TONE].set_value(1.0, true);
        params[FmVoice::MODULATION].set_value(1.0, true);
        let mut voice = FmVoice::new();
        voice.trigger(100, 127);

        for _ in 0..200 {
            let (l, r, _) = render_block(&mut voice, &params);
            for s in l.iter().chain(r.iter()) {
                assert!(s.abs() <= 0.11 + 1e-4, "sample {} out of bounds", s);
            }
        }
        for op in 0..6 {
            let phase = voice.operator(op).phase;
            assert!((0.0..1.0).contains(&phase), "phase {} not wrapped", phase);
        }
    }

    #[test]
    fn test_velocity_scales_gain_and_attack() {
        let mut soft = FmVoice::new();
        let mut hard = FmVoice::new();
        soft.trigger(60, 1);
        hard.trigger(60, 127);
        assert!(hard.gain() > soft.gain());
        assert!((hard.gain() - 1.0).abs() < 1e-6);
        assert!((soft.gain() - 0.2).abs() < 0.01);

        let params = FmVoice::parameters();
        render_block(&mut soft, &params);
        render_block(&mut hard, &params);
        assert!(hard.envelope_level() > soft.envelope_level());
    }

    #[test]
    fn test_release_until_recycle() {
        let params = FmVoice::parameters();
        let mut voice = FmVoice::new();
        voice.trigger(69, 100);
        render_block(&mut voice, &params);
        voice.release();

        // Carrier release is 0.25s; allow a full second
        let max_blocks = (SAMPLE_RATE as usize) / BLOCK_SIZE;
        let mut finished = false;
        for _ in 0..max_blocks {
            let (_, _, state) = render_block(&mut voice, &params);
            if state == GeneratorState::Complete {
                finished = true;
                break;
            }
        }
        assert!(finished, "voice never became recyclable");
        assert!(voice.should_recycle());

        let (l, r, _) = render_block(&mut voice, &params);
        assert_eq!(energy(&l) + energy(&r), 0.0);
    }

    #[test]
    fn test_reset_clears_phases() {
        let params = FmVoice::parameters();
        let mut voice = FmVoice::new();
        voice.trigger(72, 100);
        render_block(&mut voice, &params);
        voice.reset();
        for op in 0..6 {
            assert_eq!(voice.operator(op).phase, 0.0);
            assert_eq!(voice.operator(op).value, 0.0);
        }
    }

    #[test]
    fn test_pitch_bend_scales_increments() {
        let mut params = FmVoice::parameters();
        let mut voice = FmVoice::new();
        voice.trigger(69, 100);
        render_block(&mut voice, &params);
        let centre = voice.operator(0).phase_inc;

        params[FmVoice::PITCH_BEND].set_value(1.0, true);
        render_block(&mut voice, &params);
        let up = voice.operator(0).phase_inc;
        let expected = centre * 2f32.powf(2.0 / 12.0);
        assert!((up - expected).abs() < 1e-7);
        assert!((centre - 440.0 / SAMPLE_RATE).abs() < 1e-6);
    }

    #[test]
    fn test_default_parameters() {
        let params = FmVoice::parameters();
        assert_eq!(params.len(), FmVoice::NUM_PARAMS);
        assert_eq!(params.value(FmVoice::TONE), 0.5);
        assert_eq!(params.value(FmVoice::MODULATION), 0.0);
        assert_eq!(params[FmVoice::PITCH_BEND].min(), -1.0);
        assert_eq!(FmVoice::pitch_bend_parameter(), Some(FmVoice::PITCH_BEND));
    }

    #[test]
    fn test_every_parameter_shapes_output() {
        let render_with = |params: &ParameterPool| {
            let mut voice = FmVoice::new();
            voice.trigger(60, 100);
            let mut out = Vec::new();
            for _ in 0..4 {
                let (l, _, _) = render_block(&mut voice, params);
                out.extend(l);
            }
            out
        };

        let defaults = FmVoice::parameters();
        let reference = render_with(&defaults);
        for index in 0..FmVoice::NUM_PARAMS {
            let mut params = FmVoice::parameters();
            let max = params[index].max();
            params[index].set_value(max, true);
            assert_ne!(render_with(&params), reference, "parameter {} has no effect", index);
        }
    }

    #[test]
    fn test_wrap_phase() {
        assert_eq!(wrap_phase(0.25), 0.25);
        assert!((wrap_phase(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_phase(-0.25) - 0.75).abs() < 1e-6);
        assert_eq!(wrap_phase(-1e-12), 0.0);
    }
}
