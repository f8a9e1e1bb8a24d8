//! Polyphonic instrument: voice pool, controls and effect chain
//!
//! The instrument turns decoded events into voice operations and mixes the
//! voices through its effect chain. Controller values are routed to
//! parameters through a fixed 128-entry table; the sustain pedal (CC 64) is
//! handled here rather than routed.

use crate::config::BLOCK_SIZE;
use crate::effects::{Effect, EffectChain, Reverb};
use crate::generator::{FmVoice, ParameterPool, Voice};
use crate::midi::{Event, CC_SUSTAIN_PEDAL, PITCH_BEND_CENTER};
use crate::pipeline::voice_pool::VoicePool;

/// Pedal values at or above this count as pressed
const PEDAL_THRESHOLD: u8 = 64;

pub struct Instrument<V: Voice, const P: usize> {
    voices: VoicePool<V, P>,
    params: ParameterPool,
    controllers: [Option<usize>; 128],
    pitch_bend: Option<usize>,
    /// One bit per key currently held down
    keys: u128,
    sustained: bool,
    effects: EffectChain,
    mix_l: Box<[f32]>,
    mix_r: Box<[f32]>,
}

impl<V: Voice, const P: usize> Instrument<V, P> {
    /// Create an instrument with the voice type's default controls
    pub fn new(effects: EffectChain) -> Self {
        let mut controllers = [None; 128];
        for &(cc, index) in V::controller_map() {
            controllers[(cc & 0x7F) as usize] = Some(index);
        }
        let params = V::parameters();
        log::debug!(
            "Instrument: {} voices, {} parameters, effects [{}]",
            P,
            params.len(),
            effects.names().join(" -> ")
        );
        Self {
            voices: VoicePool::new(),
            params,
            controllers,
            pitch_bend: V::pitch_bend_parameter(),
            keys: 0,
            sustained: false,
            effects,
            mix_l: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            mix_r: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
        }
    }

    /// Route controller `cc` to parameter `index`, replacing any previous route
    pub fn map_controller(&mut self, cc: u8, index: usize) {
        self.controllers[(cc & 0x7F) as usize] = Some(index);
    }

    /// Apply one decoded event
    ///
    /// Channel numbers are not filtered: every instrument listens to all
    /// channels.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::NoteOn { note, velocity: 0 } => self.note_off(note),
            Event::NoteOn { note, velocity } => self.note_on(note, velocity),
            Event::NoteOff { note, .. } => self.note_off(note),
            Event::ControlChange { controller, value } => self.control_change(controller, value),
            Event::PitchBend { value } => self.pitch_bend(value),
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        let note = note & 0x7F;
        self.keys |= 1u128 << note;
        self.voices.trigger(note, velocity);
    }

    /// Release `note`, or only mark it as lifted while the pedal is down
    pub fn note_off(&mut self, note: u8) {
        let note = note & 0x7F;
        self.keys &= !(1u128 << note);
        if self.sustained {
            return;
        }
        self.voices.release_key(note);
    }

    pub fn control_change(&mut self, controller: u8, value: u8) {
        let controller = controller & 0x7F;
        if controller == CC_SUSTAIN_PEDAL {
            self.set_sustain(value >= PEDAL_THRESHOLD);
            return;
        }
        match self.controllers[controller as usize] {
            Some(index) => self.params[index].set_normalized(value),
            None => log::trace!("Unmapped controller {}", controller),
        }
    }

    /// Store a 14-bit bend as [-1, 1] in the voice type's bend parameter
    pub fn pitch_bend(&mut self, value: u16) {
        if let Some(index) = self.pitch_bend {
            let bend = (value as f32 - PITCH_BEND_CENTER as f32) / PITCH_BEND_CENTER as f32;
            self.params[index].set_value(bend.clamp(-1.0, 1.0), false);
        }
    }

    fn set_sustain(&mut self, pressed: bool) {
        let was_sustained = self.sustained;
        self.sustained = pressed;
        if was_sustained && !pressed {
            let keys = self.keys;
            self.voices.release_where(|key| keys & (1u128 << (key & 0x7F)) == 0);
        }
    }

    /// Advance every parameter's smoothing by one step
    pub fn update_parameters(&mut self) {
        self.params.advance();
    }

    /// Render one block of voices through the effect chain into the outputs
    ///
    /// The outputs are overwritten. Blocks longer than [`BLOCK_SIZE`] are
    /// rendered in pieces.
    pub fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        let mut start = 0;
        while start < frames {
            let end = (start + BLOCK_SIZE).min(frames);
            let n = end - start;
            let mix_l = &mut self.mix_l[..n];
            let mix_r = &mut self.mix_r[..n];
            mix_l.fill(0.0);
            mix_r.fill(0.0);
            self.voices.render(&self.params, mix_l, mix_r);
            self.effects
                .process(mix_l, mix_r, &mut out_l[start..end], &mut out_r[start..end]);
            start = end;
        }
    }

    pub fn num_active_voices(&self) -> usize {
        self.voices.num_active_voices()
    }

    pub fn voices(&self) -> &VoicePool<V, P> {
        &self.voices
    }

    pub fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    pub fn effects_mut(&mut self) -> &mut EffectChain {
        &mut self.effects
    }

    /// True while the sustain pedal is down
    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    /// True while `note` is physically held
    pub fn is_key_down(&self, note: u8) -> bool {
        self.keys & (1u128 << (note & 0x7F)) != 0
    }
}

impl<const P: usize> Instrument<FmVoice, P> {
    /// FM instrument with its default reverb
    pub fn fm() -> Self {
        let mut reverb = Reverb::new();
        let params = reverb.parameters_mut();
        params[Reverb::DRY].set_value(1.0, true);
        params[Reverb::WET].set_value(0.4, true);
        params[Reverb::ROOM_SIZE].set_value(0.87, true);
        params[Reverb::WIDTH].set_value(1.0, true);
        params[Reverb::PITCH].set_value(1.0, true);
        params[Reverb::FEEDBACK].set_value(0.0, true);
        Self::new(EffectChain::with_effects(vec![Box::new(reverb)]))
    }

    /// FM instrument straight to the output
    pub fn fm_without_effects() -> Self {
        Self::new(EffectChain::new())
    }
}
