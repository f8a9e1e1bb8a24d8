//! Lookup tables shared by every voice
//!
//! Tables are computed once per process. Call [`init`] during start-up,
//! before the first block is rendered, so that the render path never pays
//! for table construction. [`get`] falls back to lazy initialisation if
//! `init` was skipped.

use crate::config::SAMPLE_RATE;
use once_cell::sync::OnceCell;
use std::f32::consts::TAU;

/// Number of sine table entries covering one period
pub const SINE_SIZE: usize = 4096;

/// Number of MIDI notes / velocities
pub const MIDI_RANGE: usize = 128;

/// Process-wide immutable tables
pub struct Tables {
    /// One sine period plus a guard entry equal to the first
    pub sine: [f32; SINE_SIZE + 1],
    /// Phase increment per sample (in periods) for each MIDI note
    pub note_phase_inc: [f32; MIDI_RANGE],
    /// Velocity response curve, `(v / 127)^1.5`
    pub velocity_curve: [f32; MIDI_RANGE],
}

static TABLES: OnceCell<Tables> = OnceCell::new();

impl Tables {
    fn compute() -> Self {
        let mut sine = [0.0f32; SINE_SIZE + 1];
        for (i, s) in sine.iter_mut().enumerate().take(SINE_SIZE) {
            *s = (TAU * i as f32 / SINE_SIZE as f32).sin();
        }
        sine[SINE_SIZE] = sine[0];

        let mut note_phase_inc = [0.0f32; MIDI_RANGE];
        for (note, inc) in note_phase_inc.iter_mut().enumerate() {
            *inc = note_frequency(note as u8) / SAMPLE_RATE;
        }

        let mut velocity_curve = [0.0f32; MIDI_RANGE];
        for (v, c) in velocity_curve.iter_mut().enumerate() {
            *c = (v as f32 / 127.0).powf(1.5);
        }

        Self {
            sine,
            note_phase_inc,
            velocity_curve,
        }
    }
}

/// Build the tables. Idempotent.
pub fn init() {
    if TABLES.get().is_none() {
        log::debug!("Computing lookup tables ({} sine entries)", SINE_SIZE);
    }
    TABLES.get_or_init(Tables::compute);
}

/// Access the tables
pub fn get() -> &'static Tables {
    TABLES.get_or_init(Tables::compute)
}

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz
pub fn note_frequency(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

impl Tables {
    /// Sine of `phase` given in periods, `phase` in [0, 1)
    #[inline]
    pub fn sine(&self, phase: f32) -> f32 {
        let pos = phase * SINE_SIZE as f32;
        let k = (pos as usize).min(SINE_SIZE - 1);
        let frac = pos - k as f32;
        let a = self.sine[k];
        a + (self.sine[k + 1] - a) * frac
    }

    /// Phase increment for a MIDI note (values above 127 are masked)
    #[inline]
    pub fn phase_increment(&self, note: u8) -> f32 {
        self.note_phase_inc[(note & 0x7F) as usize]
    }

    /// Velocity curve lookup (values above 127 are masked)
    #[inline]
    pub fn velocity(&self, velocity: u8) -> f32 {
        self.velocity_curve[(velocity & 0x7F) as usize]
    }
}
