use super::{GeneratorState, SignalGenerator};
use crate::config::SAMPLE_RATE;

/// Target overshoot ratio for the attack segment
pub const ATTACK_TARGET_RATIO: f32 = 0.3;
/// Target undershoot ratio for the decay and release segments
pub const DECAY_RELEASE_TARGET_RATIO: f32 = 0.0001;

/// Stage times (seconds) and sustain level of an envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSpec {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeSpec {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Exponential-segment envelope coefficients
#[derive(Debug, Clone, Copy, Default)]
struct Segment {
    coef: f32,
    base: f32,
}

/// ADSR envelope with exponential segments
///
/// Each segment follows `level = base + level * coef`, an exponential
/// approaching a target slightly beyond the segment end so the end is hit in
/// finite time:
/// 1. Attack: from the current level towards 1.3, clamped at 1.0
/// 2. Decay: from 1.0 towards `sustain - 0.0001`, clamped at the sustain level
/// 3. Sustain: holds until released (skipped when the sustain level is 0)
/// 4. Release: towards -0.0001, clamped at 0.0, then Off
///
/// Segment lengths in samples equal the stage time times the sample rate.
pub struct Envelope {
    sample_rate: f32,
    spec: EnvelopeSpec,
    state: EnvelopeState,
    level: f32,
    attack: Segment,
    decay: Segment,
    release: Segment,
}

impl Envelope {
    /// Create an idle envelope running at the engine sample rate
    pub fn new() -> Self {
        Self::with_sample_rate(SAMPLE_RATE)
    }

    /// Create an idle envelope for a custom sample rate
    ///
    /// # Example
    /// ```
    /// use fmsynth::generator::envelope::{Envelope, EnvelopeSpec, EnvelopeState};
    ///
    /// let mut env = Envelope::with_sample_rate(16_000.0);
    /// env.trigger(&EnvelopeSpec::new(0.01, 0.2, 0.5, 0.3));
    /// assert_eq!(env.state(), EnvelopeState::Attack);
    /// assert!(env.next() > 0.0);
    /// ```
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            spec: EnvelopeSpec::default(),
            state: EnvelopeState::Off,
            level: 0.0,
            attack: Segment::default(),
            decay: Segment::default(),
            release: Segment::default(),
        }
    }

    /// Store `spec` and compute its coefficients without starting
    pub fn prepare(&mut self, spec: &EnvelopeSpec) {
        self.spec = *spec;
        let sustain = spec.sustain.clamp(0.0, 1.0);
        self.spec.sustain = sustain;

        let coef = coefficient(spec.attack * self.sample_rate, ATTACK_TARGET_RATIO);
        self.attack = Segment {
            coef,
            base: (1.0 + ATTACK_TARGET_RATIO) * (1.0 - coef),
        };

        let coef = coefficient(spec.decay * self.sample_rate, DECAY_RELEASE_TARGET_RATIO);
        self.decay = Segment {
            coef,
            base: (sustain - DECAY_RELEASE_TARGET_RATIO) * (1.0 - coef),
        };

        self.set_release_time(spec.release);
    }

    /// Prepare `spec` and start the attack from level 0
    pub fn trigger(&mut self, spec: &EnvelopeSpec) {
        self.prepare(spec);
        self.retrigger();
    }

    /// Restart the attack from level 0 with the stored spec
    pub fn retrigger(&mut self) {
        self.state = EnvelopeState::Attack;
        self.level = 0.0;
    }

    /// Enter Release from any state
    ///
    /// A note can be cut short mid-attack; the release starts from whatever
    /// the current level is.
    pub fn release(&mut self) {
        self.state = EnvelopeState::Release;
    }

    /// Enter Release with a new release time in seconds
    pub fn release_with(&mut self, release: f32) {
        self.set_release_time(release);
        self.state = EnvelopeState::Release;
    }

    /// Produce the next gain sample
    pub fn next(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Off | EnvelopeState::Sustain => {}
            EnvelopeState::Attack => {
                self.level = self.attack.base + self.level * self.attack.coef;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.level = self.decay.base + self.level * self.decay.coef;
                if self.level <= self.spec.sustain {
                    self.level = self.spec.sustain;
                    self.state = if self.level > 0.0 {
                        EnvelopeState::Sustain
                    } else {
                        EnvelopeState::Off
                    };
                }
            }
            EnvelopeState::Release => {
                self.level = self.release.base + self.level * self.release.coef;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Off;
                }
            }
        }
        self.level
    }

    /// Current gain
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current stage
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Spec used by the next [`Envelope::retrigger`]
    pub fn spec(&self) -> &EnvelopeSpec {
        &self.spec
    }

    /// True once the envelope is idle
    pub fn is_off(&self) -> bool {
        self.state == EnvelopeState::Off
    }

    fn set_release_time(&mut self, release: f32) {
        self.spec.release = release;
        let coef = coefficient(release * self.sample_rate, DECAY_RELEASE_TARGET_RATIO);
        self.release = Segment {
            coef,
            base: -DECAY_RELEASE_TARGET_RATIO * (1.0 - coef),
        };
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for Envelope {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        for sample in buffer.iter_mut() {
            *sample = self.next();
        }
        if self.is_off() {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.is_off()
    }

    fn reset(&mut self) {
        self.state = EnvelopeState::Off;
        self.level = 0.0;
    }
}

/// Per-sample multiplier of an exponential segment `rate` samples long
///
/// A zero or negative rate gives 0, i.e. the segment completes in one sample.
pub fn coefficient(rate: f32, target_ratio: f32) -> f32 {
    if rate <= 0.0 {
        0.0
    } else {
        (-((1.0 + target_ratio) / target_ratio).ln() / rate).exp()
    }
}
