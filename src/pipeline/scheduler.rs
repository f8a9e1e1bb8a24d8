//! Scheduler and Pipeline orchestrator
//!
//! Plays a parsed script through an [`Engine`] offline. Events are submitted
//! through the engine's producer side at block boundaries, exactly like a
//! live input would, and the engine renders block by block.

use crate::config::{RenderConfig, BLOCK_SIZE, FM_POLYPHONY, SAMPLE_RATE};
use crate::error::Result;
use crate::generator::{FmVoice, Voice};
use crate::midi::MidiMessage;
use crate::pipeline::engine::Engine;
use crate::pipeline::parser::TimedEvents;
use crate::wav::write_wav_stereo_16bit;
use std::path::Path;

/// Offline renderer for a script of timed events
pub struct Pipeline<V: Voice = FmVoice, const P: usize = FM_POLYPHONY> {
    config: RenderConfig,
    engine: Engine<V, P>,
    events: Vec<TimedEvents>,
    /// Current sample position
    current_sample: usize,
    /// Index of the next event group to submit
    event_index: usize,
    /// Samples until the next event group is due
    samples_to_next_event: usize,
    /// Blocks rendered since the last event group
    tail_blocks: usize,
}

impl<const P: usize> Pipeline<FmVoice, P> {
    /// Pipeline playing the default FM instrument
    pub fn new(config: RenderConfig, events: Vec<TimedEvents>) -> Self {
        Self::with_engine(config, Engine::new(), events)
    }
}

impl<V: Voice, const P: usize> Pipeline<V, P> {
    /// Create a pipeline around an existing engine
    ///
    /// # Arguments
    /// * `config` - Render configuration
    /// * `engine` - Engine to drive
    /// * `events` - Parsed events in chronological order
    pub fn with_engine(config: RenderConfig, engine: Engine<V, P>, events: Vec<TimedEvents>) -> Self {
        let samples_to_next_event = events
            .first()
            .map_or(0, |e| e.delta.saturating_mul(config.timestep_samples));
        log::info!(
            "Pipeline: {} event groups, {} samples per timestep",
            events.len(),
            config.timestep_samples
        );

        Self {
            config,
            engine,
            events,
            current_sample: 0,
            event_index: 0,
            samples_to_next_event,
            tail_blocks: 0,
        }
    }

    /// True while events are pending or voices are still sounding
    ///
    /// Bounded by `max_tail_blocks` after the last event, so a held note
    /// cannot keep the render going forever.
    pub fn is_active(&self) -> bool {
        if self.has_more_events() {
            return true;
        }
        self.engine.num_active_voices() > 0 && self.tail_blocks < self.config.max_tail_blocks
    }

    fn has_more_events(&self) -> bool {
        self.event_index < self.events.len()
    }

    /// Submit every event group due at the current block boundary
    fn submit_due_events(&mut self) {
        while self.has_more_events() && self.samples_to_next_event == 0 {
            for event in &self.events[self.event_index].events {
                match event.to_event(self.config.base_velocity) {
                    Ok(event) => {
                        if !self.engine.send(MidiMessage::encode(0, event)) {
                            log::warn!("Event queue full at sample {}", self.current_sample);
                        }
                    }
                    Err(e) => log::warn!("Skipping event: {}", e),
                }
            }

            self.event_index += 1;
            self.tail_blocks = 0;
            if let Some(next) = self.events.get(self.event_index) {
                self.samples_to_next_event = next.delta.saturating_mul(self.config.timestep_samples);
            }
        }
    }

    /// Render one block of stereo audio
    ///
    /// Due events are submitted at the start of the block, so event timing
    /// is quantised to the block length.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.submit_due_events();
        self.engine.render(left, right);

        let frames = left.len();
        self.current_sample += frames;
        self.samples_to_next_event = self.samples_to_next_event.saturating_sub(frames);
        if !self.has_more_events() {
            self.tail_blocks += 1;
        }
    }

    /// Render the whole script into interleaved stereo samples
    pub fn render(&mut self) -> Vec<f32> {
        let mut samples = Vec::new();
        let mut left = vec![0.0f32; BLOCK_SIZE];
        let mut right = vec![0.0f32; BLOCK_SIZE];

        while self.is_active() {
            self.process_block(&mut left, &mut right);
            for (&l, &r) in left.iter().zip(right.iter()) {
                samples.push(l);
                samples.push(r);
            }
        }

        log::info!(
            "Rendered {} frames ({:.2}s)",
            samples.len() / 2,
            (samples.len() / 2) as f32 / SAMPLE_RATE
        );
        samples
    }

    /// Render the whole script and write it to a WAV file
    ///
    /// # Arguments
    /// * `output_path` - Path for output WAV file
    pub fn generate_wav<Q: AsRef<Path>>(&mut self, output_path: Q) -> Result<()> {
        let samples = self.render();
        write_wav_stereo_16bit(output_path, &samples, SAMPLE_RATE as u32)
    }

    /// Samples rendered so far
    pub fn current_sample(&self) -> usize {
        self.current_sample
    }

    pub fn engine(&self) -> &Engine<V, P> {
        &self.engine
    }
}
