//! Real-time engine: event hand-off plus one instrument
//!
//! The engine is the single entry point a host drives. Producers submit
//! events through `&self` methods or cloned [`EventSender`]s from any thread;
//! the render context calls [`Engine::render`] once per block with exclusive
//! access.

use crate::config::{EVENT_QUEUE_CAPACITY, FM_POLYPHONY};
use crate::generator::{FmVoice, Voice};
use crate::midi::{Event, EventBatch, EventChannel, EventSender, MidiMessage};
use crate::pipeline::instrument::Instrument;
use crate::tables;
use std::sync::Arc;

pub struct Engine<V: Voice = FmVoice, const P: usize = FM_POLYPHONY> {
    channel: Arc<EventChannel<EVENT_QUEUE_CAPACITY>>,
    batch: EventBatch<EVENT_QUEUE_CAPACITY>,
    instrument: Instrument<V, P>,
}

impl<const P: usize> Engine<FmVoice, P> {
    /// Engine playing the default FM instrument
    pub fn new() -> Self {
        Self::with_instrument(Instrument::fm())
    }
}

impl<const P: usize> Default for Engine<FmVoice, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Voice, const P: usize> Engine<V, P> {
    /// Wrap an instrument. Builds the lookup tables if not done yet.
    pub fn with_instrument(instrument: Instrument<V, P>) -> Self {
        tables::init();
        log::info!(
            "Engine ready: {} voices, {}-event queue",
            P,
            EVENT_QUEUE_CAPACITY
        );
        Self {
            channel: Arc::new(EventChannel::new()),
            batch: EventBatch::new(),
            instrument,
        }
    }

    /// Producer handle that can be moved to another thread
    pub fn sender(&self) -> EventSender {
        EventSender::new(Arc::clone(&self.channel))
    }

    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.channel.send(channel, Event::NoteOn { note, velocity })
    }

    pub fn note_off(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.channel.send(channel, Event::NoteOff { note, velocity })
    }

    pub fn control_change(&self, channel: u8, controller: u8, value: u8) -> bool {
        self.channel
            .send(channel, Event::ControlChange { controller, value })
    }

    pub fn pitch_bend(&self, channel: u8, value: u16) -> bool {
        self.channel.send(channel, Event::PitchBend { value })
    }

    /// Submit a raw encoded message
    pub fn send(&self, message: MidiMessage) -> bool {
        self.channel.send_message(message)
    }

    /// Render one block, overwriting both outputs
    ///
    /// Pending events are applied first, in arrival order; undecodable
    /// messages are skipped.
    pub fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        self.channel.drain(&mut self.batch);
        for message in self.batch.messages() {
            match message.decode() {
                Some(event) => self.instrument.handle_event(event),
                None => log::trace!("Skipping undecodable message {:?}", message),
            }
        }

        out_l.fill(0.0);
        out_r.fill(0.0);
        self.instrument.render(out_l, out_r);
        self.instrument.update_parameters();
    }

    pub fn num_active_voices(&self) -> usize {
        self.instrument.num_active_voices()
    }

    /// Events dropped because the queue was full
    pub fn dropped_events(&self) -> usize {
        self.channel.dropped()
    }

    pub fn instrument(&self) -> &Instrument<V, P> {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut Instrument<V, P> {
        &mut self.instrument
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BLOCK_SIZE;
    use std::thread;

    fn render(engine: &mut Engine<FmVoice, 4>) -> Vec<f32> {
        let mut l = vec![1.0f32; BLOCK_SIZE];
        let mut r = vec![1.0f32; BLOCK_SIZE];
        engine.render(&mut l, &mut r);
        l
    }

    #[test]
    fn test_silent_without_events() {
        let mut engine: Engine<FmVoice, 4> = Engine::with_instrument(Instrument::fm_without_effects());
        assert!(render(&mut engine).iter().all(|&s| s == 0.0), "output not overwritten");
    }

    #[test]
    fn test_events_apply_at_next_block() {
        let mut engine: Engine<FmVoice, 4> = Engine::with_instrument(Instrument::fm_without_effects());
        assert!(engine.note_on(0, 60, 100));
        assert_eq!(engine.num_active_voices(), 0, "nothing happens before render");
        assert!(render(&mut engine).iter().any(|&s| s != 0.0));
        assert_eq!(engine.num_active_voices(), 1);
    }

    #[test]
    fn test_sender_from_other_thread() {
        let mut engine: Engine<FmVoice, 4> = Engine::with_instrument(Instrument::fm_without_effects());
        let sender = engine.sender();
        let handle = thread::spawn(move || {
            for note in [60, 64, 67] {
                sender.note_on(3, note, 90);
            }
        });
        handle.join().unwrap();
        render(&mut engine);
        assert_eq!(engine.num_active_voices(), 3);
    }

    #[test]
    fn test_queue_overflow_counts_drops() {
        let engine: Engine<FmVoice, 4> = Engine::with_instrument(Instrument::fm_without_effects());
        let sent = (0..EVENT_QUEUE_CAPACITY + 5)
            .filter(|_| engine.control_change(0, 1, 10))
            .count();
        assert_eq!(sent, EVENT_QUEUE_CAPACITY);
        assert_eq!(engine.dropped_events(), 5);
    }

    #[test]
    fn test_raw_messages_dispatch() {
        let mut engine: Engine<FmVoice, 4> = Engine::with_instrument(Instrument::fm_without_effects());
        engine.send(MidiMessage::from_bytes(0x90, 62, 100));
        // Unknown status byte is skipped
        engine.send(MidiMessage::from_bytes(0xF0, 0, 0));
        render(&mut engine);
        assert_eq!(engine.num_active_voices(), 1);
    }
}
