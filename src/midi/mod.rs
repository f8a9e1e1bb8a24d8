//! Note/control events: encoding and cross-context delivery

pub mod channel;
pub mod message;

pub use channel::{EventBatch, EventChannel, EventQueue, EventSender, EventSlot};
pub use message::{Event, MidiMessage, CC_MODULATION, CC_SUSTAIN_PEDAL, PITCH_BEND_CENTER};
