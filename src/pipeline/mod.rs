//! Audio processing pipeline
//!
//! From events to audio:
//! - VoicePool: fixed set of voices on idle/active lists
//! - Instrument: event handling, controls and the effect chain
//! - Engine: event hand-off to the render context
//! - Host: PCM output and diagnostics, as a hardware transport would drive it
//! - Parser / Scheduler: offline rendering of text event scripts

pub mod engine;
pub mod host;
pub mod instrument;
pub mod parser;
pub mod scheduler;
pub mod voice_pool;

pub use engine::Engine;
pub use host::{AudioHost, Diagnostics};
pub use instrument::Instrument;
pub use parser::{parse_script, KeyDirection, Note, ParseError, PitchClass, ScriptEvent, TimedEvents};
pub use scheduler::Pipeline;
pub use voice_pool::VoicePool;
