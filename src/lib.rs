//! Polyphonic FM synthesis and effects engine
//!
//! Note and control events go in through an [`pipeline::Engine`]'s producer
//! side, stereo audio comes out one block at a time:
//!
//! ```
//! use fmsynth::config::BLOCK_SIZE;
//! use fmsynth::pipeline::Engine;
//!
//! let mut engine: Engine = Engine::new();
//! engine.note_on(0, 60, 100);
//!
//! let mut left = [0.0f32; BLOCK_SIZE];
//! let mut right = [0.0f32; BLOCK_SIZE];
//! engine.render(&mut left, &mut right);
//! assert_eq!(engine.num_active_voices(), 1);
//! ```
//!
//! The render path never allocates or blocks. Voices, events and effect
//! buffers are sized at construction.

pub mod config;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod generator;
pub mod midi;
pub mod pipeline;
pub mod pool;
pub mod tables;
pub mod wav;

pub use error::{Error, Result};
