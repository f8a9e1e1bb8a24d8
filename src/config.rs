//! Compiled-in engine constants and offline render settings
//!
//! The real-time engine has no runtime configuration surface: sample rate,
//! block size, queue capacity and polyphony are fixed at build time.

/// Output sample rate in Hz
pub const SAMPLE_RATE: f32 = 44_100.0;

/// Reciprocal of [`SAMPLE_RATE`]
pub const SAMPLE_RATE_R: f32 = 1.0 / SAMPLE_RATE;

/// Number of frames rendered per block
pub const BLOCK_SIZE: usize = 128;

/// Duration of one block in microseconds
pub const BLOCK_MICROS: f32 = 1e6 * BLOCK_SIZE as f32 / SAMPLE_RATE;

/// Number of event slots shared between producer and render context
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Voices available to the FM instrument
pub const FM_POLYPHONY: usize = 16;

/// Settings for rendering an event script to a file
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Number of samples per script timestep
    pub timestep_samples: usize,
    /// Upper bound on blocks rendered after the last event while voices decay
    pub max_tail_blocks: usize,
    /// Velocity used for key-down events that carry none
    pub base_velocity: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timestep_samples: 11_025, // 250ms at 44.1kHz
            max_tail_blocks: 4 * SAMPLE_RATE as usize / BLOCK_SIZE, // ~4s
            base_velocity: 100,
        }
    }
}
