pub mod envelope;
pub mod fm_voice;
pub mod parameter;

pub use envelope::{Envelope, EnvelopeSpec, EnvelopeState};
pub use fm_voice::{FmOperator, FmVoice};
pub use parameter::{Parameter, ParameterPool};

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// A mono source producing samples frame by frame
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// # Arguments
    /// * `buffer` - Mutable slice to write samples into. The length determines frame size.
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the generator is still active
    /// * `GeneratorState::Complete` if the generator has finished
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}

/// One instance of a synthesis algorithm, able to sound one note
///
/// Voices live in a fixed pool and are reused: the pool calls
/// [`Voice::trigger`] when a note starts, [`Voice::release`] when it ends,
/// and [`Voice::reset`] before returning the voice to the idle list once
/// [`Voice::should_recycle`] reports that it has gone silent.
pub trait Voice: Default + Send {
    /// Start sounding `key` at `velocity`
    fn trigger(&mut self, key: u8, velocity: u8);

    /// Enter the release stage of every envelope
    fn release(&mut self);

    /// Clear oscillator state before the voice goes back to the idle list
    fn reset(&mut self);

    /// Mix one block into `out_l`/`out_r` (adds, never overwrites)
    ///
    /// # Arguments
    /// * `params` - Instrument parameters, read once per block
    /// * `out_l`, `out_r` - Stereo mix bus, both of the block length
    ///
    /// # Returns
    /// `GeneratorState::Complete` once the voice can be recycled
    fn render(
        &mut self,
        params: &ParameterPool,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> GeneratorState;

    /// True once every governing envelope is off
    fn should_recycle(&self) -> bool;

    /// Key this voice was last triggered with
    fn key(&self) -> u8;

    /// Default instrument parameters for this voice type
    fn parameters() -> ParameterPool;

    /// Controller number to parameter index routing
    fn controller_map() -> &'static [(u8, usize)] {
        &[]
    }

    /// Parameter receiving the normalised pitch bend in [-1, 1], if any
    fn pitch_bend_parameter() -> Option<usize> {
        None
    }
}
