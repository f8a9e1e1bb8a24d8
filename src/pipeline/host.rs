//! Host-side adapter: PCM conversion and run-time diagnostics
//!
//! [`AudioHost`] plays the part of the audio transport. It renders one block
//! per call into 16-bit interleaved PCM and publishes what a monitoring loop
//! wants to see (DSP load, voice count, output peaks) through a shared
//! [`Diagnostics`] handle.

use crate::config::{BLOCK_MICROS, BLOCK_SIZE};
use crate::generator::Voice;
use crate::pipeline::engine::Engine;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// `f32` stored in an atomic as its bit pattern
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn swap(&self, value: f32) -> f32 {
        f32::from_bits(self.0.swap(value.to_bits(), Ordering::Relaxed))
    }
}

/// Values published by the render context, readable from any thread
#[derive(Debug, Default)]
pub struct Diagnostics {
    load: AtomicF32,
    peak_l: AtomicF32,
    peak_r: AtomicF32,
    active_voices: AtomicUsize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// DSP load in percent of the block budget
    ///
    /// Peaks are held, then decay as `0.9 * load + 0.1 * latest`.
    pub fn load(&self) -> f32 {
        self.load.load()
    }

    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::Relaxed)
    }

    /// Highest absolute output per channel since the last call; resets both
    pub fn take_peaks(&self) -> (f32, f32) {
        (self.peak_l.swap(0.0), self.peak_r.swap(0.0))
    }

    fn record_load(&self, load: f32) {
        let current = self.load.load();
        if load > current {
            self.load.store(load);
        } else {
            self.load.store(0.9 * current + 0.1 * load);
        }
    }

    fn record_peaks(&self, left: f32, right: f32) {
        if left > self.peak_l.load() {
            self.peak_l.store(left);
        }
        if right > self.peak_r.load() {
            self.peak_r.store(right);
        }
    }
}

/// Convert a sample to 16-bit PCM, clamping to full scale
#[inline]
pub fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Drives an [`Engine`] one block at a time, like a hardware transport
pub struct AudioHost<V: Voice, const P: usize> {
    engine: Engine<V, P>,
    diagnostics: Arc<Diagnostics>,
    left: Box<[f32]>,
    right: Box<[f32]>,
}

impl<V: Voice, const P: usize> AudioHost<V, P> {
    pub fn new(engine: Engine<V, P>) -> Self {
        Self {
            engine,
            diagnostics: Arc::new(Diagnostics::new()),
            left: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
            right: vec![0.0; BLOCK_SIZE].into_boxed_slice(),
        }
    }

    /// Shared handle for a monitoring loop
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    pub fn engine(&self) -> &Engine<V, P> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<V, P> {
        &mut self.engine
    }

    /// Render one block into interleaved stereo PCM
    ///
    /// `pcm` holds `2 * BLOCK_SIZE` samples; a shorter slice renders fewer
    /// frames.
    pub fn render_block(&mut self, pcm: &mut [i16]) {
        let frames = (pcm.len() / 2).min(BLOCK_SIZE);
        let left = &mut self.left[..frames];
        let right = &mut self.right[..frames];

        let start = Instant::now();
        self.engine.render(left, right);
        let elapsed = start.elapsed().as_secs_f32() * 1e6;

        let mut peak_l = 0.0f32;
        let mut peak_r = 0.0f32;
        for ((frame, &l), &r) in pcm.chunks_exact_mut(2).zip(left.iter()).zip(right.iter()) {
            frame[0] = to_pcm(l);
            frame[1] = to_pcm(r);
            peak_l = peak_l.max(l.abs());
            peak_r = peak_r.max(r.abs());
        }

        self.diagnostics.record_peaks(peak_l, peak_r);
        self.diagnostics.record_load(100.0 * elapsed / BLOCK_MICROS);
        self.diagnostics
            .active_voices
            .store(self.engine.num_active_voices(), Ordering::Relaxed);
    }
}
