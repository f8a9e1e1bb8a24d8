//! Fixed-capacity voice allocation
//!
//! All `N` voices are created up front. Each one sits on exactly one of two
//! index lists: idle or active. Note-on pops the oldest idle voice, and a
//! voice goes back to the idle tail once it reports that it can be recycled.
//! When every voice is busy, new notes are dropped; sounding notes are never
//! stolen.

use crate::generator::{GeneratorState, ParameterPool, Voice};
use crate::pool::{IndexList, Link};

pub struct VoicePool<V: Voice, const N: usize> {
    voices: [V; N],
    links: [Link; N],
    idle: IndexList,
    active: IndexList,
}

impl<V: Voice, const N: usize> VoicePool<V, N> {
    /// Create a pool with every voice idle
    pub fn new() -> Self {
        let mut pool = Self {
            voices: std::array::from_fn(|_| V::default()),
            links: [None; N],
            idle: IndexList::new(),
            active: IndexList::new(),
        };
        for i in 0..N {
            pool.idle.push_back(&mut pool.links, i);
        }
        pool
    }

    /// Maximum number of simultaneous voices
    pub fn capacity(&self) -> usize {
        N
    }

    pub fn num_active_voices(&self) -> usize {
        self.active.len()
    }

    pub fn num_idle_voices(&self) -> usize {
        self.idle.len()
    }

    /// Start a note on the next idle voice
    ///
    /// Returns `false` and drops the note when all voices are sounding.
    pub fn trigger(&mut self, key: u8, velocity: u8) -> bool {
        let Some(index) = self.idle.pop_front(&mut self.links) else {
            log::trace!("Voice pool exhausted, dropping note {}", key);
            return false;
        };
        self.voices[index].trigger(key, velocity);
        self.active.push_back(&mut self.links, index);
        true
    }

    /// Release every active voice playing `key`
    pub fn release_key(&mut self, key: u8) {
        self.release_where(|k| k == key);
    }

    /// Release every active voice whose key satisfies `predicate`
    pub fn release_where<F: FnMut(u8) -> bool>(&mut self, mut predicate: F) {
        for index in self.active.iter(&self.links) {
            let voice = &mut self.voices[index];
            if predicate(voice.key()) {
                voice.release();
            }
        }
    }

    /// Mix every active voice into the bus and recycle finished ones
    pub fn render(&mut self, params: &ParameterPool, out_l: &mut [f32], out_r: &mut [f32]) {
        let mut prev = None;
        let mut cursor = self.active.first();
        while let Some(index) = cursor {
            let voice = &mut self.voices[index];
            let state = voice.render(params, out_l, out_r);
            if state == GeneratorState::Complete || voice.should_recycle() {
                voice.reset();
                cursor = self.active.remove(&mut self.links, prev, index);
                self.idle.push_back(&mut self.links, index);
            } else {
                prev = Some(index);
                cursor = self.active.next(&self.links, index);
            }
        }
    }

    /// Voices currently sounding, oldest first
    pub fn active_voices(&self) -> impl Iterator<Item = &V> + '_ {
        self.active.iter(&self.links).map(move |i| &self.voices[i])
    }

    /// Voices waiting on the idle list
    pub fn idle_voices(&self) -> impl Iterator<Item = &V> + '_ {
        self.idle.iter(&self.links).map(move |i| &self.voices[i])
    }
}

impl<V: Voice, const N: usize> Default for VoicePool<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BLOCK_SIZE;
    use crate::generator::FmVoice;
    use crate::tables;

    fn render(pool: &mut VoicePool<FmVoice, 4>, params: &ParameterPool) -> Vec<f32> {
        let mut l = vec![0.0f32; BLOCK_SIZE];
        let mut r = vec![0.0f32; BLOCK_SIZE];
        pool.render(params, &mut l, &mut r);
        l
    }

    #[test]
    fn test_new_pool_is_idle() {
        let pool: VoicePool<FmVoice, 4> = VoicePool::new();
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.num_active_voices(), 0);
        assert_eq!(pool.num_idle_voices(), 4);
    }

    #[test]
    fn test_exhausted_pool_drops_notes() {
        tables::init();
        let mut pool: VoicePool<FmVoice, 4> = VoicePool::new();
        for key in 60..64 {
            assert!(pool.trigger(key, 100));
        }
        assert!(!pool.trigger(70, 100), "fifth note should be dropped");
        assert_eq!(pool.num_active_voices(), 4);

        // Oldest notes keep sounding
        let keys: Vec<u8> = pool.active_voices().map(|v| v.key()).collect();
        assert_eq!(keys, vec![60, 61, 62, 63]);
    }

    #[test]
    fn test_release_only_matching_key() {
        tables::init();
        let params = FmVoice::parameters();
        let mut pool: VoicePool<FmVoice, 4> = VoicePool::new();
        pool.trigger(60, 127);
        pool.trigger(64, 127);
        render(&mut pool, &params);

        pool.release_key(60);
        // Carrier release is 0.25s, so a second is plenty
        for _ in 0..(44_100 / BLOCK_SIZE) {
            render(&mut pool, &params);
        }
        let keys: Vec<u8> = pool.active_voices().map(|v| v.key()).collect();
        assert_eq!(keys, vec![64]);
        assert_eq!(pool.num_active_voices() + pool.num_idle_voices(), 4);
    }

    #[test]
    fn test_recycled_voices_are_silent_and_reusable() {
        tables::init();
        let params = FmVoice::parameters();
        let mut pool: VoicePool<FmVoice, 4> = VoicePool::new();
        pool.trigger(48, 80);
        pool.release_key(48);
        for _ in 0..(44_100 / BLOCK_SIZE) {
            render(&mut pool, &params);
        }
        assert_eq!(pool.num_active_voices(), 0);
        assert!(pool.idle_voices().all(|v| v.envelope_level() == 0.0));

        // The pool keeps cycling through its slots
        for round in 0..3 {
            assert!(pool.trigger(50 + round, 100));
            assert!(render(&mut pool, &params).iter().any(|&s| s != 0.0));
            pool.release_where(|_| true);
            for _ in 0..(44_100 / BLOCK_SIZE) {
                render(&mut pool, &params);
            }
            assert_eq!(pool.num_active_voices(), 0);
        }
    }
}
