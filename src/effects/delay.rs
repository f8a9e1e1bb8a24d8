use super::{frame_count, Effect};
use crate::config::SAMPLE_RATE;
use crate::dsp::DelayLine;
use crate::generator::ParameterPool;

/// Stereo feedback delay
///
/// `out = wet * delayed + dry * in`, with `in + feedback * delayed` written
/// back into the line. The delay time is in seconds, capped by the line
/// length chosen with [`Delay::set_max_delay`].
pub struct Delay {
    params: ParameterPool,
    delay_l: DelayLine,
    delay_r: DelayLine,
    samples_per_second: f32,
}

impl Delay {
    pub const DRY: usize = 0;
    pub const WET: usize = 1;
    /// Delay time in seconds
    pub const DELAY: usize = 2;
    /// Line length in seconds
    pub const MAXDELAY: usize = 3;
    pub const FEEDBACK: usize = 4;
    pub const NUM_PARAMS: usize = 5;

    pub fn new() -> Self {
        let mut params = ParameterPool::new(Self::NUM_PARAMS);
        params[Self::DRY].set_value(1.0, true);
        params[Self::WET].set_value(0.5, true);
        params[Self::DELAY].set_range(0.0, 10.0);
        params[Self::MAXDELAY].set_range(0.001, 10.0);
        params[Self::MAXDELAY].set_value(1.0, true);
        params[Self::FEEDBACK].set_value(0.5, true);

        let mut delay = Self {
            params,
            delay_l: DelayLine::new(1),
            delay_r: DelayLine::new(1),
            samples_per_second: SAMPLE_RATE,
        };
        delay.init();
        delay
    }

    /// Reallocate the delay lines for `seconds` of history
    ///
    /// Allocates; call outside the render path.
    pub fn set_max_delay(&mut self, seconds: f32) {
        self.params[Self::MAXDELAY].set_value(seconds, true);
        self.init();
    }

    /// Length of each delay line in samples
    pub fn line_length(&self) -> usize {
        self.delay_l.size()
    }

    fn init(&mut self) {
        let max_delay = self.params[Self::MAXDELAY].value();
        let size = (SAMPLE_RATE * max_delay).ceil() as usize;
        self.delay_l.resize(size);
        self.delay_r.resize(size);
        self.samples_per_second = self.delay_l.size() as f32 / max_delay;
        log::debug!("Delay lines sized to {} samples", self.delay_l.size());
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Delay {
    fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let max_index = (self.delay_l.size() - 1) as f32;
        for i in 0..frame_count(in_l, in_r, out_l, out_r) {
            let dry = self.params[Self::DRY].next_value();
            let wet = self.params[Self::WET].next_value();
            let delay = (self.params[Self::DELAY].next_value() * self.samples_per_second).min(max_index);
            let fb = self.params[Self::FEEDBACK].next_value();

            let l = self.delay_l.read(delay);
            let r = self.delay_r.read(delay);
            self.delay_l.write(l * fb + in_l[i]);
            self.delay_r.write(r * fb + in_r[i]);
            out_l[i] = l * wet + in_l[i] * dry;
            out_r[i] = r * wet + in_r[i] * dry;
        }
    }

    fn reset(&mut self) {
        self.delay_l.reset();
        self.delay_r.reset();
    }

    fn parameters(&self) -> &ParameterPool {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterPool {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> Vec<f32> {
        let mut x = vec![0.0f32; len];
        x[0] = 1.0;
        x
    }

    #[test]
    fn test_echo_arrives_after_delay_time() {
        let mut delay = Delay::new();
        delay.parameters_mut()[Delay::DRY].set_value(0.0, true);
        delay.parameters_mut()[Delay::WET].set_value(1.0, true);
        delay.parameters_mut()[Delay::FEEDBACK].set_value(0.5, true);
        // 100 samples
        delay.parameters_mut()[Delay::DELAY].set_value(100.0 / SAMPLE_RATE, true);

        let input = impulse(512);
        let mut out_l = vec![0.0f32; 512];
        let mut out_r = vec![0.0f32; 512];
        delay.process(&input, &input, &mut out_l, &mut out_r);

        let first = out_l.iter().position(|&s| s.abs() > 0.1).unwrap();
        assert!((100..=102).contains(&first), "first echo at {}", first);
        // Second echo at twice the distance, halved by the feedback
        let second = out_l[first + 5..].iter().position(|&s| s.abs() > 0.1).unwrap() + first + 5;
        assert!((second as i64 - 2 * first as i64).abs() <= 2);
        assert!((out_l[second] - 0.5).abs() < 0.05);
        assert_eq!(out_l, out_r);
    }

    #[test]
    fn test_dry_only_is_identity() {
        let mut delay = Delay::new();
        delay.parameters_mut()[Delay::WET].set_value(0.0, true);
        let input: Vec<f32> = (0..64).map(|n| n as f32 * 0.01).collect();
        let mut out_l = vec![0.0f32; 64];
        let mut out_r = vec![0.0f32; 64];
        delay.process(&input, &input, &mut out_l, &mut out_r);
        assert_eq!(out_l, input);
    }

    #[test]
    fn test_max_delay_sizes_line() {
        let mut delay = Delay::new();
        assert_eq!(delay.line_length(), SAMPLE_RATE as usize);
        delay.set_max_delay(0.5);
        assert_eq!(delay.line_length(), (SAMPLE_RATE * 0.5).ceil() as usize);

        // Delay longer than the line is capped, not wrapped around
        delay.parameters_mut()[Delay::DELAY].set_value(5.0, true);
        let mut out_l = vec![0.0f32; 16];
        let mut out_r = vec![0.0f32; 16];
        delay.process(&impulse(16), &impulse(16), &mut out_l, &mut out_r);
        assert!(out_l.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_reset_clears_echoes() {
        let mut delay = Delay::new();
        delay.parameters_mut()[Delay::DRY].set_value(0.0, true);
        delay.parameters_mut()[Delay::DELAY].set_value(10.0 / SAMPLE_RATE, true);
        let mut out_l = vec![0.0f32; 4];
        let mut out_r = vec![0.0f32; 4];
        delay.process(&impulse(4), &impulse(4), &mut out_l, &mut out_r);
        delay.reset();

        let silence = vec![0.0f32; 64];
        let mut out_l = vec![0.0f32; 64];
        let mut out_r = vec![0.0f32; 64];
        delay.process(&silence, &silence, &mut out_l, &mut out_r);
        assert!(out_l.iter().all(|&s| s == 0.0));
    }
}
