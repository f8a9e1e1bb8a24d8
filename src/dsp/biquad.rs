//! RBJ cookbook biquad

use std::f32::consts::{LN_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    AllPass,
    PeakingEq,
    LowShelf,
    HighShelf,
}

/// Biquad design parameters and derived coefficients
///
/// Coefficients are normalised so that `a[0] == 1`. Call
/// [`BiquadSpec::update`] after changing any design field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadSpec {
    pub kind: BiquadType,
    pub sample_rate: f32,
    pub freq: f32,
    pub q: f32,
    pub db_gain: f32,
    a: [f32; 3],
    b: [f32; 3],
}

impl BiquadSpec {
    /// Design a filter
    ///
    /// # Arguments
    /// * `kind` - Filter topology
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq` - Corner/centre frequency in Hz, below Nyquist
    /// * `q` - Quality factor (bandwidth in octaves for band-pass, notch and peaking)
    /// * `db_gain` - Gain in dB for peaking and shelving types
    pub fn new(kind: BiquadType, sample_rate: f32, freq: f32, q: f32, db_gain: f32) -> Self {
        let mut spec = Self {
            kind,
            sample_rate,
            freq,
            q,
            db_gain,
            a: [1.0, 0.0, 0.0],
            b: [1.0, 0.0, 0.0],
        };
        spec.update();
        spec
    }

    /// Recompute coefficients from the design fields
    pub fn update(&mut self) {
        // Amplitude at the peak/shelf is gain^2
        let gain = 10f32.powf(self.db_gain / 40.0);

        let w0 = 2.0 * PI * self.freq / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();

        let alpha = match self.kind {
            BiquadType::LowPass | BiquadType::HighPass | BiquadType::AllPass => {
                sin_w0 / (2.0 * self.q)
            }
            BiquadType::BandPass | BiquadType::Notch | BiquadType::PeakingEq => {
                sin_w0 * (LN_2 / 2.0 * self.q * w0 / sin_w0).sinh()
            }
            BiquadType::LowShelf | BiquadType::HighShelf => {
                sin_w0 / 2.0 * ((gain + 1.0 / gain) * (1.0 / self.q - 1.0) + 2.0).sqrt()
            }
        };

        let a = gain;
        let sqrt_a = a.sqrt();
        let (b, den) = match self.kind {
            BiquadType::LowPass => (
                [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
                [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
            ),
            BiquadType::HighPass => (
                [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
                [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
            ),
            // Constant 0 dB peak gain
            BiquadType::BandPass => (
                [alpha, 0.0, -alpha],
                [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
            ),
            BiquadType::Notch => (
                [1.0, -2.0 * cos_w0, 1.0],
                [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
            ),
            BiquadType::AllPass => (
                [1.0 - alpha, -2.0 * cos_w0, 1.0 + alpha],
                [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
            ),
            BiquadType::PeakingEq => (
                [1.0 + alpha * a, -2.0 * cos_w0, 1.0 - alpha * a],
                [1.0 + alpha / a, -2.0 * cos_w0, 1.0 - alpha / a],
            ),
            BiquadType::LowShelf => (
                [
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
                ],
                [
                    (a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
                ],
            ),
            BiquadType::HighShelf => (
                [
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
                ],
                [
                    (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
                ],
            ),
        };

        let a0 = den[0];
        self.b = [b[0] / a0, b[1] / a0, b[2] / a0];
        self.a = [1.0, den[1] / a0, den[2] / a0];
    }

    /// Normalised feedback coefficients
    pub fn a(&self) -> &[f32; 3] {
        &self.a
    }

    /// Normalised feed-forward coefficients
    pub fn b(&self) -> &[f32; 3] {
        &self.b
    }
}

/// Direct-form-I history of one channel
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadState {
    x: [f32; 2],
    y: [f32; 2],
}

impl BiquadState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn tick(&mut self, spec: &BiquadSpec, x: f32) -> f32 {
        let y = spec.b[0] * x + spec.b[1] * self.x[0] + spec.b[2] * self.x[1]
            - spec.a[1] * self.y[0]
            - spec.a[2] * self.y[1];
        self.x = [x, self.x[0]];
        self.y = [y, self.y[0]];
        y
    }

    pub fn process(&mut self, spec: &BiquadSpec, input: &[f32], output: &mut [f32]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.tick(spec, x);
        }
    }

    pub fn process_in_place(&mut self, spec: &BiquadSpec, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(spec, *sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SAMPLE_RATE;
    use approx::assert_relative_eq;

    const ALL_TYPES: [BiquadType; 8] = [
        BiquadType::LowPass,
        BiquadType::HighPass,
        BiquadType::BandPass,
        BiquadType::Notch,
        BiquadType::AllPass,
        BiquadType::PeakingEq,
        BiquadType::LowShelf,
        BiquadType::HighShelf,
    ];

    /// Steady-state amplitude of a unit sine at `freq` through `spec`
    fn response(spec: &BiquadSpec, freq: f32) -> f32 {
        let mut state = BiquadState::default();
        let mut peak = 0.0f32;
        for n in 0..20_000 {
            let x = (2.0 * PI * freq * n as f32 / spec.sample_rate).sin();
            let y = state.tick(spec, x);
            if n > 15_000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_coefficients_normalised() {
        for kind in ALL_TYPES {
            let spec = BiquadSpec::new(kind, SAMPLE_RATE, 1000.0, 0.7071, 6.0);
            assert_eq!(spec.a()[0], 1.0, "{:?}", kind);
            assert!(spec.b().iter().all(|c| c.is_finite()), "{:?}", kind);
            assert!(spec.a().iter().all(|c| c.is_finite()), "{:?}", kind);
        }
    }

    #[test]
    fn test_lowpass_passes_dc_and_cuts_highs() {
        let spec = BiquadSpec::new(BiquadType::LowPass, SAMPLE_RATE, 1000.0, 0.7071, 0.0);
        // DC gain of the RBJ low-pass is exactly 1
        let dc = spec.b().iter().sum::<f32>() / spec.a().iter().sum::<f32>();
        assert_relative_eq!(dc, 1.0, epsilon = 1e-4);
        assert!(response(&spec, 100.0) > 0.95);
        assert!(response(&spec, 10_000.0) < 0.05);
    }

    #[test]
    fn test_highpass_blocks_lows() {
        let spec = BiquadSpec::new(BiquadType::HighPass, SAMPLE_RATE, 2000.0, 0.7071, 0.0);
        assert!(response(&spec, 100.0) < 0.05);
        assert!(response(&spec, 15_000.0) > 0.9);
    }

    #[test]
    fn test_peaking_gain_at_centre() {
        let spec = BiquadSpec::new(BiquadType::PeakingEq, SAMPLE_RATE, 1000.0, 1.0, 6.0);
        let expected = 10f32.powf(6.0 / 20.0);
        assert_relative_eq!(response(&spec, 1000.0), expected, max_relative = 0.02);
    }

    #[test]
    fn test_state_reset_and_in_place() {
        let spec = BiquadSpec::new(BiquadType::LowPass, SAMPLE_RATE, 500.0, 0.7071, 0.0);
        let input: Vec<f32> = (0..64).map(|n| (n as f32 * 0.3).sin()).collect();

        let mut a = BiquadState::default();
        let mut out = vec![0.0f32; 64];
        a.process(&spec, &input, &mut out);

        let mut b = BiquadState::default();
        let mut in_place = input.clone();
        b.process_in_place(&spec, &mut in_place);
        assert_eq!(out, in_place);

        a.reset();
        assert_eq!(a.tick(&spec, 0.0), 0.0);
    }
}
