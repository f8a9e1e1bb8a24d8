use approx::assert_abs_diff_eq;
use fmsynth::config::SAMPLE_RATE;
use fmsynth::effects::{Delay, Distortion, Effect, EffectChain, LowPass, PitchShift, Reverb};

const FRAMES: usize = 2000;

fn signal() -> Vec<f32> {
    (0..FRAMES)
        .map(|n| 0.6 * (n as f32 * 0.02).sin() + 0.2 * (n as f32 * 0.31).sin())
        .collect()
}

/// Every effect type, configured away from its defaults
fn all_effects() -> Vec<Box<dyn Effect>> {
    let mut distortion = Distortion::new();
    distortion.parameters_mut()[Distortion::GAIN].set_value(3.0, true);
    distortion.parameters_mut()[Distortion::DRY].set_value(0.5, true);

    let mut lowpass = LowPass::new();
    lowpass.parameters_mut()[LowPass::FREQUENCY].set_value(3000.0, true);

    let mut pitch = PitchShift::new();
    pitch.parameters_mut()[PitchShift::PITCH].set_value(1.5, true);
    pitch.parameters_mut()[PitchShift::DRY].set_value(0.5, true);

    let mut delay = Delay::new();
    delay.parameters_mut()[Delay::DELAY].set_value(300.0 / SAMPLE_RATE, true);

    let reverb = Reverb::new();

    vec![
        Box::new(distortion),
        Box::new(lowpass),
        Box::new(pitch),
        Box::new(delay),
        Box::new(reverb),
    ]
}

/// Reference: each effect as its own call, output fed to the next
fn sequential(effects: &mut [Box<dyn Effect>], input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut l = input.to_vec();
    let mut r = input.to_vec();
    for effect in effects.iter_mut() {
        let mut out_l = vec![0.0f32; input.len()];
        let mut out_r = vec![0.0f32; input.len()];
        effect.process(&l, &r, &mut out_l, &mut out_r);
        l = out_l;
        r = out_r;
    }
    (l, r)
}

#[test]
fn test_chain_equals_composition_for_every_length() {
    let input = signal();
    for count in 1..=5 {
        let mut reference: Vec<_> = all_effects().into_iter().take(count).collect();
        let (expected_l, expected_r) = sequential(&mut reference, &input);

        let mut chain = EffectChain::with_effects(all_effects().into_iter().take(count).collect());
        let mut out_l = vec![0.0f32; FRAMES];
        let mut out_r = vec![0.0f32; FRAMES];
        chain.process(&input, &input, &mut out_l, &mut out_r);

        for i in 0..FRAMES {
            assert_abs_diff_eq!(out_l[i], expected_l[i], epsilon = 1e-5);
            assert_abs_diff_eq!(out_r[i], expected_r[i], epsilon = 1e-5);
        }
    }
}

#[test]
fn test_empty_chain_identity() {
    let input = signal();
    let mut chain = EffectChain::new();
    assert!(chain.is_empty());

    let mut left = input.clone();
    let mut right = input.clone();
    chain.process_in_place(&mut left, &mut right);
    assert_eq!(left, input);

    let mut out_l = vec![0.0f32; FRAMES];
    let mut out_r = vec![0.0f32; FRAMES];
    chain.process(&input, &input, &mut out_l, &mut out_r);
    assert_eq!(out_l, input);
    assert_eq!(out_r, input);
}

#[test]
fn test_chain_reset_restores_initial_response() {
    let input = signal();
    let mut chain = EffectChain::with_effects(all_effects());

    let mut first_l = vec![0.0f32; FRAMES];
    let mut first_r = vec![0.0f32; FRAMES];
    chain.process(&input, &input, &mut first_l, &mut first_r);

    chain.reset();
    let mut second_l = vec![0.0f32; FRAMES];
    let mut second_r = vec![0.0f32; FRAMES];
    chain.process(&input, &input, &mut second_l, &mut second_r);

    for i in 0..FRAMES {
        assert_abs_diff_eq!(first_l[i], second_l[i], epsilon = 1e-5);
    }
}
