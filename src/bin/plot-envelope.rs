use fmsynth::generator::{Envelope, EnvelopeSpec, EnvelopeState, GeneratorState, SignalGenerator};
use plotters::prelude::*;

const SAMPLE_RATE: f32 = 1000.0; // 1ms = 1 sample
const FRAME_SIZE: usize = 64;
const DISCONTINUITY_THRESHOLD: f32 = 0.15;
/// Longest envelope the tool will plot, in ms
const MAX_DURATION_MS: usize = 100_000;

struct Args {
    attack_ms: f32,
    decay_ms: f32,
    sustain_level: f32,
    release_ms: f32,
    note_off_ms: f32,
    output_path: String,
}

fn print_usage() {
    eprintln!("Usage: plot-envelope <attack_ms> <decay_ms> <sustain_level> <release_ms> <note_off_ms> <output.svg>");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  plot-envelope 100 200 0.7 300 640 output.svg  # note_off at 640ms");
    eprintln!("  plot-envelope 50 100 0.5 200 30 output.svg    # release during attack");
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 7 {
        print_usage();
        return Err("Invalid number of arguments".into());
    }

    let parsed = Args {
        attack_ms: args[1].parse()?,
        decay_ms: args[2].parse()?,
        sustain_level: args[3].parse()?,
        release_ms: args[4].parse()?,
        note_off_ms: args[5].parse()?,
        output_path: args[6].clone(),
    };

    if parsed.attack_ms < 0.0 || parsed.decay_ms < 0.0 || parsed.release_ms < 0.0 {
        return Err("Time values must be non-negative".into());
    }
    if !(0.0..=1.0).contains(&parsed.sustain_level) {
        return Err("Sustain level must be between 0.0 and 1.0".into());
    }
    if parsed.note_off_ms < 0.0 {
        return Err("Note off time must be non-negative".into());
    }

    Ok(parsed)
}

/// Run the envelope frame by frame, releasing at the note-off sample
fn generate_envelope(args: &Args) -> Result<(Vec<f32>, Vec<EnvelopeState>), Box<dyn std::error::Error>> {
    let mut envelope = Envelope::with_sample_rate(SAMPLE_RATE);
    envelope.trigger(&EnvelopeSpec::new(
        args.attack_ms / 1000.0,
        args.decay_ms / 1000.0,
        args.sustain_level,
        args.release_ms / 1000.0,
    ));

    let note_off_sample = (args.note_off_ms * SAMPLE_RATE / 1000.0) as usize;
    let mut samples = Vec::new();
    let mut states = Vec::new();
    let mut frame = [0.0f32; 1];

    // One-sample frames up to the note-off so it lands on the exact sample
    while samples.len() < note_off_sample && !envelope.is_complete() {
        envelope.process(&mut frame);
        samples.push(frame[0]);
        states.push(envelope.state());
    }
    envelope.release();

    let mut frame_buffer = [0.0f32; FRAME_SIZE];
    loop {
        let state = envelope.process(&mut frame_buffer);
        samples.extend_from_slice(&frame_buffer);
        states.extend(std::iter::repeat(envelope.state()).take(FRAME_SIZE));

        if state == GeneratorState::Complete {
            break;
        }
        if samples.len() > MAX_DURATION_MS {
            return Err("Envelope exceeded maximum duration".into());
        }
    }

    Ok((samples, states))
}

fn check_discontinuities(samples: &[f32]) -> Result<(), Box<dyn std::error::Error>> {
    let mut max_diff: f32 = 0.0;
    let mut max_diff_idx: usize = 0;

    for i in 1..samples.len() {
        let diff = (samples[i] - samples[i - 1]).abs();
        if diff > max_diff {
            max_diff = diff;
            max_diff_idx = i;
        }
    }

    if max_diff > DISCONTINUITY_THRESHOLD {
        return Err(format!(
            "DISCONTINUITY at sample {} ({}ms): {} -> {} (diff = {})",
            max_diff_idx,
            max_diff_idx as f32 / SAMPLE_RATE * 1000.0,
            samples[max_diff_idx - 1],
            samples[max_diff_idx],
            max_diff
        )
        .into());
    }

    println!(
        "  Max step: {:.6} at sample {} (below threshold {})",
        max_diff, max_diff_idx, DISCONTINUITY_THRESHOLD
    );
    Ok(())
}

fn create_plot(args: &Args, samples: &[f32], states: &[EnvelopeState]) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(&args.output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = samples.len().saturating_sub(1) as f32;
    let title = format!(
        "Envelope: A={}ms, D={}ms, S={:.2}, R={}ms, note_off={}ms",
        args.attack_ms, args.decay_ms, args.sustain_level, args.release_ms, args.note_off_ms
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..max_time.max(1.0), 0f32..1.1f32)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Level")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples.iter().enumerate().map(|(i, &s)| (i as f32, s)),
        BLUE.stroke_width(2),
    ))?;

    // Stage transitions
    for (i, pair) in states.windows(2).enumerate() {
        if pair[0] != pair[1] {
            chart.draw_series(std::iter::once(plotters::element::Cross::new(
                ((i + 1) as f32, samples[i + 1]),
                6,
                BLACK.filled(),
            )))?;
        }
    }

    let note_off = (args.note_off_ms as usize).min(samples.len().saturating_sub(1));
    if let Some(&level) = samples.get(note_off) {
        chart.draw_series(std::iter::once(plotters::element::Circle::new((note_off as f32, level), 5, RED.filled())))?;
    }

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = parse_args()?;

    println!("Envelope Plot Generator");
    println!("=======================");
    println!("  Attack: {}ms", args.attack_ms);
    println!("  Decay: {}ms", args.decay_ms);
    println!("  Sustain: {:.2}", args.sustain_level);
    println!("  Release: {}ms", args.release_ms);
    println!("  Note Off: {}ms", args.note_off_ms);
    println!();

    print!("  Generating envelope... ");
    let (samples, states) = generate_envelope(&args)?;
    println!("done ({} samples, {:.1}ms)", samples.len(), samples.len() as f32 / SAMPLE_RATE * 1000.0);

    check_discontinuities(&samples)?;

    print!("  Creating plot... ");
    create_plot(&args, &samples, &states)?;
    println!("done");

    println!();
    println!("Output: {}", args.output_path);

    Ok(())
}
