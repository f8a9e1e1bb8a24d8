//! CLI tool for rendering an event script to a WAV file
//!
//! Usage: play <input.txt> [output.wav]
//!
//! If output is not specified, generates <input>.wav

use fmsynth::config::{RenderConfig, BLOCK_SIZE, FM_POLYPHONY, SAMPLE_RATE};
use fmsynth::pipeline::{parse_script, Pipeline};
use fmsynth::{Error, Result};
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "Usage: play <input.txt> [output.wav]

Render an event script through the FM instrument.

Arguments:
  input.txt     Path to the script
  output.wav    Output WAV file path (optional, defaults to <input>.wav)

Script lines look like `+<timesteps>| 4cd, 4e#d90, cc64=127, pb8192`.

Examples:
  play song.txt
  play song.txt output.wav
";

fn output_path_for(input_path: &str) -> String {
    match input_path.strip_suffix(".txt") {
        Some(stem) => format!("{}.wav", stem),
        None => format!("{}.wav", input_path),
    }
}

fn run(input_path: &str, output_path: &str) -> Result<()> {
    let content = fs::read_to_string(input_path)?;
    let events = parse_script(&content)?;
    if events.is_empty() {
        return Err(Error::Config(format!("{} contains no events", input_path)));
    }
    println!("Parsed {} event groups", events.len());

    let config = RenderConfig::default();
    println!("Configuration:");
    println!("  Sample rate: {} Hz", SAMPLE_RATE);
    println!("  Block size: {} samples", BLOCK_SIZE);
    println!("  Timestep: {} samples", config.timestep_samples);
    println!("  Polyphony: {} voices", FM_POLYPHONY);
    println!();

    let mut pipeline: Pipeline = Pipeline::new(config, events);
    println!("Generating audio...");
    pipeline.generate_wav(output_path)?;
    println!(
        "Generated {} ({:.2}s)",
        output_path,
        pipeline.current_sample() as f32 / SAMPLE_RATE
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| output_path_for(input_path));

    if let Err(e) = run(input_path, &output_path) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
