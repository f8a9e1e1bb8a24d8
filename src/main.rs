use fmsynth::config::{BLOCK_SIZE, SAMPLE_RATE};
use fmsynth::midi::CC_MODULATION;
use fmsynth::pipeline::{AudioHost, Engine};

/// Blocks per simulated second
const BLOCKS_PER_SECOND: usize = SAMPLE_RATE as usize / BLOCK_SIZE;

fn demo_chord() {
    println!("\n=== FM Chord Demo ===\n");

    let engine: Engine = Engine::new();
    let mut host = AudioHost::new(engine);
    let diagnostics = host.diagnostics();
    let sender = host.engine().sender();

    println!("Configuration:");
    println!("  Sample rate: {} Hz", SAMPLE_RATE);
    println!("  Block size: {} samples", BLOCK_SIZE);
    println!();

    let mut pcm = vec![0i16; 2 * BLOCK_SIZE];
    println!("{:<8} {:<10} {:<8} {:<10} {:<10}", "Second", "Load %", "Voices", "Peak L", "Peak R");
    println!("{}", "-".repeat(50));

    for block in 0..6 * BLOCKS_PER_SECOND {
        // Script: C major chord, mod wheel at 2s, release at 3s
        match block {
            0 => {
                for note in [60, 64, 67] {
                    sender.note_on(0, note, 100);
                }
            }
            b if b == 2 * BLOCKS_PER_SECOND => {
                sender.control_change(0, CC_MODULATION, 100);
            }
            b if b == 3 * BLOCKS_PER_SECOND => {
                for note in [60, 64, 67] {
                    sender.note_off(0, note, 0);
                }
            }
            _ => {}
        }

        host.render_block(&mut pcm);

        if (block + 1) % BLOCKS_PER_SECOND == 0 {
            let (peak_l, peak_r) = diagnostics.take_peaks();
            println!(
                "{:<8} {:<10.2} {:<8} {:<10.4} {:<10.4}",
                (block + 1) / BLOCKS_PER_SECOND,
                diagnostics.load(),
                diagnostics.active_voices(),
                peak_l,
                peak_r
            );
        }
    }
}

fn main() {
    env_logger::init();

    println!("fmsynth: polyphonic FM synthesis engine");
    println!("=======================================");

    demo_chord();

    println!("\n=======================================");
    println!("Demo complete!");
}
