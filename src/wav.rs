//! WAV file output
//!
//! Writes 16-bit PCM through `hound`. Samples are clamped to [-1.0, 1.0]
//! and scaled the same way as the real-time host's PCM conversion.

use crate::error::Result;
use crate::pipeline::host::to_pcm;
use std::path::Path;

fn write_wav_16bit<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(to_pcm(sample))?;
    }
    writer.finalize()?;

    log::debug!(
        "Wrote {} frames to {}",
        samples.len() / channels as usize,
        path.as_ref().display()
    );
    Ok(())
}

/// Write a 16-bit PCM mono WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `samples` - Audio samples (f32, range [-1.0, 1.0])
/// * `sample_rate` - Sample rate in Hz (only for header)
pub fn write_wav_mono_16bit<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    write_wav_16bit(path, samples, sample_rate, 1)
}

/// Write a 16-bit PCM stereo WAV file from interleaved samples
///
/// # Example
/// ```no_run
/// use fmsynth::wav::write_wav_stereo_16bit;
///
/// // Half a second of silence at 44.1kHz, left/right interleaved
/// let samples = vec![0.0f32; 2 * 22_050];
/// write_wav_stereo_16bit("/tmp/output.wav", &samples, 44_100).unwrap();
/// ```
pub fn write_wav_stereo_16bit<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    write_wav_16bit(path, samples, sample_rate, 2)
}
