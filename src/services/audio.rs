//! WAV packaging for raw PCM returned by speech models.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Sample rate of Gemini TTS output when the mime type does not say.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Highest rate accepted from a mime type; anything above is treated as absent.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Read `rate=<n>` from a mime type such as `audio/L16;codec=pcm;rate=24000`.
///
/// Zero or out-of-range rates fall back to [`DEFAULT_SAMPLE_RATE`].
pub fn sample_rate_from_mime(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse::<u32>().ok())
        .filter(|rate| (1..=MAX_SAMPLE_RATE).contains(rate))
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Wrap 16-bit little-endian mono PCM in a WAVE container.
///
/// A trailing odd byte (half a sample) is dropped.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
