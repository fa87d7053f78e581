//! Captured-audio format checks.
//!
//! The NLU backend only accepts 16-bit linear PCM at 16kHz. Recordings that
//! carry a RIFF/WAV header are inspected with `hound` and rejected when the
//! header disagrees with that contract; audio is never resampled or
//! converted. Headerless payloads cannot be inspected and pass through.

use crate::error::{CommandError, Result};
use std::io::Cursor;

/// Format details read from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub is_integer: bool,
}

/// Whether the payload starts with a RIFF/WAVE header.
pub fn looks_like_wav(audio: &[u8]) -> bool {
    audio.len() >= 12 && &audio[..4] == b"RIFF" && &audio[8..12] == b"WAVE"
}

/// Read the format of a WAV payload.
///
/// # Errors
///
/// Returns an audio error if the header cannot be parsed.
pub fn inspect_wav(audio: &[u8]) -> Result<WavFormat> {
    let reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| CommandError::Audio(format!("unreadable WAV header: {e}")))?;
    let spec = reader.spec();
    Ok(WavFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        is_integer: spec.sample_format == hound::SampleFormat::Int,
    })
}

/// Check a captured recording against the linear PCM contract.
///
/// # Errors
///
/// Returns an audio error for empty payloads and for WAV payloads that are
/// not mono 16-bit integer PCM at `sample_rate_hertz`.
pub fn validate_linear16(audio: &[u8], sample_rate_hertz: u32) -> Result<()> {
    if audio.is_empty() {
        return Err(CommandError::Audio("captured recording is empty".into()));
    }
    if !looks_like_wav(audio) {
        return Ok(());
    }

    let format = inspect_wav(audio)?;
    if format.sample_rate != sample_rate_hertz {
        return Err(CommandError::Audio(format!(
            "recording must be {sample_rate_hertz}Hz, got {}Hz",
            format.sample_rate
        )));
    }
    if format.channels != 1 {
        return Err(CommandError::Audio(format!(
            "recording must be mono, got {} channels",
            format.channels
        )));
    }
    if !format.is_integer || format.bits_per_sample != 16 {
        return Err(CommandError::Audio(format!(
            "recording must be 16-bit linear PCM, got {}-bit {}",
            format.bits_per_sample,
            if format.is_integer { "integer" } else { "float" }
        )));
    }
    Ok(())
}
