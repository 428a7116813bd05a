//! WAV input validation
//!
//! Only one container is accepted. A payload passes when:
//! - the declared format is `wav` (case-insensitive)
//! - it is non-empty and within the size cap
//! - it parses as RIFF/WAVE and holds at least one sample

use std::io::Cursor;

use store_assistant_core::{Error, Result};

/// Header facts from a validated payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Samples per channel
    pub frames: u32,
}

impl WavInfo {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        u64::from(self.frames) * 1000 / u64::from(self.sample_rate)
    }
}

/// Prefix of the error reason for a declared non-wav format
pub const UNSUPPORTED_FORMAT: &str = "unsupported audio format";

/// Whether an error is a rejected declared format rather than a bad payload
pub fn is_unsupported_format(err: &Error) -> bool {
    matches!(err, Error::InputValidation(msg) if msg.starts_with(UNSUPPORTED_FORMAT))
}

/// Check a voice upload before anything else touches it
pub fn validate_wav(audio: &[u8], format: &str, max_bytes: usize) -> Result<WavInfo> {
    if !format.trim().eq_ignore_ascii_case("wav") {
        return Err(Error::InputValidation(format!("{}: {:?}", UNSUPPORTED_FORMAT, format)));
    }
    if audio.is_empty() {
        return Err(Error::InputValidation("audio payload is empty".to_string()));
    }
    if audio.len() > max_bytes {
        return Err(Error::InputValidation(format!(
            "audio payload is {} bytes, limit is {}",
            audio.len(),
            max_bytes
        )));
    }

    let reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| Error::InputValidation(format!("not a valid WAV file: {}", e)))?;
    let spec = reader.spec();
    let frames = reader.duration();
    if frames == 0 {
        return Err(Error::InputValidation("WAV file contains no samples".to_string()));
    }

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Mono 16 kHz PCM16 WAV with `samples` samples
    pub(crate) fn wav_bytes(samples: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..samples {
                writer.write_sample((i % 128) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_valid_wav() {
        let info = validate_wav(&wav_bytes(1600), "WAV", 1 << 20).unwrap();
        assert_eq!(info.sample_rate, 16_000);
        assert_eq!(info.frames, 1600);
        assert_eq!(info.duration_ms(), 100);
    }

    #[test]
    fn test_declared_format_must_be_wav() {
        let err = validate_wav(&wav_bytes(10), "mp3", 1 << 20).unwrap_err();
        assert!(is_unsupported_format(&err));
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(matches!(validate_wav(&[], "wav", 1024), Err(Error::InputValidation(_))));

        let err = validate_wav(&wav_bytes(1000), "wav", 64).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
        assert!(!is_unsupported_format(&err));
    }

    #[test]
    fn test_rejects_garbage_and_silent_header() {
        assert!(validate_wav(b"ID3\x04 not really audio", "wav", 1024).is_err());
        assert!(matches!(
            validate_wav(&wav_bytes(0), "wav", 1024),
            Err(Error::InputValidation(msg)) if msg.contains("no samples")
        ));
    }
}
