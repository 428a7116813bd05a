//! Request-scoped scratch audio
//!
//! Voice uploads are spilled to a temp file for the transcription backend.
//! The file lives exactly as long as the guard, so a failed stage, an early
//! return or a dropped request future all remove it.

use std::io::Write;
use std::path::{Path, PathBuf};

use store_assistant_core::{Error, Result};
use tempfile::NamedTempFile;

/// Scratch copy of one request's input audio
#[derive(Debug)]
pub struct ScratchAudio {
    file: NamedTempFile,
}

impl ScratchAudio {
    /// Write `audio` to a fresh `.wav` temp file in `dir` (system temp dir if `None`)
    pub fn write(audio: &[u8], dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("input_").suffix(".wav");

        let mut file = match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| scratch_error(dir, e))?;
                builder.tempfile_in(dir)
            }
            None => builder.tempfile(),
        }
        .map_err(|e| scratch_error(&std::env::temp_dir(), e))?;

        file.write_all(audio)
            .and_then(|_| file.flush())
            .map_err(|e| scratch_error(file.path(), e))?;

        tracing::trace!(path = %file.path().display(), bytes = audio.len(), "Wrote scratch audio");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the file now and report failures. Dropping the guard also
    /// removes it, silently.
    pub fn close(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch audio");
        }
    }
}

fn scratch_error(path: &Path, e: std::io::Error) -> Error {
    Error::Transcription(format!("scratch file {}: {}", path.display(), e))
}
