//! Errors at the decode seam.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported or corrupt stream: {0}")]
    Stream(#[from] symphonia::core::errors::Error),

    #[error("no audio track in {0}")]
    NoAudioTrack(PathBuf),

    #[error("no audio decoded from {0}")]
    Empty(PathBuf),
}
