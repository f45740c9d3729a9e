//! Host-side audio ingestion: decoding files into the single-channel
//! sample buffers the peak cache consumes.

pub mod error;
pub mod io;

pub use error::DecodeError;
pub use io::{decode_audio, read_wav};
