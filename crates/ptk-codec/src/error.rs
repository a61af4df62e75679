use ptk_buffer::BufferError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too small for field")]
    BufferTooSmall,
    #[error("composite invariant violated: {0}")]
    ParseError(&'static str),
    #[error("checksum verification failed")]
    ChecksumFailed,
    #[error("unsupported field tag")]
    Unsupported,
}

impl From<BufferError> for CodecError {
    fn from(_: BufferError) -> Self {
        CodecError::BufferTooSmall
    }
}
