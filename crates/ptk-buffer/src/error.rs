use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferError {
    #[error("buffer too small")]
    BufferTooSmall,
}
