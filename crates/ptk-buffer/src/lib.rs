//! Growable byte buffer and non-owning cursor — the sole I/O medium shared by
//! the codec and the reactor.

mod buffer;
mod cursor;
mod error;

pub use buffer::Buffer;
pub use cursor::{Cursor, CursorMut};
pub use error::BufferError;
