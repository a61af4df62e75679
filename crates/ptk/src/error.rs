use std::cell::Cell;

use thiserror::Error;

/// The single flat error enumeration returned at the toolkit's outermost
/// surface, composing each layer's own scoped error type via `#[from]`.
/// Collaborators match on this; they never need to know which inner crate
/// raised a given variant.
#[derive(Error, Debug)]
pub enum PtkError {
    #[error(transparent)]
    Buffer(#[from] ptk_buffer::BufferError),
    #[error(transparent)]
    Codec(#[from] ptk_codec::CodecError),
    #[error(transparent)]
    Handle(#[from] ptk_handles::HandleError),
    #[error(transparent)]
    Runtime(#[from] ptk_runtime::RuntimeError),
    #[error(transparent)]
    Reactor(#[from] ptk_reactor::ReactorError),
}

thread_local! {
    /// Per-thread sentinel cell for APIs that must return a plain value
    /// (for example a null handle from a dispose callback context) instead
    /// of a `Result`. Lives here rather than in `ptk-runtime` because the
    /// unified `PtkError` type can only exist once every layer's own error
    /// type is visible — `ptk-runtime` has no dependency upward on `ptk`.
    static LAST_ERROR: Cell<Option<PtkError>> = const { Cell::new(None) };
}

/// Records `err` as this thread's last error, consuming it.
pub fn set_last_error(err: PtkError) {
    LAST_ERROR.with(|cell| cell.set(Some(err)));
}

/// Takes this thread's last error, if any, clearing the cell.
pub fn take_last_error() -> Option<PtkError> {
    LAST_ERROR.with(|cell| cell.take())
}
