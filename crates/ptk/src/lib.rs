//! Protocol Toolkit: a reusable substrate for binary network protocols,
//! built from five core components re-exported here — a growable byte
//! buffer, a type-directed binary codec, a generation+slot handle table, a
//! cooperative thread runtime, and a blocking-with-timeout event reactor.
//!
//! This crate is the seam collaborators actually depend on: it unifies each
//! component's own scoped error type into [`PtkError`], carries the
//! [`ToolkitConfig`] record handed to an entry point, and re-exports
//! `LogSink`/`SinkLayer` for pluggable log delivery. The bundled arithmetic
//! client/server under `demos/` is an external collaborator built against
//! this same public surface, not part of the core.

pub mod config;
pub mod error;

pub use config::ToolkitConfig;
pub use error::{PtkError, set_last_error, take_last_error};

pub use ptk_buffer as buffer;
pub use ptk_codec as codec;
pub use ptk_handles as handles;
pub use ptk_reactor as reactor;
pub use ptk_runtime as runtime;
pub use ptk_runtime::{LogSink, SinkLayer};
pub use ptk_utils as utils;
