use std::time::Duration;

use ptk_runtime::ThreadPriority;
use serde::{Deserialize, Serialize};

/// Per-core thread placement for one named worker, filled by an external
/// collaborator (a CLI layer or config file loader — constructing this
/// record is explicitly out of scope for the core).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPlacement {
    pub name: String,
    pub core: Option<usize>,
    #[serde(default)]
    pub priority: SerializableThreadPriority,
}

/// `ThreadPriority` carries a raw scheduler value in its `Custom` variant
/// but doesn't derive `serde` itself (it's `ptk_utils`'s type); this mirrors
/// it field-for-field so `ToolkitConfig` can round-trip through a config
/// file without reaching into another crate's type to add derives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum SerializableThreadPriority {
    #[default]
    OsDefault,
    Low,
    Medium,
    High,
    Custom(i32),
}

impl From<SerializableThreadPriority> for ThreadPriority {
    fn from(p: SerializableThreadPriority) -> Self {
        match p {
            SerializableThreadPriority::OsDefault => ThreadPriority::OSDefault,
            SerializableThreadPriority::Low => ThreadPriority::Low,
            SerializableThreadPriority::Medium => ThreadPriority::Medium,
            SerializableThreadPriority::High => ThreadPriority::High,
            SerializableThreadPriority::Custom(p) => ThreadPriority::Custom(p),
        }
    }
}

/// Reactor tuning, thread defaults, and handle table sizing, handed whole to
/// the entry point by whichever collaborator assembled it (CLI parsing and
/// help rendering are both explicitly out of scope here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Floor applied to every `start_oneshot`/`start_periodic` timer
    /// request, in milliseconds. Mirrors `ptk_reactor::MIN_PERIOD`; kept
    /// configurable here since the reactor's own constant can't be raised
    /// per-deployment without recompiling.
    pub timer_resolution_floor_ms: u64,
    /// Default kernel socket buffer size new TCP connections request, in
    /// bytes. `None` leaves the OS default untouched; a collaborator applies
    /// a `Some` value itself via `TcpSocket::set_buffer_size` right after
    /// `connect`/`accept` — PTK never reaches into a freshly-made socket on
    /// its own.
    pub default_socket_buf_bytes: Option<usize>,
    /// Named workers and the core/priority each should boot with.
    pub workers: Vec<WorkerPlacement>,
    /// Capacity passed to the process-wide handle table on first use.
    pub handle_table_capacity: usize,
}

impl ToolkitConfig {
    #[must_use]
    pub fn timer_resolution_floor(&self) -> Duration {
        Duration::from_millis(self.timer_resolution_floor_ms)
    }
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        ToolkitConfig {
            timer_resolution_floor_ms: 50,
            default_socket_buf_bytes: None,
            workers: Vec::new(),
            handle_table_capacity: ptk_handles::DEFAULT_CAPACITY,
        }
    }
}
