/// Named bits of a [`crate::ThreadHandle`]'s `pending_signals` bitmask.
///
/// `ABORT`/`INTERRUPT`/`CHILD_DIED` are reserved; `USER_0..=USER_7` are free
/// for collaborator-defined wakeups (e.g. "work enqueued").
pub const ABORT: u64 = 1 << 0;
pub const INTERRUPT: u64 = 1 << 1;
pub const CHILD_DIED: u64 = 1 << 2;

pub const USER_0: u64 = 1 << 8;
pub const USER_1: u64 = 1 << 9;
pub const USER_2: u64 = 1 << 10;
pub const USER_3: u64 = 1 << 11;
pub const USER_4: u64 = 1 << 12;
pub const USER_5: u64 = 1 << 13;
pub const USER_6: u64 = 1 << 14;
pub const USER_7: u64 = 1 << 15;
