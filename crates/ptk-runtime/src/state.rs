use std::sync::atomic::{AtomicU8, Ordering};

/// A [`crate::ThreadHandle`]'s lifecycle. Transitions only move forward:
/// `New -> Runnable -> Running -> Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    New = 0,
    Runnable = 1,
    Running = 2,
    Exited = 3,
}

impl ThreadState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ThreadState::New,
            1 => ThreadState::Runnable,
            2 => ThreadState::Running,
            _ => ThreadState::Exited,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn load(&self) -> ThreadState {
        ThreadState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ThreadState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves `New -> Runnable`, failing if the descriptor isn't in `New`.
    pub(crate) fn start_from_new(&self) -> bool {
        self.0.compare_exchange(
            ThreadState::New as u8,
            ThreadState::Runnable as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        .is_ok()
    }
}
