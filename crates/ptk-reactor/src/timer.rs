use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Timer deadlines are coarsened to this floor — matches the granularity
/// `reactor_wait`'s poll loop actually achieves under load.
pub const MIN_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u64);

/// A one-shot callback wrapped to fit the same `FnMut` slot a periodic
/// timer's callback occupies; `expire` takes it out of `Option` on its one
/// and only invocation.
enum Callback {
    Periodic(Box<dyn FnMut() + Send>),
    Oneshot(Option<Box<dyn FnOnce() + Send>>),
}

impl Callback {
    fn fire(&mut self) {
        match self {
            Callback::Periodic(f) => f(),
            Callback::Oneshot(slot) => {
                if let Some(f) = slot.take() {
                    f();
                }
            }
        }
    }
}

struct Entry {
    deadline: Instant,
    id: TimerId,
    period: Option<Duration>,
    callback: Callback,
}

/// A min-heap of timer deadlines. `expire` is called once per
/// `Reactor::reactor_wait` wakeup; periodic timers reschedule themselves and
/// run again, one-shots run once and are dropped.
#[derive(Default)]
pub struct TimerWheel {
    heap: BinaryHeap<Reverse<(Instant, u64)>>,
    entries: std::collections::HashMap<u64, Entry>,
    next_id: u64,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    fn coerced(period: Duration) -> Duration {
        period.max(MIN_PERIOD)
    }

    pub fn start_oneshot(&mut self, after: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerId {
        let after = Self::coerced(after);
        let id = self.alloc_id();
        let deadline = Instant::now() + after;
        self.heap.push(Reverse((deadline, id.0)));
        self.entries.insert(id.0, Entry { deadline, id, period: None, callback: Callback::Oneshot(Some(callback)) });
        id
    }

    pub fn start_periodic(&mut self, period: Duration, callback: Box<dyn FnMut() + Send>) -> TimerId {
        let period = Self::coerced(period);
        let id = self.alloc_id();
        let deadline = Instant::now() + period;
        self.heap.push(Reverse((deadline, id.0)));
        self.entries
            .insert(id.0, Entry { deadline, id, period: Some(period), callback: Callback::Periodic(callback) });
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.entries.remove(&id.0);
    }

    fn alloc_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Soonest deadline among live timers, if any.
    pub fn soonest(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Fires every timer whose deadline has passed, on the calling thread,
    /// rescheduling periodic ones and dropping one-shots. Returns the ids
    /// that fired.
    pub fn expire(&mut self) -> Vec<TimerId> {
        let now = Instant::now();
        let mut fired = Vec::new();
        while let Some(&Reverse((deadline, raw_id))) = self.heap.peek() {
            if deadline > now {
                break;
            }
            self.heap.pop();
            let Some(entry) = self.entries.get_mut(&raw_id) else {
                continue;
            };
            if entry.deadline != deadline {
                // stale heap entry for an id that's been rescheduled already.
                continue;
            }
            entry.callback.fire();
            fired.push(entry.id);
            match entry.period {
                Some(period) => {
                    let next_deadline = deadline + period;
                    entry.deadline = next_deadline;
                    self.heap.push(Reverse((next_deadline, raw_id)));
                }
                None => {
                    self.entries.remove(&raw_id);
                }
            }
        }
        fired
    }
}
