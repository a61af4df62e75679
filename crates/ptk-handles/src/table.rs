use std::any::Any;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::error::HandleError;
use crate::guard::Guard;
use crate::handle::Handle;

/// Ref counts saturate at this ceiling; an `acquire` that would push a slot
/// past it fails with [`HandleError::NoResources`] instead of wrapping.
pub const REF_COUNT_CEILING: u32 = 1 << 24;

/// Default size of the process-wide singleton table.
pub const DEFAULT_CAPACITY: usize = 4096;

type DisposeFn = dyn FnOnce(Box<dyn Any + Send>) + Send;

struct SlotState {
    locked: bool,
    /// Set for the duration of `dispose_fn`'s call in `drop_ref`, after
    /// `object`/`dispose` have already been taken out of this state (so the
    /// object itself is `None` while this is `true`). `make` must refuse a
    /// slot with this set even though `object` already reads `None` —
    /// otherwise a slot could be handed to a new `make` before the previous
    /// occupant's `dispose_fn` has actually run, violating the
    /// dispose-exactly-once-before-reuse invariant.
    disposing: bool,
    object: Option<Box<dyn Any + Send>>,
    dispose: Option<Box<DisposeFn>>,
}

struct Slot {
    generation: AtomicU32,
    ref_count: AtomicU32,
    inner: Mutex<SlotState>,
    cv: Condvar,
}

impl Slot {
    fn new() -> Self {
        Slot {
            generation: AtomicU32::new(0),
            ref_count: AtomicU32::new(0),
            inner: Mutex::new(SlotState { locked: false, disposing: false, object: None, dispose: None }),
            cv: Condvar::new(),
        }
    }
}

/// A fixed-capacity registry of generation+slot handles over type-erased,
/// ref-counted, mutex-guarded objects.
///
/// `make` claims a free slot, `acquire` grants exclusive access for up to a
/// timeout, `release` (via dropping the returned [`Guard`]) hands it back
/// and disposes the object exactly once the ref count reaches zero.
pub struct HandleTable {
    slots: Vec<Slot>,
}

impl HandleTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::new);
        HandleTable { slots }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Allocates a slot for `object`, setting `ref_count = 1`. `dispose` runs
    /// exactly once, outside any internal lock, when the ref count returns
    /// to zero.
    ///
    /// A slot is claimable only once `drop_ref` has cleared both
    /// `state.object` and `state.disposing` — the latter stays set for the
    /// whole time `dispose_fn` is running, so a slot mid-disposal can never
    /// be handed out to a new `make` before `dispose_fn` has actually
    /// returned (see `drop_ref`).
    pub fn make<T, D>(&self, object: T, dispose: D) -> Result<Handle, HandleError>
    where
        T: Any + Send + 'static,
        D: FnOnce(T) + Send + 'static,
    {
        for (idx, slot) in self.slots.iter().enumerate() {
            // Cheap lock-free skip over slots that are obviously still live;
            // the lock below is the sole source of truth for "free".
            if slot.ref_count.load(Ordering::Acquire) != 0 {
                continue;
            }
            let mut state = slot.inner.lock().unwrap();
            if state.object.is_some() || state.disposing {
                continue;
            }

            let erased_dispose: Box<DisposeFn> = Box::new(move |boxed: Box<dyn Any + Send>| {
                if let Ok(concrete) = boxed.downcast::<T>() {
                    dispose(*concrete);
                }
            });
            slot.ref_count.store(1, Ordering::Release);
            state.object = Some(Box::new(object));
            state.dispose = Some(erased_dispose);
            let generation = slot.generation.load(Ordering::Acquire);
            drop(state);
            return Ok(Handle { generation, slot: idx as u32 });
        }
        Err(HandleError::NoResources)
    }

    /// Validates `handle`, bumps the slot's ref count, then blocks on the
    /// slot's internal lock for up to `timeout`. Returns a [`Guard`] that
    /// releases both on drop.
    pub fn acquire<T: Any + Send + 'static>(&self, handle: Handle, timeout: Duration) -> Result<Guard<'_, T>, HandleError> {
        let slot = self.slots.get(handle.slot as usize).ok_or(HandleError::Invalid)?;
        if slot.generation.load(Ordering::Acquire) != handle.generation {
            return Err(HandleError::Invalid);
        }

        loop {
            let current = slot.ref_count.load(Ordering::Acquire);
            if current == 0 {
                return Err(HandleError::Invalid);
            }
            if current >= REF_COUNT_CEILING {
                return Err(HandleError::NoResources);
            }
            if slot.ref_count.compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire).is_ok() {
                break;
            }
        }

        let deadline = Instant::now() + timeout;
        let mut state = slot.inner.lock().unwrap();
        while state.locked {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                drop(state);
                self.drop_ref(handle.slot as usize);
                return Err(HandleError::Timeout);
            };
            let (next, wait_result) = slot.cv.wait_timeout(state, remaining).unwrap();
            state = next;
            if wait_result.timed_out() && state.locked {
                drop(state);
                self.drop_ref(handle.slot as usize);
                return Err(HandleError::Timeout);
            }
        }

        state.locked = true;
        let concrete = match state.object.as_deref_mut().and_then(|obj| obj.downcast_mut::<T>()) {
            Some(c) => NonNull::from(c),
            None => {
                drop(state);
                self.unlock(handle.slot as usize);
                self.drop_ref(handle.slot as usize);
                return Err(HandleError::Invalid);
            }
        };
        drop(state);

        Ok(Guard::new(self, handle.slot as usize, concrete))
    }

    pub(crate) fn unlock(&self, idx: usize) {
        let slot = &self.slots[idx];
        {
            let mut state = slot.inner.lock().unwrap();
            state.locked = false;
        }
        slot.cv.notify_one();
    }

    /// Decrements `idx`'s ref count; when it reaches zero, takes the object
    /// and dispose callback out of the slot, bumps the generation, and runs
    /// `dispose_fn` — outside the slot's `locked`-guarded critical section
    /// (so `dispose_fn` is free to acquire other handles), but the slot
    /// stays marked `disposing` the whole time so `make` cannot hand it out
    /// again until `dispose_fn` has returned.
    pub(crate) fn drop_ref(&self, idx: usize) {
        let slot = &self.slots[idx];
        let previous = slot.ref_count.fetch_sub(1, Ordering::AcqRel);
        ptk_utils::safe_assert_ne!(previous, 0, "drop_ref on slot {idx} with a zero ref count");
        if previous != 1 {
            return;
        }

        let (object, dispose) = {
            let mut state = slot.inner.lock().unwrap();
            state.disposing = true;
            (state.object.take(), state.dispose.take())
        };
        slot.generation.fetch_add(1, Ordering::AcqRel);
        if let (Some(object), Some(dispose)) = (object, dispose) {
            dispose(object);
        }
        slot.inner.lock().unwrap().disposing = false;
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        HandleTable::new(DEFAULT_CAPACITY)
    }
}

static PROCESS_TABLE: Lazy<HandleTable> = Lazy::new(HandleTable::default);

/// The process-wide handle table singleton, sized from
/// [`DEFAULT_CAPACITY`](crate::table::DEFAULT_CAPACITY) — see
/// `ToolkitConfig::handle_table_capacity` in the `ptk` facade crate for how
/// a host application would size a table of its own via [`HandleTable::new`]
/// instead of using this default.
#[must_use]
pub fn table() -> &'static HandleTable {
    &PROCESS_TABLE
}
