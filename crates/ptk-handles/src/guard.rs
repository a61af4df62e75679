use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::table::HandleTable;

/// RAII wrapper around a successful [`HandleTable::acquire`]. Dropping it
/// unlocks the slot and decrements its ref count, disposing the object if
/// the count reaches zero — callers never pair `acquire`/`release` by hand.
pub struct Guard<'a, T> {
    table: &'a HandleTable,
    idx: usize,
    ptr: NonNull<T>,
}

impl<'a, T> Guard<'a, T> {
    pub(crate) fn new(table: &'a HandleTable, idx: usize, ptr: NonNull<T>) -> Self {
        Guard { table, idx, ptr }
    }
}

impl<T> Deref for Guard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the slot is locked for the lifetime of this guard, and the
        // pointee's address is stable because the owning `Box` is never
        // moved while the object is present.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for Guard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see `Deref::deref`; the guard holds exclusive access.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for Guard<'_, T> {
    fn drop(&mut self) {
        self.table.unlock(self.idx);
        self.table.drop_ref(self.idx);
    }
}

// SAFETY: access through the guard is serialized by the slot's internal
// lock, so it's sound to move the guard itself (and the `T` it reaches)
// across threads as long as `T` is `Send`.
unsafe impl<T: Send> Send for Guard<'_, T> {}
