//! Generation+slot handle table for safe cross-thread transfer of heap
//! objects: `make` allocates a ref-counted, mutex-guarded slot; `acquire`
//! grants exclusive, timeout-bounded access via a [`Guard`]; dropping the
//! guard releases and disposes exactly once the ref count reaches zero.

mod error;
mod guard;
mod handle;
mod table;

pub use error::HandleError;
pub use guard::Guard;
pub use handle::Handle;
pub use table::{HandleTable, REF_COUNT_CEILING, table};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn make_acquire_release_round_trip() {
        let table = HandleTable::new(8);
        let disposed = Arc::new(AtomicUsize::new(0));
        let d = disposed.clone();
        let handle = table.make(42i32, move |_v| { d.fetch_add(1, Ordering::SeqCst); }).unwrap();

        {
            let mut guard = table.acquire::<i32>(handle, Duration::from_millis(100)).unwrap();
            assert_eq!(*guard, 42);
            *guard = 7;
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 1, "ref count reached zero on release, so dispose ran");
    }

    #[test]
    fn dispose_runs_exactly_once_when_ref_count_hits_zero() {
        let table = HandleTable::new(8);
        let disposed = Arc::new(AtomicUsize::new(0));
        let d = disposed.clone();
        let handle = table.make(String::from("hi"), move |_v| { d.fetch_add(1, Ordering::SeqCst); }).unwrap();

        let guard = table.acquire::<String>(handle, Duration::from_millis(100)).unwrap();
        drop(guard);
        assert_eq!(disposed.load(Ordering::SeqCst), 1);

        // the generation has advanced, so the stale handle can never acquire again.
        let err = table.acquire::<String>(handle, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err, HandleError::Invalid);
    }

    #[test]
    fn stale_handle_after_recycle_is_invalid() {
        let table = HandleTable::new(1);
        let h1 = table.make(1u32, |_| {}).unwrap();
        drop(table.acquire::<u32>(h1, Duration::from_millis(10)).unwrap());

        let h2 = table.make(2u32, |_| {}).unwrap();
        assert_eq!(h1.slot(), h2.slot());
        assert_ne!(h1.generation(), h2.generation());
        assert_eq!(table.acquire::<u32>(h1, Duration::from_millis(10)).unwrap_err(), HandleError::Invalid);
        assert_eq!(*table.acquire::<u32>(h2, Duration::from_millis(10)).unwrap(), 2);
    }

    #[test]
    fn table_full_fails_with_no_resources() {
        let table = HandleTable::new(1);
        let _h = table.make(1u32, |_| {}).unwrap();
        assert_eq!(table.make(2u32, |_| {}).unwrap_err(), HandleError::NoResources);
    }

    #[test]
    fn acquire_blocks_until_the_holder_releases() {
        let table = Arc::new(HandleTable::new(1));
        let handle = table.make(0u32, |_| {}).unwrap();
        let t = table.clone();

        let first = table.acquire::<u32>(handle, Duration::from_millis(500)).unwrap();
        let worker = thread::spawn(move || t.acquire::<u32>(handle, Duration::from_millis(500)));

        thread::sleep(Duration::from_millis(100));
        drop(first);
        assert_eq!(*worker.join().unwrap().unwrap(), 0);
    }

    #[test]
    fn acquire_times_out_when_lock_never_frees() {
        let table = Arc::new(HandleTable::new(1));
        let handle = table.make(0u32, |_| {}).unwrap();
        let holder = table.acquire::<u32>(handle, Duration::from_millis(500)).unwrap();

        let err = table.acquire::<u32>(handle, Duration::from_millis(30)).unwrap_err();
        assert_eq!(err, HandleError::Timeout);
        drop(holder);
    }

    #[test]
    fn downcast_mismatch_is_invalid() {
        let table = HandleTable::new(4);
        let handle = table.make(1u32, |_| {}).unwrap();
        let err = table.acquire::<String>(handle, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err, HandleError::Invalid);
    }

    #[test]
    fn concurrent_release_and_make_never_skips_or_double_runs_dispose() {
        // A single-slot table forces every `make` across all four workers to
        // land on the one slot the previous handle just vacated, racing
        // `drop_ref`'s dispose against a concurrent `make`'s claim (see
        // `HandleTable::make`/`drop_ref`). Each worker's own life cycle
        // (make -> acquire -> release -> drop_ref) is fully sequential, so
        // `disposed == made` must hold regardless of interleaving; it would
        // drift under the race this guards against (a dispose skipped, or a
        // slot's new occupant disposed before its creator ever released it).
        let table = Arc::new(HandleTable::new(1));
        let disposed = Arc::new(AtomicUsize::new(0));
        let made = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                let disposed = disposed.clone();
                let made = made.clone();
                thread::spawn(move || {
                    for round in 0..200u32 {
                        let handle = loop {
                            let d = disposed.clone();
                            match table.make(round, move |_v| {
                                d.fetch_add(1, Ordering::SeqCst);
                            }) {
                                Ok(h) => break h,
                                Err(HandleError::NoResources) => {
                                    thread::yield_now();
                                    continue;
                                }
                                Err(other) => panic!("unexpected make error: {other:?}"),
                            }
                        };
                        made.fetch_add(1, Ordering::SeqCst);
                        let guard = table.acquire::<u32>(handle, Duration::from_millis(50)).unwrap();
                        assert_eq!(*guard, round);
                        drop(guard);
                        table.drop_ref(handle.slot() as usize);
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(disposed.load(Ordering::SeqCst), made.load(Ordering::SeqCst));
    }

    #[test]
    fn process_wide_table_is_reachable() {
        let handle = table().make(9i64, |_| {}).unwrap();
        assert_eq!(*table().acquire::<i64>(handle, Duration::from_millis(10)).unwrap(), 9);
    }
}
