use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use rita_types::{RitaError, RitaResult};

/// Fixed-capacity, thread-safe command queue for a single tile: one
/// producer (the dispatching thread), one consumer (that tile's worker
/// thread). Mirrors the mutex + two-condvar design the teacher's own
/// worker/task queues use (`shared/worker.rs`, `backend_thread.rs`), with
/// the addition of an idle counter `finish()` polls to know every worker
/// is actually blocked, not just that its queue is momentarily empty.
pub struct TileQueue<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
    writable: Condvar,
    readable: Condvar,
    n_idle: AtomicUsize,
}

impl<T> TileQueue<T> {
    /// `capacity` must be a power of two, matching the original's
    /// ring-buffer wraparound-by-mask implementation.
    pub fn new(capacity: usize) -> RitaResult<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(RitaError::InvalidArgument(
                "tile queue capacity must be a power of two >= 2",
            ));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            writable: Condvar::new(),
            readable: Condvar::new(),
            n_idle: AtomicUsize::new(0),
        })
    }

    /// Blocks while the queue is full.
    pub fn push(&self, item: T) {
        let mut guard = self.inner.lock();
        while guard.len() >= self.capacity {
            self.writable.wait(&mut guard);
        }
        guard.push_back(item);
        self.readable.notify_one();
    }

    /// Blocks while the queue is empty, tracking idle time in `n_idle` so
    /// `wait_until_idle` can tell a momentarily-empty queue apart from a
    /// worker that is actually parked.
    pub fn pop(&self) -> T {
        let mut guard = self.inner.lock();
        while guard.is_empty() {
            self.n_idle.fetch_add(1, Ordering::SeqCst);
            self.readable.wait(&mut guard);
            self.n_idle.fetch_sub(1, Ordering::SeqCst);
        }
        let item = guard.pop_front().expect("checked non-empty above");
        self.writable.notify_one();
        item
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Blocks until the queue is empty.
    fn wait_until_empty(&self) {
        let mut guard = self.inner.lock();
        while !guard.is_empty() {
            self.writable.wait(&mut guard);
        }
    }

    /// The `finish()` barrier primitive: blocks until the queue is empty
    /// *and* at least `n` consumers are parked on it. `n` is always 1 here
    /// (one worker per tile) but kept as a parameter to mirror the
    /// original macro's signature.
    pub fn wait_until_idle(&self, n: usize) {
        self.wait_until_empty();
        while self.n_idle.load(Ordering::SeqCst) < n {
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn rejects_non_power_of_two_capacity() {
        assert!(TileQueue::<i32>::new(0).is_err());
        assert!(TileQueue::<i32>::new(3).is_err());
        assert!(TileQueue::<i32>::new(7).is_err());
        assert!(TileQueue::<i32>::new(8).is_ok());
    }

    #[test]
    fn push_pop_preserves_fifo_order() {
        let q = TileQueue::<i32>::new(8).unwrap();
        for i in 0..5 {
            q.push(i);
        }
        for i in 0..5 {
            assert_eq!(q.pop(), i);
        }
    }

    #[test]
    fn blocked_consumer_is_unblocked_by_a_single_push() {
        let q = Arc::new(TileQueue::<i32>::new(2).unwrap());
        let q2 = q.clone();
        let handle = std::thread::spawn(move || q2.pop());
        // give the consumer a chance to park and register as idle.
        std::thread::sleep(Duration::from_millis(20));
        q.push(42);
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn wait_until_idle_returns_only_when_empty_and_idle() {
        let q = Arc::new(TileQueue::<i32>::new(4).unwrap());
        let q2 = q.clone();
        let handle = std::thread::spawn(move || loop {
            let _ = q2.pop();
        });
        q.wait_until_idle(1);
        assert!(q.is_empty());
        assert!(q.n_idle.load(Ordering::SeqCst) >= 1);
        drop(handle); // detach; process exit will reap it
    }
}
