//! Capacity-bounded concurrent append buffer
//!
//! Parallel scatter tasks append instances with a lock-free bump allocation:
//! each push claims a unique slot index; pushes beyond capacity are refused
//! without blocking or corrupting earlier writes. The buffer is drained
//! single-threaded after the parallel phase joins.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity append-only buffer with lock-free concurrent pushes.
///
/// `T: Copy` keeps slot reuse trivial: cleared slots need no drop.
pub struct AppendBuffer<T: Copy> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// All push attempts; may exceed capacity when the buffer overflows
    attempted: AtomicUsize,
}

// Writers race only on the `attempted` counter; each claimed slot is written
// by exactly one thread, and slots are only read after the parallel phase
// joins (`as_slice` takes `&mut self`).
unsafe impl<T: Copy + Send> Sync for AppendBuffer<T> {}

impl<T: Copy> AppendBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
            attempted: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Append a value; returns `false` when the buffer is full.
    ///
    /// Safe to call from many threads at once.
    pub fn push(&self, value: T) -> bool {
        let index = self.attempted.fetch_add(1, Ordering::Relaxed);
        if index >= self.slots.len() {
            return false;
        }
        // Unique index: no other thread writes this slot
        unsafe { (*self.slots[index].get()).write(value) };
        true
    }

    /// Number of values actually stored
    pub fn len(&self) -> usize {
        self.attempted.load(Ordering::Relaxed).min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pushes refused since the last clear
    pub fn overflow(&self) -> usize {
        self.attempted
            .load(Ordering::Relaxed)
            .saturating_sub(self.slots.len())
    }

    /// View the stored values. Exclusive access guarantees all writers joined.
    pub fn as_slice(&mut self) -> &[T] {
        let len = self.len();
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr() as *const T, len) }
    }

    /// Forget all stored values
    pub fn clear(&mut self) {
        self.attempted.store(0, Ordering::Relaxed);
    }

    /// Grow capacity by the standard overflow factor (x1.1, at least +1).
    ///
    /// Discards current contents; intended between frames after an overflow.
    pub fn grow(&mut self) {
        let new_capacity = (self.slots.len() + self.slots.len() / 10).max(self.slots.len() + 1);
        *self = Self::new(new_capacity);
    }
}
