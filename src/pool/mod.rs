//! Generic free-list pool for reusable scene objects
//!
//! Scattered objects that map to host-engine resources (tree visuals) are
//! acquired from a pool and released back when their parcel recycles, so the
//! host never churns allocations during streaming.

/// LIFO free-list pool.
///
/// `get` pops the most recently released item or constructs a new one via the
/// pool's factory. Dropping the pool drops all held items. No reuse ordering
/// guarantee beyond LIFO.
pub struct ObjectPool<T> {
    free: Vec<T>,
    create: Box<dyn FnMut() -> T + Send>,
    allocated: usize,
}

impl<T> ObjectPool<T> {
    pub fn new(create: impl FnMut() -> T + Send + 'static) -> Self {
        Self {
            free: Vec::new(),
            create: Box::new(create),
            allocated: 0,
        }
    }

    /// Pop the last released item, or construct a new one
    pub fn get(&mut self) -> T {
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.allocated += 1;
                (self.create)()
            }
        }
    }

    /// Return an item for later reuse
    pub fn release(&mut self, item: T) {
        self.free.push(item);
    }

    /// Number of items currently available for reuse
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total items ever constructed by this pool
    pub fn allocated_count(&self) -> usize {
        self.allocated
    }
}
