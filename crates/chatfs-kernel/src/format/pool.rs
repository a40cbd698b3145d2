//! Reusable object pool.
//!
//! Renders borrow scratch objects (row encoders, text buffers) instead of
//! allocating fresh ones. A [`Lease`] gives exclusive use of one object and
//! puts it back when dropped, including on early return through `?`, so a
//! failed render can't drain the pool.
//!
//! Contract: every object is [`Reset`] before it is handed out again.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Clears an object back to its freshly-created state.
pub trait Reset {
    fn reset(&mut self);
}

impl Reset for String {
    fn reset(&mut self) {
        self.clear();
    }
}

/// A pool of reusable objects.
///
/// Objects are created on demand when the pool is empty; at most `capacity`
/// idle objects are retained, extras are dropped on return.
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    create: Box<dyn Fn() -> T + Send + Sync>,
    capacity: usize,
}

impl<T: Reset> Pool<T> {
    /// Create a pool retaining at most `capacity` idle objects.
    pub fn new(capacity: usize, create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let capacity = capacity.max(1);
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            create: Box::new(create),
            capacity,
        }
    }

    /// Borrow an object, creating one if none is idle.
    pub fn acquire(&self) -> Lease<'_, T> {
        let idle = self.idle.lock().pop();
        let mut item = idle.unwrap_or_else(|| (self.create)());
        item.reset();
        Lease {
            pool: self,
            item: Some(item),
        }
    }

    /// Number of idle objects currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Maximum number of idle objects retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, item: T) {
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(item);
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Exclusive use of one pooled object; returned to the pool on drop.
pub struct Lease<'a, T: Reset> {
    pool: &'a Pool<T>,
    item: Option<T>,
}

impl<T: Reset> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("lease holds its item until dropped")
    }
}

impl<T: Reset> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("lease holds its item until dropped")
    }
}

impl<T: Reset> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_reuses_returned_objects() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let pool = Pool::new(4, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            String::new()
        });

        {
            let mut buf = pool.acquire();
            buf.push_str("scratch");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty(), "object must be reset before reuse");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_leases_are_distinct() {
        let pool = Pool::new(4, String::new);
        let mut a = pool.acquire();
        let mut b = pool.acquire();
        a.push('a');
        b.push('b');
        assert_eq!(a.as_str(), "a");
        assert_eq!(b.as_str(), "b");
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_returned_on_error_path() {
        fn fails(pool: &Pool<String>) -> Result<(), &'static str> {
            let mut buf = pool.acquire();
            buf.push_str("partial");
            Err("boom")?;
            Ok(())
        }

        let pool = Pool::new(2, String::new);
        assert!(fails(&pool).is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_capacity_bounds_idle() {
        let pool = Pool::new(1, String::new);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let pool = Arc::new(Pool::new(8, String::new));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.acquire();
                        assert!(buf.is_empty());
                        buf.push_str(&i.to_string());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}
