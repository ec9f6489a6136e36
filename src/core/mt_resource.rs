use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is the handle through which chunks are shared between the world that
/// owns them, the update queue that tracks them and the scheduler that snapshots them.
/// It wraps an `Arc<RwLock<T>>`, so every clone refers to the same value.
///
/// Equality and hashing are by *identity*: two handles are equal only if they point at
/// the same allocation. This is what lets the update queue deduplicate chunks without
/// requiring `T: Eq + Hash`.
///
/// # Examples
///
/// ```
/// use voxel_chunk_mesher::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let same = counter.clone();
/// *same.get_mut() += 1;
///
/// assert_eq!(*counter.get(), 1);
/// assert_eq!(counter, same);
/// assert_ne!(counter, MtResource::new(1));
/// ```
///
/// # Poisoning
/// A panic while a guard is held does not make the resource unusable; the next
/// `get`/`get_mut` recovers the guard. Chunk voxel writes are single-value stores, so
/// a half-applied update cannot be observed.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard. Concurrent readers do not block each other.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive write guard.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles refer to the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    /// Number of live handles to this value.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync> PartialEq for MtResource<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: Send + Sync> Eq for MtResource<T> {}

impl<T: Send + Sync> Hash for MtResource<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.resource) as *const () as usize).hash(state);
    }
}

impl<T: Send + Sync> std::fmt::Debug for MtResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MtResource")
            .field("ptr", &Arc::as_ptr(&self.resource))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::MtResource;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn identity_not_value_equality() {
        let a = MtResource::new(7u8);
        let b = MtResource::new(7u8);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut set = HashSet::new();
        assert!(set.insert(a.clone()));
        assert!(!set.insert(a.clone()));
        assert!(set.insert(b));
    }

    #[test]
    fn shared_between_threads() {
        let counter = MtResource::new(0u32);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || *counter.get_mut() += 1)
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.get(), 4);
        assert_eq!(counter.handle_count(), 1);
    }
}
