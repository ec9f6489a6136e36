//! # Update Queue
//!
//! A FIFO queue with set semantics: an item already waiting is never queued a second
//! time. Dirty chunks go through this queue on their way to the batch scheduler, so a
//! chunk edited many times between two batches is remeshed once.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use crate::core::MtResource;
use crate::engine_state::voxels::chunk::ChunkRef;
use crate::error::{VoxelError, VoxelResult};

/// Deduplicating FIFO queue.
///
/// `members` always holds exactly the items in `queue`.
#[derive(Debug)]
pub struct UniqueQueue<T: Eq + Hash + Clone> {
    queue: VecDeque<T>,
    members: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Default for UniqueQueue<T> {
    fn default() -> Self {
        UniqueQueue {
            queue: VecDeque::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> UniqueQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` unless it is already queued. Returns `true` if it was added.
    pub fn enqueue(&mut self, item: T) -> bool {
        if !self.members.insert(item.clone()) {
            return false;
        }
        self.queue.push_back(item);
        true
    }

    /// Removes and returns the front item.
    ///
    /// # Errors
    /// `EmptyQueue` if nothing is queued.
    pub fn dequeue(&mut self) -> VoxelResult<T> {
        let item = self.queue.pop_front().ok_or(VoxelError::EmptyQueue)?;
        self.members.remove(&item);
        Ok(item)
    }

    /// The front item, if any.
    pub fn peek(&self) -> Option<&T> {
        self.queue.front()
    }

    /// Returns `true` if `item` is waiting in the queue.
    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued item.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.members.clear();
    }

    /// Iterates queued items front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }
}

/// Cloneable handle to the scheduler's queue of dirty chunks.
///
/// Worlds hold one of these and submit chunks after every effective write; the
/// [`MeshManager`](super::MeshManager) drains the same queue.
#[derive(Clone, Debug)]
pub struct SharedUpdateQueue {
    queue: MtResource<UniqueQueue<ChunkRef>>,
}

impl SharedUpdateQueue {
    /// Creates an empty shared queue.
    pub fn new() -> Self {
        SharedUpdateQueue {
            queue: MtResource::new(UniqueQueue::new()),
        }
    }

    /// Marks a chunk dirty. Returns `true` if it was not already waiting.
    pub fn submit(&self, chunk: ChunkRef) -> bool {
        self.queue.get_mut().enqueue(chunk)
    }

    /// Takes up to `max` chunks from the front, in queue order.
    pub(crate) fn take_batch(&self, max: usize) -> Vec<ChunkRef> {
        let mut queue = self.queue.get_mut();
        let size = max.min(queue.len());
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            match queue.dequeue() {
                Ok(chunk) => batch.push(chunk),
                Err(_) => break,
            }
        }
        batch
    }

    /// Returns `true` if `chunk` is waiting to be remeshed.
    pub fn contains(&self, chunk: &ChunkRef) -> bool {
        self.queue.get().contains(chunk)
    }

    /// Number of chunks waiting.
    pub fn len(&self) -> usize {
        self.queue.get().len()
    }

    /// Returns `true` if no chunk is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.get().is_empty()
    }
}

impl Default for SharedUpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_enqueue_is_ignored() {
        let mut queue = UniqueQueue::new();
        assert!(queue.enqueue("a"));
        assert!(!queue.enqueue("a"));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.dequeue().unwrap(), "a");
        assert!(queue.is_empty());

        assert!(queue.enqueue("a"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn preserves_first_enqueue_order() {
        let mut queue = UniqueQueue::new();
        for item in [3, 1, 3, 2, 1, 4] {
            queue.enqueue(item);
        }
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2, 4]);
        assert_eq!(queue.peek(), Some(&3));
        assert!(queue.contains(&2));
        assert!(!queue.contains(&5));
    }

    #[test]
    fn dequeue_on_empty_fails() {
        let mut queue: UniqueQueue<u32> = UniqueQueue::new();
        assert!(matches!(queue.dequeue(), Err(VoxelError::EmptyQueue)));
    }

    #[test]
    fn clear_resets_membership() {
        let mut queue = UniqueQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.enqueue(1));
    }
}
