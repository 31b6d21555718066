use std::collections::VecDeque;

use cubit_chunk::ChunkCoord;
use hashbrown::HashMap;

/// FIFO of generation requests not yet handed to a worker, at most one per coordinate.
#[derive(Default, Debug)]
pub struct PendingQueue {
    order: VecDeque<ChunkCoord>,
    // coord -> epoch of the queued request
    queued: HashMap<ChunkCoord, u64>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `coord` is already queued; the earlier request wins.
    pub fn push(&mut self, coord: ChunkCoord, epoch: u64) -> bool {
        if self.queued.contains_key(&coord) {
            return false;
        }
        self.queued.insert(coord, epoch);
        self.order.push_back(coord);
        true
    }

    pub fn cancel(&mut self, coord: ChunkCoord) -> bool {
        if self.queued.remove(&coord).is_none() {
            return false;
        }
        self.order.retain(|c| *c != coord);
        true
    }

    pub fn pop(&mut self) -> Option<(ChunkCoord, u64)> {
        let coord = self.order.pop_front()?;
        let epoch = self.queued.remove(&coord)?;
        Some((coord, epoch))
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.queued.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x, 0, z)
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut q = PendingQueue::new();
        assert!(q.push(c(0, 0), 1));
        assert!(q.push(c(1, 0), 2));
        assert!(!q.push(c(0, 0), 3));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some((c(0, 0), 1)));
        assert_eq!(q.pop(), Some((c(1, 0), 2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn cancel_drops_only_that_coordinate() {
        let mut q = PendingQueue::new();
        q.push(c(0, 0), 1);
        q.push(c(0, 1), 1);
        q.push(c(0, 2), 1);
        assert!(q.cancel(c(0, 1)));
        assert!(!q.cancel(c(5, 5)));
        assert!(!q.contains(c(0, 1)));
        assert_eq!(q.pop().map(|p| p.0), Some(c(0, 0)));
        assert_eq!(q.pop().map(|p| p.0), Some(c(0, 2)));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_coordinate_can_be_requested_again() {
        let mut q = PendingQueue::new();
        q.push(c(3, 3), 1);
        q.cancel(c(3, 3));
        assert!(q.push(c(3, 3), 7));
        assert_eq!(q.pop(), Some((c(3, 3), 7)));
    }
}
