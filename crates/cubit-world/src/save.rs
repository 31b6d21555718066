use std::collections::VecDeque;

use cubit_chunk::{ChunkCoord, ChunkRecord};
use hashbrown::{HashMap, HashSet};

/// Edited chunks waiting to be written out, released at a fixed tick interval.
#[derive(Debug)]
pub struct SaveQueue {
    order: VecDeque<ChunkCoord>,
    members: HashSet<ChunkCoord>,
    // snapshots of queued chunks that left the window before their turn
    parked: HashMap<ChunkCoord, ChunkRecord>,
    interval: u64,
    last: Option<u64>,
}

impl SaveQueue {
    pub fn new(interval: u64) -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
            parked: HashMap::new(),
            interval,
            last: None,
        }
    }

    /// Queues `coord` unless it is already waiting. Returns true when newly queued.
    pub fn push(&mut self, coord: ChunkCoord) -> bool {
        if !self.members.insert(coord) {
            return false;
        }
        self.order.push_back(coord);
        true
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.members.contains(&coord)
    }

    /// Keeps the final state of a queued chunk that is being dropped from memory.
    pub fn park(&mut self, record: ChunkRecord) {
        let coord = record.coord();
        if self.contains(coord) {
            self.parked.insert(coord, record);
        }
    }

    /// Hands back the parked record of a chunk that is being loaded again. The
    /// coordinate stays queued; its save will snapshot the live chunk instead.
    pub fn unpark(&mut self, coord: ChunkCoord) -> Option<ChunkRecord> {
        self.parked.remove(&coord)
    }

    /// Releases the oldest queued chunk once `interval` ticks have passed since the
    /// previous release. `snapshot` supplies the record of a chunk still in memory.
    pub fn take_due<F>(&mut self, now: u64, snapshot: F) -> Option<ChunkRecord>
    where
        F: FnOnce(ChunkCoord) -> Option<ChunkRecord>,
    {
        if let Some(last) = self.last {
            if now.saturating_sub(last) < self.interval {
                return None;
            }
        }
        let coord = self.order.pop_front()?;
        self.members.remove(&coord);
        self.last = Some(now);
        let record = self.parked.remove(&coord).or_else(|| snapshot(coord));
        if record.is_none() {
            log::warn!("save queue: chunk {coord} vanished before it was written");
        }
        record
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
    use cubit_chunk::Chunk;

    fn snap(coord: ChunkCoord) -> Option<ChunkRecord> {
        Some(Chunk::new(coord).to_record())
    }

    #[test]
    fn duplicates_are_queued_once() {
        let mut q = SaveQueue::new(10);
        let c = ChunkCoord::new(1, 0, 1);
        assert!(q.push(c));
        assert!(!q.push(c));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn one_chunk_per_interval() {
        let mut q = SaveQueue::new(10);
        q.push(ChunkCoord::new(0, 0, 0));
        q.push(ChunkCoord::new(1, 0, 0));
        let first = q.take_due(3, snap).unwrap();
        assert_eq!(first.coord(), ChunkCoord::new(0, 0, 0));
        assert!(q.take_due(12, snap).is_none());
        let second = q.take_due(13, snap).unwrap();
        assert_eq!(second.coord(), ChunkCoord::new(1, 0, 0));
        assert!(q.is_empty());
    }

    #[test]
    fn parked_record_wins_over_snapshot() {
        let mut q = SaveQueue::new(1);
        let c = ChunkCoord::new(2, 0, 2);
        q.push(c);
        let mut chunk = Chunk::new(c);
        chunk.set_local(0, 0, 0, cubit_chunk::Channel::Blocks, 7);
        q.park(chunk.to_record());
        let rec = q.take_due(0, |_| None).unwrap();
        assert_eq!(rec, chunk.to_record());
    }

    #[test]
    fn unparked_chunk_stays_queued_and_saves_live_state() {
        let mut q = SaveQueue::new(1);
        let c = ChunkCoord::new(3, 0, 0);
        q.push(c);
        q.park(Chunk::new(c).to_record());
        assert!(q.unpark(c).is_some());
        assert!(q.unpark(c).is_none());
        assert!(q.contains(c));
        let mut live = Chunk::new(c);
        live.set_local(1, 1, 1, cubit_chunk::Channel::Blocks, 4);
        let rec = q.take_due(0, |_| Some(live.to_record())).unwrap();
        assert_eq!(rec, live.to_record());
    }

    #[test]
    fn requeue_after_release() {
        let mut q = SaveQueue::new(0);
        let c = ChunkCoord::new(0, 0, 0);
        q.push(c);
        q.take_due(0, snap);
        assert!(q.push(c));
    }
}
