use cubit_chunk::{Chunk, ChunkCoord};
use hashbrown::HashMap;

/// Frames a slot survives without being looked at.
const USAGE_FRESH: u8 = 2;

#[derive(Debug)]
pub enum SlotState {
    Pending { epoch: u64 },
    Ready(Box<Chunk>),
}

#[derive(Debug)]
pub struct ChunkSlot {
    pub coord: ChunkCoord,
    pub state: SlotState,
}

impl ChunkSlot {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    Ready,
    Pending,
    /// Outside the loadable layer; never requested.
    Absent,
}

#[derive(Debug)]
pub enum WindowEvent {
    Request { coord: ChunkCoord, epoch: u64 },
    Evicted(ChunkSlot),
}

#[derive(Debug, Default)]
struct PoolEntry {
    slot: Option<ChunkSlot>,
    window_index: usize,
    usage: u8,
}

/// Fixed-size window of chunk slots addressed by coordinate modulo the window edge.
///
/// Slots live in a usage-counted pool; one whose counter has decayed to zero is
/// reclaimed by the next allocation.
#[derive(Debug)]
pub struct ChunkWindow {
    mask: i32,
    edge: usize,
    index: HashMap<usize, usize>,
    pool: Vec<PoolEntry>,
    next_epoch: u64,
    events: Vec<WindowEvent>,
}

impl ChunkWindow {
    /// `edge` must be a power of two.
    pub fn new(edge: usize) -> Self {
        debug_assert!(edge.is_power_of_two());
        Self {
            mask: edge as i32 - 1,
            edge,
            index: HashMap::new(),
            pool: Vec::new(),
            next_epoch: 1,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn window_index(&self, c: ChunkCoord) -> usize {
        let e = self.edge;
        (c.cx & self.mask) as usize + (c.cz & self.mask) as usize * e + (c.cy & self.mask) as usize * e * e
    }

    fn entry(&self, coord: ChunkCoord) -> Option<&PoolEntry> {
        let id = *self.index.get(&self.window_index(coord))?;
        let entry = &self.pool[id];
        match &entry.slot {
            Some(slot) if slot.coord == coord => Some(entry),
            _ => None,
        }
    }

    pub fn slot(&self, coord: ChunkCoord) -> Option<&ChunkSlot> {
        self.entry(coord).and_then(|e| e.slot.as_ref())
    }

    /// Resolved chunk at `coord`, without side effects.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        match &self.slot(coord)?.state {
            SlotState::Ready(chunk) => Some(&**chunk),
            SlotState::Pending { .. } => None,
        }
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        let id = *self.index.get(&self.window_index(coord))?;
        match &mut self.pool[id].slot {
            Some(ChunkSlot {
                coord: c,
                state: SlotState::Ready(chunk),
            }) if *c == coord => Some(&mut **chunk),
            _ => None,
        }
    }

    /// Looks up `coord`, allocating a pending slot and queueing a request on a miss.
    ///
    /// A slot holding a different coordinate is evicted first.
    pub fn acquire(&mut self, coord: ChunkCoord) -> ChunkStatus {
        if coord.cy != 0 {
            return ChunkStatus::Absent;
        }
        let wi = self.window_index(coord);
        if let Some(&id) = self.index.get(&wi) {
            let stale = match &self.pool[id].slot {
                Some(slot) => slot.coord != coord,
                None => true,
            };
            if !stale {
                let entry = &mut self.pool[id];
                entry.usage = USAGE_FRESH;
                return match entry.slot.as_ref().map(|s| &s.state) {
                    Some(SlotState::Ready(_)) => ChunkStatus::Ready,
                    _ => ChunkStatus::Pending,
                };
            }
            log::debug!("window slot {wi} holds a stale chunk; requested {coord}");
            self.evict(id);
        }
        let id = self.alloc();
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let entry = &mut self.pool[id];
        entry.slot = Some(ChunkSlot {
            coord,
            state: SlotState::Pending { epoch },
        });
        entry.window_index = wi;
        entry.usage = USAGE_FRESH;
        self.index.insert(wi, id);
        self.events.push(WindowEvent::Request { coord, epoch });
        ChunkStatus::Pending
    }

    fn alloc(&mut self) -> usize {
        match self.pool.iter().position(|e| e.usage == 0) {
            Some(id) => {
                self.evict(id);
                id
            }
            None => {
                self.pool.push(PoolEntry::default());
                self.pool.len() - 1
            }
        }
    }

    fn evict(&mut self, id: usize) {
        let entry = &mut self.pool[id];
        entry.usage = 0;
        let Some(slot) = entry.slot.take() else {
            return;
        };
        if self.index.get(&entry.window_index) == Some(&id) {
            self.index.remove(&entry.window_index);
        }
        self.events.push(WindowEvent::Evicted(slot));
    }

    /// Installs a generated chunk if its slot is still waiting on `epoch`.
    pub fn resolve(&mut self, coord: ChunkCoord, epoch: u64, chunk: Chunk) -> bool {
        let Some(&id) = self.index.get(&self.window_index(coord)) else {
            return false;
        };
        let Some(slot) = self.pool[id].slot.as_mut() else {
            return false;
        };
        let waiting = matches!(slot.state, SlotState::Pending { epoch: e } if e == epoch);
        if slot.coord != coord || !waiting {
            return false;
        }
        slot.state = SlotState::Ready(Box::new(chunk));
        true
    }

    /// Ages every slot by one frame.
    pub fn decay_usage(&mut self) {
        for e in &mut self.pool {
            e.usage = e.usage.saturating_sub(1);
        }
    }

    pub fn drain_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn ready_count(&self) -> usize {
        self.pool
            .iter()
            .filter(|e| matches!(e.slot, Some(ChunkSlot { state: SlotState::Ready(_), .. })))
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.pool
            .iter()
            .filter(|e| e.slot.as_ref().is_some_and(ChunkSlot::is_pending))
            .count()
    }

    pub fn ready_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.pool.iter().filter_map(|e| match &e.slot {
            Some(ChunkSlot {
                state: SlotState::Ready(c),
                ..
            }) => Some(&**c),
            _ => None,
        })
    }
}
