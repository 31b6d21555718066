use cubit_chunk::{ChunkCoord, MeshHandle};
use cubit_mesh_cpu::MeshBuild;

const USAGE_FRESH: u8 = 2;

/// Rendering cube that owns a mesh slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeKey {
    pub chunk: ChunkCoord,
    pub cube: usize,
}

#[derive(Debug, Default)]
struct MeshSlot {
    mesh: Option<MeshBuild>,
    owner: Option<CubeKey>,
    usage: u8,
}

/// Index-addressed mesh storage. Slots not used for two frames are handed to the
/// next allocation.
#[derive(Debug, Default)]
pub struct MeshArena {
    slots: Vec<MeshSlot>,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a slot for `owner`. When a reclaimed slot had a previous owner it is
    /// returned so the caller can clear that cube's handle.
    pub fn alloc(&mut self, owner: CubeKey) -> (MeshHandle, Option<CubeKey>) {
        let id = match self.slots.iter().position(|s| s.usage == 0) {
            Some(id) => id,
            None => {
                self.slots.push(MeshSlot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[id];
        let prev = slot.owner.replace(owner);
        slot.mesh = None;
        slot.usage = USAGE_FRESH;
        (MeshHandle(id as u32), prev)
    }

    pub fn replace(&mut self, h: MeshHandle, mesh: MeshBuild) {
        if let Some(slot) = self.slots.get_mut(h.0 as usize) {
            slot.mesh = Some(mesh);
        }
    }

    /// Drops the mesh and marks the slot free.
    pub fn release(&mut self, h: MeshHandle) {
        if let Some(slot) = self.slots.get_mut(h.0 as usize) {
            *slot = MeshSlot::default();
        }
    }

    pub fn get(&self, h: MeshHandle) -> Option<&MeshBuild> {
        self.slots.get(h.0 as usize)?.mesh.as_ref()
    }

    pub fn owner(&self, h: MeshHandle) -> Option<CubeKey> {
        self.slots.get(h.0 as usize)?.owner
    }

    #[inline]
    pub fn mark_used(&mut self, h: MeshHandle) {
        if let Some(slot) = self.slots.get_mut(h.0 as usize) {
            slot.usage = USAGE_FRESH;
        }
    }

    pub fn decay(&mut self) {
        for s in &mut self.slots {
            s.usage = s.usage.saturating_sub(1);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots currently holding a mesh.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.mesh.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(cube: usize) -> CubeKey {
        CubeKey {
            chunk: ChunkCoord::new(0, 0, 0),
            cube,
        }
    }

    #[test]
    fn fresh_slots_are_not_shared() {
        let mut a = MeshArena::new();
        let (h0, _) = a.alloc(key(0));
        let (h1, _) = a.alloc(key(1));
        assert_ne!(h0, h1);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn idle_slot_is_reclaimed_with_its_owner_reported() {
        let mut a = MeshArena::new();
        let (h0, _) = a.alloc(key(0));
        a.replace(h0, MeshBuild::new([0, 0, 0]));
        a.decay();
        a.decay();
        let (h1, prev) = a.alloc(key(3));
        assert_eq!(h1, h0);
        assert_eq!(prev, Some(key(0)));
        assert!(a.get(h1).is_none());
        assert_eq!(a.owner(h1), Some(key(3)));
    }

    #[test]
    fn marking_used_keeps_a_slot_alive() {
        let mut a = MeshArena::new();
        let (h0, _) = a.alloc(key(0));
        a.decay();
        a.mark_used(h0);
        a.decay();
        let (h1, _) = a.alloc(key(1));
        assert_ne!(h0, h1);
    }

    #[test]
    fn released_slot_is_free_immediately() {
        let mut a = MeshArena::new();
        let (h0, _) = a.alloc(key(0));
        a.release(h0);
        let (h1, prev) = a.alloc(key(1));
        assert_eq!(h0, h1);
        assert_eq!(prev, None);
    }
}
