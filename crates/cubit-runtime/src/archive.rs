use std::error::Error;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cubit_chunk::{ChunkCoord, ChunkRecord};
use hashbrown::HashMap;

/// Persistent chunk storage consulted before generating and written after.
pub trait ChunkArchive: Send + Sync {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkRecord>, Box<dyn Error>>;
    fn save(&self, record: &ChunkRecord) -> Result<(), Box<dyn Error>>;
}

/// Shared in-process archive; clones see the same map.
#[derive(Clone, Default)]
pub struct MemoryArchive {
    map: Arc<Mutex<HashMap<ChunkCoord, ChunkRecord>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.map.lock().map(|m| m.contains_key(&coord)).unwrap_or(false)
    }
}

impl ChunkArchive for MemoryArchive {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkRecord>, Box<dyn Error>> {
        let map = self.map.lock().map_err(|_| "memory archive lock poisoned")?;
        Ok(map.get(&coord).cloned())
    }

    fn save(&self, record: &ChunkRecord) -> Result<(), Box<dyn Error>> {
        let mut map = self.map.lock().map_err(|_| "memory archive lock poisoned")?;
        map.insert(record.coord(), record.clone());
        Ok(())
    }
}

/// One JSON file per chunk under a directory.
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        log::info!("chunk archive at {}", root.display());
        Ok(Self { root })
    }

    pub fn path_for(&self, coord: ChunkCoord) -> PathBuf {
        self.root
            .join(format!("chunk_{}_{}_{}.json", coord.cx, coord.cy, coord.cz))
    }
}

impl ChunkArchive for DirArchive {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkRecord>, Box<dyn Error>> {
        let text = match fs::read_to_string(self.path_for(coord)) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let rec: ChunkRecord = serde_json::from_str(&text)?;
        if rec.coord() != coord {
            return Err(format!("archive file for {coord} holds chunk {}", rec.coord()).into());
        }
        Ok(Some(rec))
    }

    fn save(&self, record: &ChunkRecord) -> Result<(), Box<dyn Error>> {
        let path = self.path_for(record.coord());
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
