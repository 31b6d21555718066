use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::{CHUNK_VOLUME, ChunkCoord, LIGHT_MAX, LIGHT_UNRESOLVED};

/// Serialized chunk shape exchanged with the generation worker and archives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub coord: [i32; 3],
    pub block_type: Vec<u8>,
    pub metadata: Vec<u8>,
    pub sky_light: Vec<i8>,
    pub block_light: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    LengthMismatch {
        channel: &'static str,
        expected: usize,
        found: usize,
    },
    OutOfVerticalRange(ChunkCoord),
    LightOutOfRange {
        channel: &'static str,
        value: i8,
    },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::LengthMismatch {
                channel,
                expected,
                found,
            } => write!(f, "{channel}: expected {expected} cells, found {found}"),
            ChunkError::OutOfVerticalRange(c) => {
                write!(f, "chunk {c} is outside the loadable vertical layer")
            }
            ChunkError::LightOutOfRange { channel, value } => {
                write!(f, "{channel}: light value {value} outside 0..={LIGHT_MAX}")
            }
        }
    }
}

impl Error for ChunkError {}

fn check_len(channel: &'static str, found: usize) -> Result<(), ChunkError> {
    if found != CHUNK_VOLUME {
        return Err(ChunkError::LengthMismatch {
            channel,
            expected: CHUNK_VOLUME,
            found,
        });
    }
    Ok(())
}

fn check_light(channel: &'static str, values: &[i8]) -> Result<(), ChunkError> {
    match values
        .iter()
        .find(|&&v| (v as i32) < 0 || (v as i32) > LIGHT_MAX)
    {
        Some(&value) => Err(ChunkError::LightOutOfRange { channel, value }),
        None => Ok(()),
    }
}

impl ChunkRecord {
    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.coord[0], self.coord[1], self.coord[2])
    }
}

impl Chunk {
    /// Snapshot for persistence. Unresolved light is stored as 0.
    pub fn to_record(&self) -> ChunkRecord {
        let (blocks, metadata, sky, block_light) = self.channels();
        let clamp = |v: &i8| if *v == LIGHT_UNRESOLVED as i8 { 0 } else { *v };
        if self.has_unresolved_light() {
            log::warn!("chunk {} snapshotted with unresolved light", self.coord);
        }
        ChunkRecord {
            coord: [self.coord.cx, self.coord.cy, self.coord.cz],
            block_type: blocks.to_vec(),
            metadata: metadata.to_vec(),
            sky_light: sky.iter().map(clamp).collect(),
            block_light: block_light.iter().map(clamp).collect(),
        }
    }

    pub fn from_record(rec: ChunkRecord) -> Result<Chunk, ChunkError> {
        check_len("blockType", rec.block_type.len())?;
        check_len("metadata", rec.metadata.len())?;
        check_len("skyLight", rec.sky_light.len())?;
        check_len("blockLight", rec.block_light.len())?;
        check_light("skyLight", &rec.sky_light)?;
        check_light("blockLight", &rec.block_light)?;
        let coord = rec.coord();
        Ok(Chunk::from_parts(
            coord,
            rec.block_type,
            rec.metadata,
            rec.sky_light,
            rec.block_light,
        ))
    }
}
