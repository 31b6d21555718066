use std::cell::Cell;

use cubit_blocks::{Block, BlockRegistry, BlockType, FaceTable, RenderPass, Shape, Tint};
use cubit_chunk::{Channel, Voxels};
use cubit_geom::Face;
use cubit_lighting::attenuation;

use crate::mesh_build::{MeshBuild, Quad};
use crate::tables::{CROSS_CORNERS, CROSS_NORMALS, atlas_uv, corners};

#[derive(Clone, Copy, Debug)]
pub struct MeshOptions {
    pub smooth_lighting: bool,
    // Lower fluid surfaces by level; off meshes fluids as plain cubes
    pub fluid_shaping: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            smooth_lighting: true,
            fluid_shaping: false,
        }
    }
}

type Pos = (i32, i32, i32);

/// Face set drawn for one block position: the block itself or its underlay.
struct Skin<'t> {
    tiles: &'t FaceTable,
    tint: Tint,
    pass: RenderPass,
    // Hide faces against blocks of the same id
    cull_self: bool,
}

/// Reads blocks and light through `world`; `biome` maps a column to its tint factor.
pub struct MeshBuilder<'a, V: ?Sized, B> {
    world: &'a V,
    reg: &'a BlockRegistry,
    biome: B,
    opts: MeshOptions,
    overflowed: Cell<bool>,
}

impl<'a, V, B> MeshBuilder<'a, V, B>
where
    V: Voxels + ?Sized,
    B: Fn(i32, i32) -> f32,
{
    pub fn new(world: &'a V, reg: &'a BlockRegistry, biome: B, opts: MeshOptions) -> Self {
        Self {
            world,
            reg,
            biome,
            opts,
            overflowed: Cell::new(false),
        }
    }

    /// Meshes every block with `min <= pos < max`; vertices are relative to `min`.
    pub fn build_region(&self, min: Pos, max: Pos) -> MeshBuild {
        let mut out = MeshBuild::new([min.0, min.1, min.2]);
        self.overflowed.set(false);
        for z in min.2..max.2 {
            for x in min.0..max.0 {
                let biome = (self.biome)(x, z);
                for y in min.1..max.1 {
                    let id = self.world.block(x, y, z);
                    let ty = self.reg.get(id);
                    match ty.shape {
                        Shape::None => {}
                        Shape::Cross => self.add_cross(&mut out, (x, y, z), biome),
                        Shape::Fluid if self.opts.fluid_shaping => {
                            self.add_fluid_block(&mut out, (x, y, z), biome)
                        }
                        _ => self.add_block(&mut out, (x, y, z), biome),
                    }
                }
            }
        }
        if self.overflowed.get() {
            log::warn!(
                "mesh at {:?} hit the 16-bit vertex limit; geometry truncated",
                out.origin
            );
        }
        out
    }

    #[inline]
    fn light(&self, p: Pos, ch: Channel) -> i32 {
        self.world.get(p.0, p.1, p.2, ch)
    }

    #[inline]
    fn metadata(&self, p: Pos) -> u8 {
        self.world.get(p.0, p.1, p.2, Channel::Metadata) as u8
    }

    fn push(&self, out: &mut MeshBuild, q: &Quad, pass: RenderPass) {
        if !out.push_quad(q, pass) {
            self.overflowed.set(true);
        }
    }

    /// Average brightness of the four cells in front of a face corner.
    ///
    /// The diagonal sample is dropped when both cells beside it are dark so light
    /// cannot leak around a corner.
    fn vertex_light(&self, p: Pos, face: Face, vert: usize, ch: Channel) -> f32 {
        let (nx, ny, nz) = face.delta();
        let cs = corners(face);
        let mut values = [0i32; 4];
        for (ofs, v) in values.iter_mut().enumerate() {
            *v = self.light(
                (
                    p.0 + nx + cs[vert][0] - cs[ofs][0],
                    p.1 + ny + cs[vert][1] - cs[ofs][1],
                    p.2 + nz + cs[vert][2] - cs[ofs][2],
                ),
                ch,
            );
        }
        if values[(vert + 1) % 4] == 0 && values[(vert + 3) % 4] == 0 {
            values[(vert + 2) % 4] = 0;
        }
        values.iter().map(|&v| attenuation(v)).sum::<f32>() / 4.0
    }

    fn face_light(&self, p: Pos, ty: &BlockType, face: Face) -> ([f32; 4], [f32; 4]) {
        if ty.emission > 0 {
            return ([0.0; 4], [attenuation(ty.emission as i32); 4]);
        }
        if self.opts.smooth_lighting {
            let mut sky = [0.0; 4];
            let mut blk = [0.0; 4];
            for v in 0..4 {
                sky[v] = self.vertex_light(p, face, v, Channel::SkyLight);
                blk[v] = self.vertex_light(p, face, v, Channel::BlockLight);
            }
            return (sky, blk);
        }
        let (dx, dy, dz) = face.delta();
        let adj = (p.0 + dx, p.1 + dy, p.2 + dz);
        (
            [attenuation(self.light(adj, Channel::SkyLight)); 4],
            [attenuation(self.light(adj, Channel::BlockLight)); 4],
        )
    }

    fn quad(out: &MeshBuild, p: Pos, cs: &[[i32; 3]; 4], norm: [f32; 3], tile: u16) -> Quad {
        let o = out.origin;
        let mut pos = [[0.0; 3]; 4];
        let mut uv = [(0.0, 0.0); 4];
        for c in 0..4 {
            pos[c] = [
                (cs[c][0] + p.0 - o[0]) as f32,
                (cs[c][1] + p.1 - o[1]) as f32,
                (cs[c][2] + p.2 - o[2]) as f32,
            ];
            uv[c] = atlas_uv(tile, c);
        }
        Quad {
            pos,
            norm,
            uv,
            tint: [1.0; 3],
            sky: [0.0; 4],
            block: [0.0; 4],
        }
    }

    fn emit_skin(&self, out: &mut MeshBuild, p: Pos, ty: &BlockType, skin: &Skin, biome: f32) {
        let data = self.metadata(p);
        for face in Face::ALL {
            let Some(tile) = skin.tiles.tile(face.index(), data) else {
                continue;
            };
            let (dx, dy, dz) = face.delta();
            let adj = self.world.block(p.0 + dx, p.1 + dy, p.2 + dz);
            if self.reg.is_solid(adj) || (skin.cull_self && adj == ty.id) {
                continue;
            }
            let n = face.normal();
            let mut q = Self::quad(out, p, corners(face), [n.x, n.y, n.z], tile);
            q.tint = skin.tint.color(face.index(), biome);
            (q.sky, q.block) = self.face_light(p, ty, face);
            self.push(out, &q, skin.pass);
        }
    }

    /// Ordinary cube: six culled faces, plus the underlay layer beneath when present.
    pub fn add_block(&self, out: &mut MeshBuild, p: Pos, biome: f32) {
        let ty = self.reg.get(self.world.block(p.0, p.1, p.2));
        if let Some(under) = &ty.underlay {
            let skin = Skin {
                tiles: &under.tiles,
                tint: under.tint,
                pass: RenderPass::Opaque,
                cull_self: false,
            };
            self.emit_skin(out, p, ty, &skin, biome);
        }
        let skin = Skin {
            tiles: &ty.tiles,
            tint: ty.tint,
            pass: ty.pass,
            cull_self: !ty.draw_self_adjacent,
        };
        self.emit_skin(out, p, ty, &skin, biome);
    }

    /// Two crossed double-sided planes with flat light from the block's own cell.
    pub fn add_cross(&self, out: &mut MeshBuild, p: Pos, biome: f32) {
        let ty = self.reg.get(self.world.block(p.0, p.1, p.2));
        let data = self.metadata(p);
        let sky = attenuation(self.light(p, Channel::SkyLight));
        let blk = attenuation(self.light(p, Channel::BlockLight));
        for (i, cs) in CROSS_CORNERS.iter().enumerate() {
            let Some(tile) = ty.tile(i, data) else {
                continue;
            };
            let mut q = Self::quad(out, p, cs, CROSS_NORMALS[i], tile);
            q.tint = ty.tint.color(i, biome);
            q.sky = [sky; 4];
            q.block = [blk; 4];
            self.push(out, &q, ty.pass);
        }
    }

    /// Highest level among same-type cells sharing a top corner, from [`Channel::Metadata`].
    fn corner_level(&self, p: Pos, face: Face, vert: usize, id: u8) -> u8 {
        let cs = corners(face);
        let top = corners(Face::PosY);
        let mut level = 0u8;
        for t in top.iter() {
            let c = (
                p.0 + cs[vert][0] - t[0],
                p.1,
                p.2 + cs[vert][2] - t[2],
            );
            if self.world.block(c.0, c.1, c.2) != id {
                continue;
            }
            level = level.max(self.metadata(c));
        }
        level
    }

    /// Fluid cube: culls against solids and its own kind, lowering top corners by level.
    pub fn add_fluid_block(&self, out: &mut MeshBuild, p: Pos, biome: f32) {
        let ty = self.reg.get(self.world.block(p.0, p.1, p.2));
        for face in Face::ALL {
            let Some(tile) = ty.tile(face.index(), 0) else {
                continue;
            };
            let (dx, dy, dz) = face.delta();
            let adj = self.world.block(p.0 + dx, p.1 + dy, p.2 + dz);
            if self.reg.is_solid(adj) || adj == ty.id {
                continue;
            }
            let cs = corners(face);
            let n = face.normal();
            let mut q = Self::quad(out, p, cs, [n.x, n.y, n.z], tile);
            for (v, corner) in cs.iter().enumerate() {
                if corner[1] == 1 {
                    let level = self.corner_level(p, face, v, ty.id).min(ty.max_level);
                    q.pos[v][1] -= level as f32 / ty.max_level as f32;
                }
            }
            q.tint = ty.tint.color(face.index(), biome);
            (q.sky, q.block) = self.face_light(p, ty, face);
            self.push(out, &q, ty.pass);
        }
    }
}

/// Unit cube centred on the origin at full brightness, for falling-block entities.
pub fn block_entity_mesh(reg: &BlockRegistry, block: Block, biome: f32) -> MeshBuild {
    let ty = reg.get(block.id);
    let mut out = MeshBuild::new([0, 0, 0]);
    for face in Face::ALL {
        let Some(tile) = ty.tile(face.index(), block.data) else {
            continue;
        };
        let cs = corners(face);
        let n = face.normal();
        let mut pos = [[0.0f32; 3]; 4];
        let mut uv = [(0.0, 0.0); 4];
        for c in 0..4 {
            pos[c] = [
                cs[c][0] as f32 - 0.5,
                cs[c][1] as f32 - 0.5,
                cs[c][2] as f32 - 0.5,
            ];
            uv[c] = atlas_uv(tile, c);
        }
        let q = Quad {
            pos,
            norm: [n.x, n.y, n.z],
            uv,
            tint: ty.tint.color(face.index(), biome),
            sky: [1.0; 4],
            block: [1.0; 4],
        };
        out.push_quad(&q, ty.pass);
    }
    out
}
