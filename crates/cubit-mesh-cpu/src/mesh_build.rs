use cubit_blocks::RenderPass;

use crate::tables::QUAD_INDICES;

/// Render-ready arrays for one region. Positions are relative to `origin`.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub origin: [i32; 3],
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub tint: Vec<f32>,
    pub sky: Vec<f32>,
    pub block: Vec<f32>,
    // opaque, translucent
    pub idx: [Vec<u16>; 2],
}

/// One quad's per-corner attributes.
pub(crate) struct Quad {
    pub pos: [[f32; 3]; 4],
    pub norm: [f32; 3],
    pub uv: [(f32, f32); 4],
    pub tint: [f32; 3],
    pub sky: [f32; 4],
    pub block: [f32; 4],
}

impl MeshBuild {
    pub fn new(origin: [i32; 3]) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Clears all arrays but retains capacity for reuse across frames.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.tint.clear();
        self.sky.clear();
        self.block.clear();
        self.idx[0].clear();
        self.idx[1].clear();
    }

    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.tint.reserve(n_quads * 4 * 3);
        self.sky.reserve(n_quads * 4);
        self.block.reserve(n_quads * 4);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    #[inline]
    pub fn indices(&self, pass: RenderPass) -> &[u16] {
        &self.idx[pass.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Appends a quad. Returns false once 16-bit indices are exhausted.
    pub(crate) fn push_quad(&mut self, q: &Quad, pass: RenderPass) -> bool {
        let base = self.vertex_count();
        if base + 4 > u16::MAX as usize + 1 {
            return false;
        }
        let base = base as u16;
        self.idx[pass.index()].extend(QUAD_INDICES.iter().map(|i| base + i));
        for c in 0..4 {
            self.pos.extend_from_slice(&q.pos[c]);
            self.norm.extend_from_slice(&q.norm);
            self.uv.push(q.uv[c].0);
            self.uv.push(q.uv[c].1);
            self.tint.extend_from_slice(&q.tint);
            self.sky.push(q.sky[c]);
            self.block.push(q.block[c]);
        }
        true
    }
}
