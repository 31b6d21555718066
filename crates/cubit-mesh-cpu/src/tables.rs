use cubit_geom::Face;

/// Quad corners per face in `Face` order, wound counter-clockwise seen from outside.
pub const FACE_CORNERS: [[[i32; 3]; 4]; 6] = [
    [[1, 1, 0], [0, 1, 0], [0, 1, 1], [1, 1, 1]],
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
    [[1, 1, 0], [1, 1, 1], [1, 0, 1], [1, 0, 0]],
    [[0, 1, 1], [0, 1, 0], [0, 0, 0], [0, 0, 1]],
    [[1, 1, 1], [0, 1, 1], [0, 0, 1], [1, 0, 1]],
    [[0, 1, 0], [1, 1, 0], [1, 0, 0], [0, 0, 0]],
];

/// Two diagonal planes, each emitted from both sides.
pub const CROSS_CORNERS: [[[i32; 3]; 4]; 4] = [
    [[0, 1, 0], [1, 1, 1], [1, 0, 1], [0, 0, 0]],
    [[1, 1, 1], [0, 1, 0], [0, 0, 0], [1, 0, 1]],
    [[1, 1, 0], [0, 1, 1], [0, 0, 1], [1, 0, 0]],
    [[0, 1, 1], [1, 1, 0], [1, 0, 0], [0, 0, 1]],
];

const H: f32 = std::f32::consts::FRAC_1_SQRT_2;
pub(crate) const CROSS_NORMALS: [[f32; 3]; 4] = [[H, 0.0, -H], [-H, 0.0, H], [-H, 0.0, -H], [H, 0.0, H]];

pub(crate) const CORNER_UV: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const ATLAS_TILES: u16 = 16;

/// UV of a quad corner for an atlas tile in a 16x16 grid.
#[inline]
pub fn atlas_uv(tile: u16, corner: usize) -> (f32, f32) {
    let (cu, cv) = CORNER_UV[corner & 3];
    let n = ATLAS_TILES as f32;
    let col = (tile % ATLAS_TILES) as f32;
    let row = (tile / ATLAS_TILES) as f32;
    ((cu + col) / n, 1.0 - (cv + row) / n)
}

#[inline]
pub(crate) fn corners(face: Face) -> &'static [[i32; 3]; 4] {
    &FACE_CORNERS[face.index()]
}
