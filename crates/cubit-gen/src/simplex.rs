// Classic gradient-noise permutation; a non-zero seed shuffles it.
const BASE_PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

const GRAD2_COUNT: usize = 16;

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Simplex noise over a 256-entry permutation, returning values in [0, 1].
#[derive(Clone)]
pub struct Simplex {
    perm: [u8; 512],
    grad2: [[f64; 2]; GRAD2_COUNT],
}

impl Simplex {
    pub fn new(seed: i32) -> Self {
        let mut base = BASE_PERM;
        if seed != 0 {
            let mut state = seed as i64 as u64;
            for i in (1..base.len()).rev() {
                let j = (splitmix64(&mut state) % (i as u64 + 1)) as usize;
                base.swap(i, j);
            }
        }
        let mut perm = [0u8; 512];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = base[i & 255];
        }
        let mut grad2 = [[0.0; 2]; GRAD2_COUNT];
        let step = std::f64::consts::PI / 8.0;
        for (i, g) in grad2.iter_mut().enumerate() {
            let a = step * i as f64;
            *g = [a.cos(), a.sin()];
        }
        Self { perm, grad2 }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    pub fn noise2(&self, x: f64, y: f64) -> f32 {
        let unskew = (6.0 - 12f64.sqrt()) / 12.0;
        let skew = (1.0 / (1.0 - 2.0 * unskew) - 1.0) / 2.0;

        let s = (x + y) * skew;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * unskew;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let (io, jo) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - io as f64 + unskew;
        let y1 = y0 - jo as f64 + unskew;
        let x2 = x0 - 1.0 + unskew * 2.0;
        let y2 = y0 - 1.0 + unskew * 2.0;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let g0 = self.p((ii + self.p(jj)) & 255) % GRAD2_COUNT;
        let g1 = self.p((ii + io + self.p(jj + jo)) & 255) % GRAD2_COUNT;
        let g2 = self.p((ii + 1 + self.p(jj + 1)) & 255) % GRAD2_COUNT;

        let corner = |g: usize, dx: f64, dy: f64| {
            let t = 0.5 - dx * dx - dy * dy;
            if t < 0.0 {
                0.0
            } else {
                let t = t * t;
                t * t * (self.grad2[g][0] * dx + self.grad2[g][1] * dy)
            }
        };
        let n = corner(g0, x0, y0) + corner(g1, x1, y1) + corner(g2, x2, y2);
        (70.0 * n / 2.0 + 0.5) as f32
    }

    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f32 {
        const F3: f64 = 1.0 / 3.0;
        const G3: f64 = 1.0 / 6.0;

        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let offs = [
            (x0, y0, z0),
            (x0 - i1 as f64 + G3, y0 - j1 as f64 + G3, z0 - k1 as f64 + G3),
            (
                x0 - i2 as f64 + 2.0 * G3,
                y0 - j2 as f64 + 2.0 * G3,
                z0 - k2 as f64 + 2.0 * G3,
            ),
            (x0 - 1.0 + 3.0 * G3, y0 - 1.0 + 3.0 * G3, z0 - 1.0 + 3.0 * G3),
        ];
        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let kk = (k as i64 & 255) as usize;
        let corners = [(0, 0, 0), (i1, j1, k1), (i2, j2, k2), (1, 1, 1)];

        let mut n = 0.0;
        for (c, (dx, dy, dz)) in corners.iter().zip(offs.iter()) {
            let gi = self.p(ii + c.0 + self.p(jj + c.1 + self.p(kk + c.2))) % GRAD3.len();
            let t = 0.6 - dx * dx - dy * dy - dz * dz;
            if t > 0.0 {
                let g = GRAD3[gi];
                let t = t * t;
                n += t * t * (g[0] * dx + g[1] * dy + g[2] * dz);
            }
        }
        (32.0 * n / 2.0 + 0.5) as f32
    }
}
