use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::NoiseKind;
use crate::simplex::Simplex;
use crate::value::ValueLattice;

enum Backend {
    Simplex(Simplex),
    Value(ValueLattice),
    OpenSimplex2(FastNoiseLite),
}

/// Octave-summed noise in [0, 1]. Octave `j` runs at `2^j / feature_size` with weight `1 / 2^j`.
pub struct NoiseField {
    backend: Backend,
    octaves: u32,
    feature_size: f64,
}

impl NoiseField {
    pub fn new(kind: NoiseKind, seed: i32, octaves: u32, feature_size: f32) -> Self {
        let backend = match kind {
            NoiseKind::Simplex => Backend::Simplex(Simplex::new(seed)),
            NoiseKind::Value => Backend::Value(ValueLattice::new(seed)),
            NoiseKind::OpenSimplex2 => {
                let mut n = FastNoiseLite::with_seed(seed);
                n.set_noise_type(Some(NoiseType::OpenSimplex2));
                n.set_frequency(Some(1.0));
                Backend::OpenSimplex2(n)
            }
        };
        Self {
            backend,
            octaves: octaves.max(1),
            feature_size: feature_size.max(1e-4) as f64,
        }
    }

    #[inline]
    fn raw3(&self, octave: u32, x: f64, y: f64, z: f64) -> f32 {
        match &self.backend {
            Backend::Simplex(s) => s.noise3(x, y, z),
            Backend::Value(v) => v.sample(octave, x, y, z),
            Backend::OpenSimplex2(n) => {
                (n.get_noise_3d(x as f32, y as f32, z as f32) + 1.0) * 0.5
            }
        }
    }

    #[inline]
    fn raw2(&self, octave: u32, x: f64, z: f64) -> f32 {
        match &self.backend {
            Backend::Simplex(s) => s.noise2(x, z),
            Backend::Value(v) => v.sample(octave, x, 0.0, z),
            Backend::OpenSimplex2(n) => (n.get_noise_2d(x as f32, z as f32) + 1.0) * 0.5,
        }
    }

    fn normalizer(&self) -> f64 {
        match self.backend {
            // lattice noise keeps its historical scale
            Backend::Value(_) => 2.0 - 1.0 / self.octaves as f64,
            _ => 2.0 - 1.0 / 2f64.powi(self.octaves as i32 - 1),
        }
    }

    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        let mut sum = 0.0f64;
        for j in 0..self.octaves {
            let d = 2f64.powi(j as i32);
            let k = d / self.feature_size;
            sum += self.raw3(j, x as f64 * k, y as f64 * k, z as f64 * k) as f64 / d;
        }
        (sum / self.normalizer()).clamp(0.0, 1.0) as f32
    }

    /// Horizontal-only sample, used for per-column fields such as biome tint.
    pub fn sample_2d(&self, x: f32, z: f32) -> f32 {
        let mut sum = 0.0f64;
        for j in 0..self.octaves {
            let d = 2f64.powi(j as i32);
            let k = d / self.feature_size;
            sum += self.raw2(j, x as f64 * k, z as f64 * k) as f64 / d;
        }
        (sum / self.normalizer()).clamp(0.0, 1.0) as f32
    }
}
