//! Coherent noise used by the content generators.
//!
//! Any seeded field with 2D and 3D sampling satisfies the generators, so they
//! only see the `NoiseSource` trait. `ValueNoise` is the stock implementation:
//! hashed lattice values, smoothstep-interpolated, remapped to [-1, 1].

use crate::error::{Result, SceneError};

pub trait NoiseSource {
    /// Re-seed the field. Identical seeds and inputs must give identical samples.
    fn seed(&mut self, seed: u64);
    fn sample2(&self, x: f64, y: f64) -> f64;
    fn sample3(&self, x: f64, y: f64, z: f64) -> f64;
}

/// Sample the 2D field, treating a non-finite value as a fatal noise failure.
pub fn checked_sample2(noise: &dyn NoiseSource, x: f64, y: f64) -> Result<f64> {
    let v = noise.sample2(x, y);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SceneError::NonFiniteNoise { x, y, z: 0.0 })
    }
}

/// Sample the 3D field, treating a non-finite value as a fatal noise failure.
pub fn checked_sample3(noise: &dyn NoiseSource, x: f64, y: f64, z: f64) -> Result<f64> {
    let v = noise.sample3(x, y, z);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SceneError::NonFiniteNoise { x, y, z })
    }
}

// ---------------------------------------------------------------------------
// Value noise
// ---------------------------------------------------------------------------

const LATTICE_PERIOD: f64 = 4_294_967_296.0;

#[derive(Debug, Clone)]
pub struct ValueNoise {
    seed: u32,
}

impl ValueNoise {
    pub fn new(seed: u64) -> Self {
        ValueNoise {
            seed: fold_seed(seed),
        }
    }
}

impl NoiseSource for ValueNoise {
    fn seed(&mut self, seed: u64) {
        self.seed = fold_seed(seed);
    }

    fn sample2(&self, x: f64, y: f64) -> f64 {
        let (ix, fx) = split(x);
        let (iy, fy) = split(y);
        let sx = smoothstep(fx);
        let sy = smoothstep(fy);

        let v = |dx: i32, dy: i32| {
            lattice(hash3(ix.wrapping_add(dx), iy.wrapping_add(dy), 0, self.seed))
        };

        let x0 = lerp(v(0, 0), v(1, 0), sx);
        let x1 = lerp(v(0, 1), v(1, 1), sx);
        lerp(x0, x1, sy) * 2.0 - 1.0
    }

    fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (ix, fx) = split(x);
        let (iy, fy) = split(y);
        let (iz, fz) = split(z);
        let sx = smoothstep(fx);
        let sy = smoothstep(fy);
        let sz = smoothstep(fz);

        // The 2D field lives on the z = 0 plane hash space, so offset 3D
        // lookups to keep the two fields independent.
        let seed3 = self.seed ^ 0x68e3_1da4;
        let v = |dx: i32, dy: i32, dz: i32| {
            lattice(hash3(
                ix.wrapping_add(dx),
                iy.wrapping_add(dy),
                iz.wrapping_add(dz),
                seed3,
            ))
        };

        let x00 = lerp(v(0, 0, 0), v(1, 0, 0), sx);
        let x10 = lerp(v(0, 1, 0), v(1, 1, 0), sx);
        let x01 = lerp(v(0, 0, 1), v(1, 0, 1), sx);
        let x11 = lerp(v(0, 1, 1), v(1, 1, 1), sx);

        let y0 = lerp(x00, x10, sy);
        let y1 = lerp(x01, x11, sy);

        lerp(y0, y1, sz) * 2.0 - 1.0
    }
}

fn fold_seed(seed: u64) -> u32 {
    hash_u32((seed as u32) ^ hash_u32((seed >> 32) as u32))
}

/// Lattice cell and fractional offset of `v`. The lattice index wraps modulo
/// 2^32, so arbitrarily large times stay continuous instead of saturating.
fn split(v: f64) -> (i32, f64) {
    let floor = v.floor();
    let cell = floor.rem_euclid(LATTICE_PERIOD) as u32 as i32;
    (cell, v - floor)
}

fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn hash3(ix: i32, iy: i32, iz: i32, seed: u32) -> u32 {
    let mut h = seed ^ 0x9e37_79b9;
    h ^= (ix as u32).wrapping_mul(0x85eb_ca6b);
    h = hash_u32(h);
    h ^= (iy as u32).wrapping_mul(0xc2b2_ae35);
    h = hash_u32(h);
    h ^= (iz as u32).wrapping_mul(0x27d4_eb2f);
    hash_u32(h)
}

fn lattice(h: u32) -> f64 {
    f64::from(h) / f64::from(u32::MAX)
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
