//! Morton codes (Z-order curve) for AABB centers.
//!
//! Centers are clamped to the world bounds, normalized to `[0, 1]` per axis,
//! quantized and bit-interleaved into a single `u64` key:
//!
//! - 1D: 60 bits on the only axis
//! - 2D: 30 bits per axis, 60 bits total
//! - 3D and above: 20 bits per axis over the first three axes, 60 bits total
//!
//! Nearby points usually get nearby keys. Keys only order the leaves; pair
//! enumeration always ends in an exact AABB test, so losing axes above the
//! third costs locality, never correctness.

use rayon::prelude::*;

use crate::collision::Aabb;

pub const BITS_1D: u32 = 60;
pub const BITS_2D: u32 = 30;
pub const BITS_3D: u32 = 20;

/// Smallest world extent used for normalization.
const MIN_EXTENT: f64 = 1e-12;

/// Spread the low 32 bits of `v` so a zero bit sits between each of them.
#[inline]
fn part1by1(v: u64) -> u64 {
    let mut x = v & 0x0000_0000_FFFF_FFFF;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Spread the low 21 bits of `v` so two zero bits sit between each of them.
#[inline]
fn part1by2(v: u64) -> u64 {
    let mut x = v & 0x1F_FFFF;
    x = (x | (x << 32)) & 0x001F_0000_0000_FFFF;
    x = (x | (x << 16)) & 0x001F_0000_FF00_00FF;
    x = (x | (x << 8)) & 0x100F_00F0_0F00_F00F;
    x = (x | (x << 4)) & 0x10C3_0C30_C30C_30C3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// Interleave two quantized coordinates, `x` in the lowest bit.
#[inline]
pub fn morton_2d(x: u64, y: u64) -> u64 {
    part1by1(x) | (part1by1(y) << 1)
}

/// Interleave three quantized coordinates, `x` in the lowest bit.
#[inline]
pub fn morton_3d(x: u64, y: u64, z: u64) -> u64 {
    part1by2(x) | (part1by2(y) << 1) | (part1by2(z) << 2)
}

/// Clamp `value` to `[lo, hi]`, normalize and quantize to `bits` bits.
#[inline]
fn quantize(value: f64, lo: f64, hi: f64, bits: u32) -> u64 {
    let extent = (hi - lo).max(MIN_EXTENT);
    let t = ((value - lo) / extent).clamp(0.0, 1.0);
    let max_cell = ((1u64 << bits) - 1) as f64;
    // NaN saturates to 0
    (t * max_cell).floor() as u64
}

/// Morton key of a single point inside `bounds`.
pub fn morton_key<const D: usize>(point: &[f64; D], bounds: &Aabb<D>) -> u64 {
    let q = |axis: usize, bits: u32| quantize(point[axis], bounds.min[axis], bounds.max[axis], bits);
    match D {
        0 => 0,
        1 => q(0, BITS_1D),
        2 => morton_2d(q(0, BITS_2D), q(1, BITS_2D)),
        _ => morton_3d(q(0, BITS_3D), q(1, BITS_3D), q(2, BITS_3D)),
    }
}

/// Morton keys of the centers of `aabbs`, in input order.
pub fn encode_centers<const D: usize>(aabbs: &[Aabb<D>], bounds: &Aabb<D>, parallel: bool) -> Vec<u64> {
    let key = |aabb: &Aabb<D>| morton_key(&aabb.center(), bounds);
    if parallel {
        aabbs.par_iter().map(key).collect()
    } else {
        aabbs.iter().map(key).collect()
    }
}
