//! Level generation
//!
//! A level is a shuffled pool of piece types in which every type appears a
//! multiple of three times, so the board can always be cleared by count.
//! Whether physics lets every piece be reached is not guaranteed.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog::TypeId;

/// Types available on level 1
const BASE_TYPES: u32 = 3;
/// Triplets on every level before the per-level increase
const BASE_TRIPLETS: u32 = 6;
/// Extra triplets per level
const TRIPLETS_PER_LEVEL: u32 = 3;
/// Highest level number; anything above plays as this level
pub const MAX_LEVEL: u32 = 999;

/// Derived parameters for a level number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelSpec {
    pub level: u32,
    /// How many catalog types are in play (a prefix of the catalog)
    pub fruit_types: usize,
    pub total_triplets: u32,
    pub total_pieces: u32,
}

impl LevelSpec {
    /// Compute the level parameters. Levels are clamped to
    /// `1..=MAX_LEVEL` and the type count never exceeds the catalog.
    pub fn for_level(level: u32, catalog_len: usize) -> Self {
        let level = level.clamp(1, MAX_LEVEL);
        let fruit_types = ((BASE_TYPES + (level - 1) / 2) as usize).min(catalog_len);
        let total_triplets = BASE_TRIPLETS + level * TRIPLETS_PER_LEVEL;
        Self {
            level,
            fruit_types,
            total_triplets,
            total_pieces: total_triplets * 3,
        }
    }
}

/// Build the shuffled type pool for a level
///
/// Each triplet samples one type uniformly from the types in play and adds
/// it three times; the whole pool is then shuffled.
pub fn build_pool<R: Rng + ?Sized>(spec: &LevelSpec, rng: &mut R) -> Vec<TypeId> {
    if spec.fruit_types == 0 {
        return Vec::new();
    }

    let mut pool = Vec::with_capacity(spec.total_pieces as usize);
    for _ in 0..spec.total_triplets {
        let type_id = rng.random_range(0..spec.fruit_types) as TypeId;
        pool.extend([type_id; 3]);
    }
    pool.shuffle(rng);
    pool
}

/// Uniform spawn x inside the safe band `[r + margin, width - r - margin]`
///
/// Collapses to the center when the band is empty.
pub fn spawn_x<R: Rng + ?Sized>(rng: &mut R, radius: f32, width: f32, margin: f32) -> f32 {
    let lo = radius + margin;
    let hi = width - radius - margin;
    if hi <= lo {
        return width / 2.0;
    }
    rng.random_range(lo..=hi)
}

/// Spawn height above the visible area for a piece of `radius`
#[inline]
pub fn spawn_y(radius: f32) -> f32 {
    -2.0 * radius
}
