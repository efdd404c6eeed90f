//! Chunk streaming and lazy generation.
//!
//! The plane is split into square chunks addressed by [`ChunkCoord`]. A chunk
//! is generated on first access and cached for the lifetime of the manager.
//! Edge tiles of already cached neighbors become context cells for the
//! solver, so terrain stays adjacency-valid across chunk borders.
//!
//! Boundaries only see neighbors that exist at generation time: the same seed
//! and the same access order always produce the same world, but a different
//! access order may produce different chunks.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use dashmap::DashMap;
use overland_common::{ChunkCoord, LocalCoord, WorldCoord, WorldError, WorldResult};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::bias::{
    check_penalty_radius, is_known_theme, radius_offsets, theme_multipliers, DEFAULT_PENALTY_RADIUS,
};
use crate::chunk::Chunk;
use crate::config::WorldConfig;
use crate::region::RegionContext;
use crate::registry::TileRegistry;
use crate::terrain::TerrainType;
use crate::wfc::{FixedBoundary, WfcGenerator};

/// Largest supported chunk edge length in tiles.
pub const MAX_CHUNK_SIZE: u32 = 1024;

/// Derives the solver seed for a chunk.
///
/// Each axis goes through its own mixing round, so swapping `x` and `y` or
/// moving one axis by a multiple of `2^32` yields an unrelated seed.
#[must_use]
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let row = splitmix64(world_seed ^ splitmix64(coord.x as u64));
    splitmix64(row ^ coord.y as u64)
}

const fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Chunk coordinates around `center` in spiral order: center first, then
/// ring by ring outward.
///
/// Every ring `r` contributes its `8r` chunks. Coordinates past the edge of
/// the chunk plane are left out.
#[must_use]
pub fn spiral_chunks(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let side = 2 * radius as usize + 1;
    let mut result = Vec::with_capacity(side * side);
    let mut push = |dx: i64, dy: i64| result.extend(center.checked_offset(dx, dy));

    push(0, 0);

    for ring in 1..=i64::from(radius) {
        // Top edge (left to right, both corners)
        for x in -ring..=ring {
            push(x, ring);
        }
        // Right edge (top to bottom, down to the bottom corner)
        for y in (-ring..ring).rev() {
            push(ring, y);
        }
        // Bottom edge (right to left, down to the left corner)
        for x in (-ring..ring).rev() {
            push(x, -ring);
        }
        // Left edge (bottom to top, stopping below the top corner)
        for y in (-ring + 1)..ring {
            push(-ring, y);
        }
    }

    result
}

// ============================================================================
// Cache
// ============================================================================

/// Generated chunks by coordinate.
///
/// Unbounded: chunks are never evicted.
#[derive(Debug, Default)]
pub struct ChunkCache {
    chunks: DashMap<ChunkCoord, Arc<Chunk>>,
}

impl ChunkCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached chunk at `coord`.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.chunks.get(&coord).map(|c| Arc::clone(c.value()))
    }

    /// Stores a chunk, keyed by its own coordinate.
    pub fn insert(&self, chunk: Arc<Chunk>) {
        self.chunks.insert(chunk.coord(), chunk);
    }

    /// Returns true if `coord` is cached.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Cached coordinates in arbitrary order.
    #[must_use]
    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.iter().map(|e| *e.key()).collect()
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Snapshot of manager state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldStats {
    /// World seed
    pub world_seed: u64,
    /// Chunk edge length in tiles
    pub chunk_size: u32,
    /// Chunks generated so far
    pub generated_chunks: usize,
    /// Cells relaxed by the solver across all chunks
    pub relaxed_cells: u64,
    /// Theme of the installed region context
    pub theme: Option<String>,
}

/// Generates, caches and serves terrain chunks.
///
/// All operations take `&self`; the manager can be shared across threads
/// behind an `Arc`.
#[derive(Debug)]
pub struct ChunkManager {
    world_seed: u64,
    chunk_size: NonZeroU32,
    penalty_radius: u32,
    registry: Arc<TileRegistry>,
    cache: ChunkCache,
    /// One lock per coordinate currently being generated
    generating: DashMap<ChunkCoord, Arc<Mutex<()>>>,
    region: RwLock<Option<RegionContext>>,
    relaxed_cells: AtomicU64,
}

impl ChunkManager {
    /// Creates a manager with an empty cache.
    pub fn new(world_seed: u64, chunk_size: u32, registry: Arc<TileRegistry>) -> WorldResult<Self> {
        let chunk_size = NonZeroU32::new(chunk_size)
            .filter(|size| size.get() <= MAX_CHUNK_SIZE)
            .ok_or(WorldError::InvalidChunkSize(chunk_size))?;

        info!(
            "Chunk manager ready (seed {world_seed:#x}, chunk size {})",
            chunk_size.get()
        );

        Ok(Self {
            world_seed,
            chunk_size,
            penalty_radius: DEFAULT_PENALTY_RADIUS,
            registry,
            cache: ChunkCache::new(),
            generating: DashMap::new(),
            region: RwLock::new(None),
            relaxed_cells: AtomicU64::new(0),
        })
    }

    /// Creates a manager from a validated configuration.
    pub fn from_config(config: &WorldConfig) -> WorldResult<Self> {
        config.validate()?;
        let registry = TileRegistry::default().with_weights(&config.weights)?;
        Self::new(config.world_seed, config.chunk_size, Arc::new(registry))?
            .with_penalty_radius(config.penalty_radius)
    }

    /// Sets the radius searched for incompatible biome groups.
    ///
    /// Fails above [`MAX_PENALTY_RADIUS`](crate::bias::MAX_PENALTY_RADIUS).
    pub fn with_penalty_radius(mut self, radius: u32) -> WorldResult<Self> {
        self.penalty_radius = check_penalty_radius(radius)?;
        Ok(self)
    }

    /// World seed.
    #[must_use]
    pub const fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Chunk edge length in tiles.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size.get()
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<TileRegistry> {
        &self.registry
    }

    /// Installs the region context used for chunks generated from now on.
    ///
    /// Already cached chunks keep their terrain.
    pub fn set_region_context(&self, region: RegionContext) {
        if is_known_theme(region.theme()) {
            info!("Region context set to theme '{}'", region.theme());
        } else {
            warn!(
                "Region theme '{}' is not recognized; terrain stays unbiased",
                region.theme()
            );
        }
        *self.region.write() = Some(region);
    }

    /// Removes the installed region context.
    pub fn clear_region_context(&self) {
        if self.region.write().take().is_some() {
            info!("Region context cleared");
        }
    }

    /// Currently installed region context.
    #[must_use]
    pub fn region_context(&self) -> Option<RegionContext> {
        self.region.read().clone()
    }

    /// Returns the chunk at `(cx, cy)`, generating it on first access.
    pub fn get_or_generate_chunk(&self, cx: i64, cy: i64) -> Arc<Chunk> {
        self.chunk(ChunkCoord::new(cx, cy))
    }

    /// Returns the chunk at `coord`, generating it on first access.
    pub fn chunk(&self, coord: ChunkCoord) -> Arc<Chunk> {
        if let Some(chunk) = self.cache.get(coord) {
            return chunk;
        }

        let lock = Arc::clone(self.generating.entry(coord).or_default().value());
        let guard = lock.lock();

        // Another thread may have finished while we waited.
        if let Some(chunk) = self.cache.get(coord) {
            return chunk;
        }

        let chunk = Arc::new(self.generate(coord));
        self.cache.insert(Arc::clone(&chunk));
        drop(guard);
        self.generating.remove(&coord);
        chunk
    }

    /// Terrain at world tile `(x, y)`.
    pub fn get_tile_at(&self, x: i64, y: i64) -> TerrainType {
        let world = WorldCoord::new(x, y);
        let chunk = self.chunk(world.to_chunk_coord(self.chunk_size()));
        let local = world.to_local_coord(self.chunk_size());
        // Local coordinates are reduced modulo the chunk size.
        chunk.tiles()[local.to_index(self.chunk_size())]
    }

    /// Terrain of every tile within Manhattan distance `radius` of `(x, y)`.
    ///
    /// Tiles past the edge of the plane are left out.
    pub fn terrain_in_radius(&self, x: i64, y: i64, radius: u32) -> HashMap<(i64, i64), TerrainType> {
        radius_offsets(radius)
            .filter_map(|(dx, dy)| Some((x.checked_add(dx)?, y.checked_add(dy)?)))
            .map(|pos| (pos, self.get_tile_at(pos.0, pos.1)))
            .collect()
    }

    /// Generates every chunk within `radius` rings of `center`, spiral order.
    ///
    /// Returns the number of chunks that were not cached before.
    pub fn pregenerate_around(&self, center: ChunkCoord, radius: u32) -> usize {
        let mut fresh = 0;
        for coord in spiral_chunks(center, radius) {
            if !self.cache.contains(coord) {
                self.chunk(coord);
                fresh += 1;
            }
        }
        debug!("Pregenerated {fresh} chunks around {center:?}");
        fresh
    }

    /// Returns true if the chunk at `coord` is cached.
    #[must_use]
    pub fn is_generated(&self, coord: ChunkCoord) -> bool {
        self.cache.contains(coord)
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.cache.len()
    }

    /// Cached coordinates in arbitrary order.
    #[must_use]
    pub fn generated_coords(&self) -> Vec<ChunkCoord> {
        self.cache.coords()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            world_seed: self.world_seed,
            chunk_size: self.chunk_size(),
            generated_chunks: self.cache.len(),
            relaxed_cells: self.relaxed_cells.load(Ordering::Relaxed),
            theme: self.region.read().as_ref().map(|r| r.theme.clone()),
        }
    }

    fn generate(&self, coord: ChunkCoord) -> Chunk {
        let seed = chunk_seed(self.world_seed, coord);
        let boundary = self.gather_boundary(coord);
        let multipliers = self
            .region
            .read()
            .as_ref()
            .map(|r| theme_multipliers(&self.registry, r.theme()));

        let mut generator =
            WfcGenerator::square(self.chunk_size, self.penalty_radius, &self.registry, seed)
                .with_boundary(&boundary);
        if let Some(multipliers) = &multipliers {
            generator = generator.with_overrides(multipliers);
        }

        let chunk = Chunk::from_grid(coord, generator.generate());
        if chunk.relaxations() > 0 {
            self.relaxed_cells
                .fetch_add(u64::from(chunk.relaxations()), Ordering::Relaxed);
        }
        debug!(
            "Generated chunk {coord:?} (seed {seed:#x}, {} context cells, {} relaxed)",
            boundary.len(),
            chunk.relaxations()
        );
        chunk
    }

    /// Context cells from cached neighbors, in chunk-local coordinates.
    ///
    /// The halo is deep enough for the distance penalty to see across the
    /// border and at least one tile deep for adjacency. Positions are
    /// resolved in chunk space, so chunks at the edge of the plane simply
    /// have no neighbor on that side.
    fn gather_boundary(&self, coord: ChunkCoord) -> FixedBoundary {
        let size = i64::from(self.chunk_size());
        let depth = i64::from(self.penalty_radius.max(1));
        let mut neighbors: AHashMap<ChunkCoord, Option<Arc<Chunk>>> = AHashMap::new();
        let mut boundary = FixedBoundary::new();

        for ly in -depth..size + depth {
            for lx in -depth..size + depth {
                if (0..size).contains(&lx) && (0..size).contains(&ly) {
                    continue;
                }
                let Some(owner) = coord.checked_offset(lx.div_euclid(size), ly.div_euclid(size))
                else {
                    continue;
                };
                let local = LocalCoord::new(lx.rem_euclid(size) as u16, ly.rem_euclid(size) as u16);
                let neighbor = neighbors
                    .entry(owner)
                    .or_insert_with(|| self.cache.get(owner));
                if let Some(terrain) = neighbor.as_ref().and_then(|chunk| chunk.tile(local)) {
                    // Bounded by MAX_CHUNK_SIZE + MAX_PENALTY_RADIUS.
                    boundary.insert((lx as i32, ly as i32), terrain);
                }
            }
        }
        boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bias::MAX_PENALTY_RADIUS;
    use crate::terrain::TerrainType::{Desert, Foothills, Forest, Hills, Mountain};
    use std::collections::HashSet;

    fn test_manager(seed: u64, chunk_size: u32) -> ChunkManager {
        ChunkManager::new(seed, chunk_size, Arc::new(TileRegistry::default())).expect("valid size")
    }

    /// Checks every 4-connected pair in a square world area.
    fn assert_area_adjacency_valid(manager: &ChunkManager, min: i64, max: i64) {
        let registry = manager.registry();
        for y in min..max {
            for x in min..max {
                let here = manager.get_tile_at(x, y);
                let right = manager.get_tile_at(x + 1, y);
                let below = manager.get_tile_at(x, y + 1);
                assert!(registry.is_allowed(here, right), "{here} | {right} at ({x}, {y})");
                assert!(registry.is_allowed(here, below), "{here} / {below} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_rejects_bad_chunk_size() {
        let registry = Arc::new(TileRegistry::default());
        assert_eq!(
            ChunkManager::new(1, 0, Arc::clone(&registry)).err(),
            Some(WorldError::InvalidChunkSize(0))
        );
        assert_eq!(
            ChunkManager::new(1, MAX_CHUNK_SIZE + 1, registry).err(),
            Some(WorldError::InvalidChunkSize(MAX_CHUNK_SIZE + 1))
        );
    }

    #[test]
    fn test_chunk_shape_and_cache() {
        let manager = test_manager(42, 16);
        let chunk = manager.get_or_generate_chunk(0, 0);

        assert_eq!(chunk.size(), 16);
        assert_eq!(chunk.tiles().len(), 256);
        assert!(manager.is_generated(ChunkCoord::new(0, 0)));
        assert_eq!(manager.generated_count(), 1);

        let again = manager.get_or_generate_chunk(0, 0);
        assert!(Arc::ptr_eq(&chunk, &again));
    }

    #[test]
    fn test_get_tile_at_negative_coords() {
        let manager = test_manager(7, 8);
        let tile = manager.get_tile_at(-1, -1);

        let chunk = manager.get_or_generate_chunk(-1, -1);
        assert_eq!(chunk.get(7, 7), Some(tile));
        assert_eq!(manager.generated_count(), 1);
    }

    #[test]
    fn test_adjacency_across_chunks() {
        let manager = test_manager(2024, 8);
        assert_area_adjacency_valid(&manager, -12, 12);
        assert_eq!(manager.stats().relaxed_cells, 0);
    }

    #[test]
    fn test_deterministic_across_managers() {
        let a = test_manager(99, 8);
        let b = test_manager(99, 8);
        for coord in spiral_chunks(ChunkCoord::new(0, 0), 1) {
            assert_eq!(*a.chunk(coord), *b.chunk(coord), "{coord:?}");
        }
    }

    #[test]
    fn test_seed_changes_world() {
        let a = test_manager(1, 16);
        let b = test_manager(2, 16);
        assert_ne!(
            a.get_or_generate_chunk(0, 0).tiles(),
            b.get_or_generate_chunk(0, 0).tiles()
        );
    }

    #[test]
    fn test_chunk_seed_distinct() {
        let mut seen = HashSet::new();
        for y in -20..20 {
            for x in -20..20 {
                assert!(seen.insert(chunk_seed(5, ChunkCoord::new(x, y))));
            }
        }
        assert_ne!(
            chunk_seed(5, ChunkCoord::new(0, 0)),
            chunk_seed(6, ChunkCoord::new(0, 0))
        );
    }

    #[test]
    fn test_spiral_order() {
        let center = ChunkCoord::new(3, -2);
        let chunks = spiral_chunks(center, 2);
        assert_eq!(chunks.len(), 25);
        assert_eq!(chunks[0], center);
        let unique: HashSet<_> = chunks.iter().copied().collect();
        assert_eq!(unique.len(), 25);
        // First ring before second ring.
        let ring = |c: &ChunkCoord| (c.x - center.x).abs().max((c.y - center.y).abs());
        assert!(chunks[1..9].iter().all(|c| ring(c) == 1));
        assert!(chunks[9..].iter().all(|c| ring(c) == 2));
    }

    #[test]
    fn test_spiral_covers_corners() {
        let center = ChunkCoord::new(0, 0);
        for radius in 1..=4_i64 {
            let chunks: HashSet<_> = spiral_chunks(center, radius as u32).into_iter().collect();
            let side = 2 * radius + 1;
            assert_eq!(chunks.len() as i64, side * side, "radius {radius}");
            for (x, y) in [(radius, radius), (radius, -radius), (-radius, -radius), (-radius, radius)] {
                assert!(chunks.contains(&ChunkCoord::new(x, y)), "radius {radius} misses ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_spiral_at_plane_corner() {
        let corner = ChunkCoord::new(i64::MAX, i64::MIN);
        let chunks = spiral_chunks(corner, 1);
        // Only the quarter inside the plane remains.
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], corner);
        assert!(chunks.contains(&ChunkCoord::new(i64::MAX - 1, i64::MIN + 1)));
    }

    #[test]
    fn test_pregenerate_around() {
        let manager = test_manager(3, 8);
        assert_eq!(manager.pregenerate_around(ChunkCoord::new(0, 0), 1), 9);
        assert_eq!(manager.generated_count(), 9);
        assert_eq!(manager.pregenerate_around(ChunkCoord::new(1, 0), 1), 3);
        assert_eq!(manager.generated_count(), 12);
    }

    #[test]
    fn test_mountains_theme_bias() {
        let family = [Mountain, Foothills, Hills];
        let mut share = 0.0;
        for seed in 0..10 {
            let manager = test_manager(seed, 16);
            manager.set_region_context(RegionContext::new("mountains"));
            share += manager.get_or_generate_chunk(0, 0).fraction(&family);
        }
        let share = share / 10.0;
        assert!(share > 0.25, "mountain family share {share}");
    }

    #[test]
    fn test_forest_theme_bias() {
        let mut share = 0.0;
        for seed in 0..10 {
            let manager = test_manager(seed, 16);
            manager.set_region_context(RegionContext::new("forest"));
            share += manager.get_or_generate_chunk(0, 0).fraction(&[Forest]);
        }
        let share = share / 10.0;
        assert!(share > 0.5, "forest share {share}");
    }

    #[test]
    fn test_forest_and_desert_kept_apart() {
        let mut trials = 0;
        let mut separated = 0;
        for seed in 0..20 {
            let manager = test_manager(seed, 8);
            let mut forests = Vec::new();
            let mut deserts = Vec::new();
            for y in 0..16 {
                for x in 0..16 {
                    match manager.get_tile_at(x, y) {
                        Forest => forests.push((x, y)),
                        Desert => deserts.push((x, y)),
                        _ => {},
                    }
                }
            }
            if forests.is_empty() || deserts.is_empty() {
                continue;
            }
            trials += 1;
            let min_distance = forests
                .iter()
                .flat_map(|f| deserts.iter().map(move |d| (f.0 - d.0).abs() + (f.1 - d.1).abs()))
                .min()
                .unwrap_or(i64::MAX);
            if min_distance >= 3 {
                separated += 1;
            }
        }
        assert!(trials > 0);
        assert!(
            separated * 10 >= trials * 6,
            "only {separated} of {trials} trials kept forest and desert apart"
        );
    }

    #[test]
    fn test_region_context_only_affects_new_chunks() {
        let manager = test_manager(11, 16);
        let before = manager.get_or_generate_chunk(0, 0);

        manager.set_region_context(RegionContext::new("desert").with_danger_level("high"));
        assert_eq!(
            manager.region_context().map(|r| r.danger_level).as_deref(),
            Some("high")
        );
        assert_eq!(manager.stats().theme.as_deref(), Some("desert"));

        let after = manager.get_or_generate_chunk(0, 0);
        assert!(Arc::ptr_eq(&before, &after));

        let plain = test_manager(11, 16);
        let themed = manager.get_or_generate_chunk(20, 20);
        let unthemed = plain.get_or_generate_chunk(20, 20);
        assert!(themed.count(Desert) > unthemed.count(Desert));

        manager.clear_region_context();
        assert!(manager.region_context().is_none());
        assert!(manager.stats().theme.is_none());
    }

    #[test]
    fn test_terrain_in_radius() {
        let manager = test_manager(8, 8);
        let tiles = manager.terrain_in_radius(-3, 5, 2);
        assert_eq!(tiles.len(), 13);
        for (&(x, y), &terrain) in &tiles {
            assert_eq!(manager.get_tile_at(x, y), terrain);
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = WorldConfig::default();
        config.chunk_size = 4;
        config.weights.insert("water".into(), 0.0);
        let manager = ChunkManager::from_config(&config).expect("valid config");

        assert_eq!(manager.chunk_size(), 4);
        assert_eq!(manager.world_seed(), config.world_seed);
        assert_eq!(manager.registry().weight(TerrainType::Water), 0.0);

        config.chunk_size = 0;
        assert!(ChunkManager::from_config(&config).is_err());

        config.chunk_size = 4;
        config.penalty_radius = MAX_PENALTY_RADIUS + 1;
        assert_eq!(
            ChunkManager::from_config(&config).err(),
            Some(WorldError::InvalidPenaltyRadius(MAX_PENALTY_RADIUS + 1))
        );
    }

    #[test]
    fn test_rejects_large_penalty_radius() {
        assert!(test_manager(1, 8).with_penalty_radius(MAX_PENALTY_RADIUS).is_ok());
        assert_eq!(
            test_manager(1, 8).with_penalty_radius(u32::MAX).err(),
            Some(WorldError::InvalidPenaltyRadius(u32::MAX))
        );
    }

    #[test]
    fn test_far_tiles_use_distinct_chunks() {
        let manager = test_manager(4, 16);
        manager.get_tile_at(5, 5);
        manager.get_tile_at(5 + (16 << 32), 5);

        assert_eq!(manager.generated_count(), 2);
        assert!(manager.is_generated(ChunkCoord::new(0, 0)));
        assert!(manager.is_generated(ChunkCoord::new(1 << 32, 0)));
        assert_ne!(
            chunk_seed(4, ChunkCoord::new(0, 0)),
            chunk_seed(4, ChunkCoord::new(1 << 32, 0))
        );
    }

    #[test]
    fn test_extreme_coordinates() {
        for chunk_size in [1, 8] {
            let manager = test_manager(12, chunk_size);
            let corners = [
                (i64::MAX, i64::MIN),
                (i64::MIN, i64::MAX),
                (i64::MAX, i64::MAX),
                (i64::MIN, i64::MIN),
            ];
            for (x, y) in corners {
                let terrain = manager.get_tile_at(x, y);
                assert_eq!(manager.get_tile_at(x, y), terrain);
            }
            // Neighbors of a cached corner chunk pick it up as context.
            assert_area_adjacency_valid(&manager, i64::MAX - 3, i64::MAX - 1);
            let tiles = manager.terrain_in_radius(i64::MAX, i64::MIN, 2);
            assert_eq!(tiles.len(), 6);
        }
    }

    #[test]
    fn test_relaxed_cells_are_counted() {
        // Self-only adjacency: each chunk floods with a single terrain, so a
        // chunk squeezed between two different floods must relax.
        let registry = TerrainType::ALL
            .into_iter()
            .fold(TileRegistry::builder(), |b, t| b.allowed_neighbors(t, [t]))
            .build()
            .expect("valid registry");
        let registry = Arc::new(registry);

        let mut total = 0;
        for seed in 0..20 {
            let manager =
                ChunkManager::new(seed, 4, Arc::clone(&registry)).expect("valid size");
            let chunks = [(0, 0), (2, 0), (1, 0)].map(|(x, y)| manager.get_or_generate_chunk(x, y));

            let per_chunk: u64 = chunks.iter().map(|c| u64::from(c.relaxations())).sum();
            assert_eq!(manager.stats().relaxed_cells, per_chunk, "seed {seed}");
            assert!(chunks
                .iter()
                .all(|c| c.tiles().iter().all(|t| TerrainType::ALL.contains(t))));
            if chunks[0].get(0, 0) != chunks[1].get(0, 0) {
                assert!(chunks[2].relaxations() > 0, "seed {seed}");
            }
            total += per_chunk;
        }
        assert!(total > 0);
    }

    #[test]
    fn test_concurrent_access_generates_once() {
        let manager = Arc::new(test_manager(77, 8));
        let coords = spiral_chunks(ChunkCoord::new(0, 0), 2);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let mut coords = coords.clone();
                coords.rotate_left(i * 3);
                std::thread::spawn(move || {
                    coords
                        .into_iter()
                        .map(|c| manager.chunk(c))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for chunk in handle.join().expect("worker panicked") {
                let cached = manager.chunk(chunk.coord());
                assert!(Arc::ptr_eq(&chunk, &cached), "{:?} generated twice", chunk.coord());
            }
        }
        assert_eq!(manager.generated_count(), 25);
    }
}
