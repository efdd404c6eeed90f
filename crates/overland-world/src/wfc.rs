//! Wave Function Collapse terrain solver.
//!
//! The solver fills a `width x height` grid with terrain such that every pair
//! of 4-connected cells is allowed by the [`TileRegistry`]:
//!
//! 1. Every free cell starts with all terrain possible; fixed cells start
//!    collapsed. Fixed cells outside the grid act as context that constrains
//!    the grid edge.
//! 2. Propagation intersects each neighbor of a changed cell with the union of
//!    the allowed neighbors of that cell's possibilities, until nothing
//!    changes.
//! 3. The lowest-entropy cell (fewest possibilities, first in row-major order
//!    on ties) is collapsed by weighted sampling, then propagation runs again.
//!
//! There is no backtracking. If propagation would leave a cell with no
//! possibilities, the cell is relaxed: it is fixed to the heaviest terrain it
//! could hold just before the contradiction, and generation continues. The
//! number of relaxed cells is reported in [`TerrainGrid::relaxations`].
//!
//! All randomness comes from a [`fastrand::Rng`] seeded per call, so a call is
//! a pure function of its inputs and safe to run on any thread.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use ahash::AHashMap;
use overland_common::{WorldError, WorldResult};
use tracing::{debug, trace};

use crate::bias::{check_penalty_radius, distance_penalty, radius_offsets, DEFAULT_PENALTY_RADIUS};
use crate::registry::TileRegistry;
use crate::terrain::{TerrainSet, TerrainType, TerrainWeights};

/// 4-connected neighbor offsets: +X, +Y, -X, -Y.
const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

// ============================================================================
// Fixed Boundary
// ============================================================================

/// Pre-collapsed cells handed to the solver.
///
/// Coordinates are grid-local. Cells inside the grid are emitted verbatim;
/// cells outside it are context (typically the edge of an already generated
/// neighbor chunk).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedBoundary {
    cells: AHashMap<(i32, i32), TerrainType>,
}

impl FixedBoundary {
    /// Creates an empty boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `(coordinate, terrain name)` pairs.
    ///
    /// Fails on the first unknown terrain name.
    pub fn from_named<'a, I>(cells: I) -> WorldResult<Self>
    where
        I: IntoIterator<Item = ((i32, i32), &'a str)>,
    {
        let mut boundary = Self::new();
        for (pos, name) in cells {
            boundary.insert(pos, name.parse()?);
        }
        Ok(boundary)
    }

    /// Fixes `pos` to `terrain`, replacing any previous value.
    pub fn insert(&mut self, pos: (i32, i32), terrain: TerrainType) {
        self.cells.insert(pos, terrain);
    }

    /// Terrain fixed at `pos`.
    #[must_use]
    pub fn get(&self, pos: (i32, i32)) -> Option<TerrainType> {
        self.cells.get(&pos).copied()
    }

    /// Number of fixed cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if nothing is fixed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates fixed cells in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), TerrainType)> + '_ {
        self.cells.iter().map(|(&pos, &terrain)| (pos, terrain))
    }
}

impl FromIterator<((i32, i32), TerrainType)> for FixedBoundary {
    fn from_iter<I: IntoIterator<Item = ((i32, i32), TerrainType)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Cells and Output
// ============================================================================

/// One solver cell.
///
/// Starts uncollapsed with a possibility set, shrinks under propagation and
/// is fixed by collapse. A collapsed cell is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WfcCell {
    x: i32,
    y: i32,
    possible: TerrainSet,
    collapsed: bool,
}

impl WfcCell {
    fn open(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            possible: TerrainSet::all(),
            collapsed: false,
        }
    }

    fn fixed(x: i32, y: i32, terrain: TerrainType) -> Self {
        Self {
            x,
            y,
            possible: TerrainSet::single(terrain),
            collapsed: true,
        }
    }

    /// Committed terrain, if collapsed.
    fn terrain(&self) -> Option<TerrainType> {
        if self.collapsed {
            self.possible.first()
        } else {
            None
        }
    }

    fn collapse(&mut self, terrain: TerrainType) {
        self.possible = TerrainSet::single(terrain);
        self.collapsed = true;
    }
}

/// Fully collapsed solver output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    tiles: Vec<TerrainType>,
    relaxations: u32,
}

impl TerrainGrid {
    /// Grid width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Terrain at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<TerrainType> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize).copied()
    }

    /// Row-major tiles.
    #[must_use]
    pub fn tiles(&self) -> &[TerrainType] {
        &self.tiles
    }

    /// Iterates `((x, y), terrain)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), TerrainType)> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, &t)| (((i as u32) % width, (i as u32) / width), t))
    }

    /// Cells resolved by the contradiction fallback instead of propagation.
    #[must_use]
    pub const fn relaxations(&self) -> u32 {
        self.relaxations
    }

    /// Consumes the grid, returning the row-major tiles.
    #[must_use]
    pub fn into_tiles(self) -> Vec<TerrainType> {
        self.tiles
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Seeded constraint-propagation solver for one grid.
///
/// # Example
///
/// ```
/// use overland_world::{TileRegistry, WfcGenerator};
///
/// let registry = TileRegistry::default();
/// let grid = WfcGenerator::new(8, 8, &registry, 42)?.generate();
/// assert_eq!(grid.tiles().len(), 64);
/// # Ok::<(), overland_common::WorldError>(())
/// ```
#[derive(Debug, Clone)]
pub struct WfcGenerator<'a> {
    width: u32,
    height: u32,
    registry: &'a TileRegistry,
    seed: u64,
    overrides: Option<&'a TerrainWeights>,
    boundary: Option<&'a FixedBoundary>,
    penalty_radius: u32,
}

impl<'a> WfcGenerator<'a> {
    /// Creates a solver for a `width x height` grid.
    pub fn new(width: u32, height: u32, registry: &'a TileRegistry, seed: u64) -> WorldResult<Self> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidGridSize { width, height });
        }
        Ok(Self::with_size(width, height, registry, seed))
    }

    /// Creates a solver for a square grid whose size and penalty radius were
    /// validated by the caller.
    pub(crate) fn square(
        size: NonZeroU32,
        penalty_radius: u32,
        registry: &'a TileRegistry,
        seed: u64,
    ) -> Self {
        debug_assert!(check_penalty_radius(penalty_radius).is_ok());
        Self {
            penalty_radius,
            ..Self::with_size(size.get(), size.get(), registry, seed)
        }
    }

    fn with_size(width: u32, height: u32, registry: &'a TileRegistry, seed: u64) -> Self {
        Self {
            width,
            height,
            registry,
            seed,
            overrides: None,
            boundary: None,
            penalty_radius: DEFAULT_PENALTY_RADIUS,
        }
    }

    /// Multiplies base weights by `overrides` when sampling.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &'a TerrainWeights) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Pre-collapses the given cells.
    #[must_use]
    pub fn with_boundary(mut self, boundary: &'a FixedBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Sets the radius searched for incompatible biome groups.
    ///
    /// Fails above [`MAX_PENALTY_RADIUS`](crate::bias::MAX_PENALTY_RADIUS).
    pub fn with_penalty_radius(mut self, radius: u32) -> WorldResult<Self> {
        self.penalty_radius = check_penalty_radius(radius)?;
        Ok(self)
    }

    /// Runs the solver to completion.
    #[must_use]
    pub fn generate(&self) -> TerrainGrid {
        let mut run = Run::new(self);
        run.seed_constraints();
        while let Some(index) = run.lowest_entropy_cell() {
            run.observe(index);
        }
        run.finish()
    }

    /// Base weight times override multiplier.
    fn effective_weight(&self, terrain: TerrainType) -> f64 {
        let multiplier = self.overrides.map_or(1.0, |o| o.get(terrain));
        self.registry.weight(terrain) * multiplier
    }
}

/// State of one `generate` call.
struct Run<'g, 'a> {
    config: &'g WfcGenerator<'a>,
    cells: Vec<WfcCell>,
    /// Uncollapsed cells keyed by (entropy, row-major index)
    open: BTreeSet<(usize, usize)>,
    rng: fastrand::Rng,
    offsets: Vec<(i32, i32)>,
    stack: Vec<usize>,
    relaxations: u32,
}

impl<'g, 'a> Run<'g, 'a> {
    fn new(config: &'g WfcGenerator<'a>) -> Self {
        let width = config.width as i32;
        let count = (config.width * config.height) as usize;
        let mut cells = Vec::with_capacity(count);
        for i in 0..count as i32 {
            let (x, y) = (i % width, i / width);
            let cell = match config.boundary.and_then(|b| b.get((x, y))) {
                Some(terrain) => WfcCell::fixed(x, y, terrain),
                None => WfcCell::open(x, y),
            };
            cells.push(cell);
        }

        let open = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.collapsed)
            .map(|(i, cell)| (cell.possible.len(), i))
            .collect();

        // The radius is bounded, so offsets fit in grid coordinates.
        let offsets = radius_offsets(config.penalty_radius)
            .filter(|&offset| offset != (0, 0))
            .map(|(dx, dy)| (dx as i32, dy as i32))
            .collect();

        Self {
            config,
            cells,
            open,
            rng: fastrand::Rng::with_seed(config.seed),
            offsets,
            stack: Vec::with_capacity(count),
            relaxations: 0,
        }
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let (w, h) = (self.config.width as i32, self.config.height as i32);
        if x < 0 || y < 0 || x >= w || y >= h {
            return None;
        }
        Some((y * w + x) as usize)
    }

    /// Terrain committed at `(x, y)`, looking at context cells off-grid.
    fn collapsed_at(&self, x: i32, y: i32) -> Option<TerrainType> {
        match self.index_of(x, y) {
            Some(i) => self.cells[i].terrain(),
            None => self.config.boundary.and_then(|b| b.get((x, y))),
        }
    }

    /// Applies fixed cells and context cells, then propagates.
    fn seed_constraints(&mut self) {
        let Some(boundary) = self.config.boundary else {
            return;
        };

        let mut context: Vec<((i32, i32), TerrainType)> = boundary
            .iter()
            .filter(|&((x, y), _)| self.index_of(x, y).is_none())
            .collect();
        // Hash order is not stable across runs; constraint order must be.
        context.sort_unstable_by_key(|&((x, y), _)| (y, x));

        for ((x, y), terrain) in context {
            let allowed = self.config.registry.allowed_neighbors(terrain);
            for (dx, dy) in NEIGHBORS {
                if let Some(n) = self.index_of(x + dx, y + dy) {
                    self.restrict(n, allowed);
                }
            }
        }

        for i in 0..self.cells.len() {
            if self.cells[i].collapsed {
                self.stack.push(i);
            }
        }
        self.propagate();
    }

    /// Intersects cell `n` with `allowed`, relaxing on contradiction.
    fn restrict(&mut self, n: usize, allowed: TerrainSet) {
        let cell = self.cells[n];
        if cell.collapsed {
            return;
        }
        let narrowed = cell.possible & allowed;
        if narrowed == cell.possible {
            return;
        }
        self.open.remove(&(cell.possible.len(), n));
        if narrowed.is_empty() {
            self.relax(n, cell.possible);
        } else {
            self.cells[n].possible = narrowed;
            self.open.insert((narrowed.len(), n));
        }
        self.stack.push(n);
    }

    /// Fixes cell `n` to the heaviest terrain of `before`.
    fn relax(&mut self, n: usize, before: TerrainSet) {
        let mut best: Option<(TerrainType, f64)> = None;
        for terrain in before.iter() {
            let weight = self.config.effective_weight(terrain);
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((terrain, weight));
            }
        }
        let terrain = best.map_or(TerrainType::ALL[0], |(t, _)| t);
        let cell = &mut self.cells[n];
        debug!(
            "Contradiction at ({}, {}), relaxing to {terrain}",
            cell.x, cell.y
        );
        cell.collapse(terrain);
        self.relaxations += 1;
    }

    /// Runs the work stack to a fixed point.
    fn propagate(&mut self) {
        while let Some(i) = self.stack.pop() {
            let cell = self.cells[i];
            let support = self.config.registry.support_of(cell.possible);
            for (dx, dy) in NEIGHBORS {
                if let Some(n) = self.index_of(cell.x + dx, cell.y + dy) {
                    self.restrict(n, support);
                }
            }
        }
    }

    /// Uncollapsed cell with the fewest possibilities, first in scan order.
    fn lowest_entropy_cell(&self) -> Option<usize> {
        self.open.first().map(|&(_, i)| i)
    }

    /// Collapsed terrain within the penalty radius of `(x, y)`.
    fn nearby_terrain(&self, x: i32, y: i32) -> TerrainSet {
        self.offsets
            .iter()
            .filter_map(|&(dx, dy)| self.collapsed_at(x + dx, y + dy))
            .collect()
    }

    /// Collapses cell `i` by weighted sampling and propagates.
    fn observe(&mut self, i: usize) {
        let cell = self.cells[i];
        let candidates = cell.possible;
        self.open.remove(&(candidates.len(), i));

        let terrain = if candidates.len() == 1 {
            candidates.first()
        } else {
            let nearby = self.nearby_terrain(cell.x, cell.y);
            let registry = self.config.registry;
            let weighted: Vec<(TerrainType, f64)> = candidates
                .iter()
                .map(|t| {
                    let w = self.config.effective_weight(t) * distance_penalty(registry, t, nearby);
                    (t, w)
                })
                .collect();
            self.sample(&weighted)
        };

        // Possibility sets are never empty here; fall back for safety.
        let terrain = terrain.unwrap_or(TerrainType::ALL[0]);
        trace!("Collapse ({}, {}) -> {terrain}", cell.x, cell.y);
        self.cells[i].collapse(terrain);
        self.stack.push(i);
        self.propagate();
    }

    /// Weighted draw; the heaviest base weight wins if all weights are zero.
    fn sample(&mut self, weighted: &[(TerrainType, f64)]) -> Option<TerrainType> {
        let total: f64 = weighted.iter().map(|&(_, w)| w).sum();
        if !(total > 0.0 && total.is_finite()) {
            let registry = self.config.registry;
            return weighted
                .iter()
                .map(|&(t, _)| t)
                .fold(None, |best: Option<TerrainType>, t| match best {
                    Some(b) if registry.weight(b) >= registry.weight(t) => Some(b),
                    _ => Some(t),
                });
        }

        let threshold = self.rng.f64() * total;
        let mut partial = 0.0;
        for &(terrain, weight) in weighted {
            partial += weight;
            if partial > threshold {
                return Some(terrain);
            }
        }
        // Rounding can leave the threshold just past the last partial sum.
        weighted.iter().rev().find(|&&(_, w)| w > 0.0).map(|&(t, _)| t)
    }

    fn finish(self) -> TerrainGrid {
        let tiles = self
            .cells
            .iter()
            .map(|c| c.possible.first().unwrap_or(TerrainType::ALL[0]))
            .collect();
        if self.relaxations > 0 {
            debug!(
                "Generated {}x{} grid with {} relaxed cells",
                self.config.width, self.config.height, self.relaxations
            );
        }
        TerrainGrid {
            width: self.config.width,
            height: self.config.height,
            tiles,
            relaxations: self.relaxations,
        }
    }
}
