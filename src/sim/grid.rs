//! Grid discovery from tile positions
//!
//! Tiles are authored at floating-point local positions. The builder snaps
//! them to integer cells:
//! - subtract the minimum x/y over all placed tiles
//! - divide by the cell spacing
//! - round to the nearest integer
//!
//! Dimensions are `(max_x + 1) x (max_y + 1)`. A tile further than the
//! alignment tolerance from its cell centre is a configuration error, as is
//! a second tile landing on an occupied cell (the first one is kept).
//! Layouts spanning more than [`MAX_GRID_CELLS`] cells are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tile::{Tile, TileId};
use crate::consts::{MAX_GRID_CELLS, MIN_SPACING};
use crate::error::ConfigError;

/// Integer grid coordinate. Signed so out-of-range events stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Cell> for (i32, i32) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Fixed-size occupancy grid of tile ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<TileId>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    /// Tile at `cell`, `None` when empty or outside the grid
    pub fn get(&self, cell: Cell) -> Option<TileId> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    /// Put `tile` at `cell`. An occupied cell is left alone and its
    /// current tile is returned as the error.
    pub fn place(&mut self, cell: Cell, tile: TileId) -> Result<(), PlaceError> {
        let i = self.index(cell).ok_or(PlaceError::OutOfRange)?;
        match self.cells[i] {
            Some(existing) if existing != tile => Err(PlaceError::Occupied(existing)),
            _ => {
                self.cells[i] = Some(tile);
                Ok(())
            }
        }
    }

    /// Empty `cell`, returning the tile that was there
    pub fn clear(&mut self, cell: Cell) -> Option<TileId> {
        self.index(cell).and_then(|i| self.cells[i].take())
    }

    /// Occupied cells in row-major order (y outer, x inner)
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, TileId)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, slot)| {
            slot.map(|id| {
                let cell = Cell::new((i % self.width) as i32, (i / self.width) as i32);
                (cell, id)
            })
        })
    }

    /// Re-derive occupancy from the tiles' current cells.
    ///
    /// Used after insertion/removal instead of patching the previous grid.
    pub fn from_tiles(width: usize, height: usize, tiles: &[Tile]) -> (Self, Vec<ConfigError>) {
        let mut grid = Self::new(width, height);
        let mut issues = Vec::new();
        for tile in tiles {
            let Some(cell) = tile.cell else { continue };
            match grid.place(cell, tile.id) {
                Ok(()) => {}
                Err(PlaceError::Occupied(kept)) => issues.push(ConfigError::DuplicateCell {
                    cell,
                    kept,
                    rejected: tile.id,
                }),
                Err(PlaceError::OutOfRange) => {
                    log::debug!("Tile {} at {} is outside the {}x{} grid", tile.id, cell, width, height);
                }
            }
        }
        (grid, issues)
    }
}

/// Why a placement failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    OutOfRange,
    Occupied(TileId),
}

/// Result of a grid build
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub grid: Grid,
    /// Cell assigned to each accepted tile, in input order
    pub assignments: Vec<(TileId, Cell)>,
    /// Non-fatal problems found while building
    pub issues: Vec<ConfigError>,
}

/// Snap placed tiles to a grid.
///
/// Tiles without a position are ignored. Fails only when nothing can be
/// built at all; per-tile problems land in [`GridLayout::issues`].
pub fn build_grid(
    tiles: &[Tile],
    spacing: f32,
    tolerance: Option<f32>,
) -> Result<GridLayout, ConfigError> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(ConfigError::InvalidSpacing(spacing));
    }
    let spacing = spacing.max(MIN_SPACING);
    let tolerance = tolerance.unwrap_or(spacing / 2.0);

    let mut issues = Vec::new();
    let mut placed = Vec::new();
    for tile in tiles {
        let Some(pos) = tile.position else { continue };
        if !pos.is_finite() {
            issues.push(ConfigError::NonFinitePosition { tile: tile.id });
            continue;
        }
        placed.push((tile.id, pos));
    }
    if placed.is_empty() {
        return Err(ConfigError::NoTiles);
    }

    let min = placed
        .iter()
        .fold(glam::Vec2::splat(f32::INFINITY), |acc, (_, p)| acc.min(*p));

    // Offsets from the minimum are never negative; the float casts saturate
    let mut snapped = Vec::with_capacity(placed.len());
    let (mut max_x, mut max_y) = (0u64, 0u64);
    for (id, pos) in placed {
        let f = (pos - min) / spacing;
        let r = f.round();
        let offset = (f - r).abs().max_element() * spacing;
        if offset > tolerance {
            issues.push(ConfigError::Misaligned { tile: id, offset });
            continue;
        }
        let (x, y) = (r.x as u64, r.y as u64);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        snapped.push((id, x, y));
    }

    let (width, height) = (max_x.saturating_add(1), max_y.saturating_add(1));
    if width.saturating_mul(height) > MAX_GRID_CELLS as u64 {
        return Err(ConfigError::GridTooLarge { width, height });
    }
    // Both sides are now bounded by MAX_GRID_CELLS
    let (width, height) = (width as usize, height as usize);
    let mut grid = Grid::new(width, height);
    let mut assignments = Vec::with_capacity(snapped.len());
    for (id, x, y) in snapped {
        let cell = Cell::new(x as i32, y as i32);
        match grid.place(cell, id) {
            Ok(()) => assignments.push((id, cell)),
            Err(PlaceError::Occupied(kept)) => issues.push(ConfigError::DuplicateCell {
                cell,
                kept,
                rejected: id,
            }),
            // Every snapped cell is inside the computed bounds
            Err(PlaceError::OutOfRange) => {}
        }
    }

    for issue in &issues {
        log::error!("Grid build: {issue}");
    }
    log::info!("Grid created {width}x{height} ({} tiles)", assignments.len());

    Ok(GridLayout {
        grid,
        assignments,
        issues,
    })
}

/// Source and target tiles of a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub source: Option<TileId>,
    pub target: Option<TileId>,
}

impl Endpoints {
    /// Scan the grid for flagged tiles. Exactly one of each is required.
    pub fn discover(grid: &Grid, tiles: &[Tile]) -> (Self, Vec<ConfigError>) {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        for (_, id) in grid.occupied() {
            let Some(tile) = tiles.iter().find(|t| t.id == id) else { continue };
            if tile.is_source {
                sources.push(id);
            }
            if tile.is_target {
                targets.push(id);
            }
        }

        let mut issues = Vec::new();
        let source = match sources.as_slice() {
            [] => {
                issues.push(ConfigError::MissingSource);
                None
            }
            [one] => Some(*one),
            _ => {
                issues.push(ConfigError::MultipleSources(sources.clone()));
                None
            }
        };
        let target = match targets.as_slice() {
            [] => {
                issues.push(ConfigError::MissingTarget);
                None
            }
            [one] => Some(*one),
            _ => {
                issues.push(ConfigError::MultipleTargets(targets.clone()));
                None
            }
        };
        (Self { source, target }, issues)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mask::Mask;
    use crate::sim::tile::TileSpec;
    use glam::Vec2;
    use proptest::prelude::*;

    fn tile_at(id: TileId, x: f32, y: f32) -> Tile {
        Tile::from_spec(&TileSpec::placed(id, Vec2::new(x, y), Mask::EMPTY))
    }

    #[test]
    fn test_build_infers_cells_from_offset_origin() {
        let tiles = vec![
            tile_at(1, -2.2, 5.0),
            tile_at(2, -1.1, 5.0),
            tile_at(3, 0.0, 6.1),
        ];
        let layout = build_grid(&tiles, 1.1, None).unwrap();
        assert_eq!(layout.grid.width(), 3);
        assert_eq!(layout.grid.height(), 2);
        assert_eq!(layout.grid.get(Cell::new(0, 0)), Some(1));
        assert_eq!(layout.grid.get(Cell::new(1, 0)), Some(2));
        assert_eq!(layout.grid.get(Cell::new(2, 1)), Some(3));
        assert_eq!(layout.grid.get(Cell::new(2, 0)), None);
        assert!(layout.issues.is_empty());
    }

    #[test]
    fn test_build_rounds_small_jitter() {
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.13, -0.02)];
        let layout = build_grid(&tiles, 1.1, None).unwrap();
        assert_eq!(layout.assignments, vec![(1, Cell::new(0, 0)), (2, Cell::new(1, 0))]);
    }

    #[test]
    fn test_build_far_apart_tiles_is_error() {
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 3.0e9, 0.0)];
        assert!(matches!(
            build_grid(&tiles, 1.0, None),
            Err(ConfigError::GridTooLarge { height: 1, .. })
        ));

        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.0e5, 1.0e5)];
        assert!(matches!(
            build_grid(&tiles, 1.0, None),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_build_at_cell_cap_is_ok() {
        let side = (MAX_GRID_CELLS as f32).sqrt();
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, side - 1.0, side - 1.0)];
        let layout = build_grid(&tiles, 1.0, None).unwrap();
        assert_eq!(layout.grid.width() * layout.grid.height(), MAX_GRID_CELLS);
        assert_eq!(layout.grid.get(Cell::new(255, 255)), Some(2));
    }

    #[test]
    fn test_build_no_tiles_is_error() {
        assert!(matches!(build_grid(&[], 1.1, None), Err(ConfigError::NoTiles)));
        let loose = vec![Tile::from_spec(&TileSpec::loose(9, Mask::EMPTY))];
        assert!(matches!(build_grid(&loose, 1.1, None), Err(ConfigError::NoTiles)));
    }

    #[test]
    fn test_build_rejects_bad_spacing() {
        let tiles = vec![tile_at(1, 0.0, 0.0)];
        assert!(matches!(build_grid(&tiles, 0.0, None), Err(ConfigError::InvalidSpacing(_))));
        assert!(matches!(build_grid(&tiles, f32::NAN, None), Err(ConfigError::InvalidSpacing(_))));
    }

    #[test]
    fn test_duplicate_keeps_first_tile() {
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.1, 0.0), tile_at(3, 1.12, 0.01)];
        let layout = build_grid(&tiles, 1.1, None).unwrap();
        assert_eq!(layout.grid.get(Cell::new(1, 0)), Some(2));
        assert_eq!(
            layout.issues,
            vec![ConfigError::DuplicateCell {
                cell: Cell::new(1, 0),
                kept: 2,
                rejected: 3
            }]
        );
        assert_eq!(layout.assignments.len(), 2);
    }

    #[test]
    fn test_misaligned_tile_reported_with_tight_tolerance() {
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.5, 0.0)];
        let layout = build_grid(&tiles, 1.1, Some(0.1)).unwrap();
        assert_eq!(layout.grid.get(Cell::new(0, 0)), Some(1));
        assert!(matches!(layout.issues[0], ConfigError::Misaligned { tile: 2, .. }));
    }

    #[test]
    fn test_non_finite_position_skipped() {
        let tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, f32::NAN, 0.0)];
        let layout = build_grid(&tiles, 1.0, None).unwrap();
        assert_eq!(layout.grid.width(), 1);
        assert_eq!(layout.issues, vec![ConfigError::NonFinitePosition { tile: 2 }]);
    }

    #[test]
    fn test_out_of_range_lookups() {
        let grid = Grid::new(2, 2);
        assert!(!grid.contains(Cell::new(-1, 0)));
        assert!(!grid.contains(Cell::new(2, 0)));
        assert_eq!(grid.get(Cell::new(5, 5)), None);
    }

    #[test]
    fn test_place_and_clear() {
        let mut grid = Grid::new(2, 1);
        assert_eq!(grid.place(Cell::new(1, 0), 4), Ok(()));
        assert_eq!(grid.place(Cell::new(1, 0), 5), Err(PlaceError::Occupied(4)));
        assert_eq!(grid.place(Cell::new(3, 0), 5), Err(PlaceError::OutOfRange));
        assert_eq!(grid.clear(Cell::new(1, 0)), Some(4));
        assert_eq!(grid.occupied().count(), 0);
    }

    #[test]
    fn test_endpoints_discovery() {
        let mut tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.0, 0.0), tile_at(3, 2.0, 0.0)];
        tiles[0].is_source = true;
        tiles[2].is_target = true;
        let layout = build_grid(&tiles, 1.0, None).unwrap();
        let (ends, issues) = Endpoints::discover(&layout.grid, &tiles);
        assert_eq!(ends.source, Some(1));
        assert_eq!(ends.target, Some(3));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_endpoints_missing_and_duplicate() {
        let mut tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.0, 0.0)];
        tiles[0].is_source = true;
        tiles[1].is_source = true;
        let layout = build_grid(&tiles, 1.0, None).unwrap();
        let (ends, issues) = Endpoints::discover(&layout.grid, &tiles);
        assert!(!ends.is_complete());
        assert!(issues.contains(&ConfigError::MultipleSources(vec![1, 2])));
        assert!(issues.contains(&ConfigError::MissingTarget));
    }

    #[test]
    fn test_from_tiles_rederives_occupancy() {
        let mut tiles = vec![tile_at(1, 0.0, 0.0), tile_at(2, 1.0, 0.0)];
        tiles[0].cell = Some(Cell::new(0, 0));
        tiles[1].cell = Some(Cell::new(0, 0));
        let (grid, issues) = Grid::from_tiles(2, 1, &tiles);
        assert_eq!(grid.get(Cell::new(0, 0)), Some(1));
        assert_eq!(issues.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_build_is_deterministic(
            raw in prop::collection::vec((0i32..6, 0i32..6, -0.3f32..0.3, -0.3f32..0.3), 1..20)
        ) {
            let tiles: Vec<Tile> = raw
                .iter()
                .enumerate()
                .map(|(i, (x, y, jx, jy))| {
                    tile_at(i as TileId, *x as f32 * 1.1 + jx, *y as f32 * 1.1 + jy)
                })
                .collect();
            let a = build_grid(&tiles, 1.1, None).unwrap();
            let b = build_grid(&tiles, 1.1, None).unwrap();
            prop_assert_eq!(&a.grid, &b.grid);
            prop_assert_eq!(&a.assignments, &b.assignments);
            prop_assert_eq!(a.assignments.len() + a.issues.len(), tiles.len());
        }
    }
}
