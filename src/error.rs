//! Error types
//!
//! Configuration problems are reported and collected, never fatal: a puzzle
//! with config errors stays inert with its gate locked.

use thiserror::Error;

use crate::sim::grid::Cell;
use crate::sim::tile::TileId;

/// Problems with a designer-authored layout or solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no tiles supplied to the grid builder")]
    NoTiles,
    #[error("tile layout spans {width}x{height} cells, too large for a grid")]
    GridTooLarge { width: u64, height: u64 },
    #[error("grid spacing must be a positive finite number, got {0}")]
    InvalidSpacing(f32),
    #[error("tile {tile} has a non-finite position")]
    NonFinitePosition { tile: TileId },
    #[error("tile {tile} is {offset:.4} units away from its cell centre")]
    Misaligned { tile: TileId, offset: f32 },
    #[error("duplicate cell {cell}: kept tile {kept}, rejected tile {rejected}")]
    DuplicateCell { cell: Cell, kept: TileId, rejected: TileId },
    #[error("tile id {0} is used more than once")]
    DuplicateTileId(TileId),
    #[error("missing source tile")]
    MissingSource,
    #[error("missing target tile")]
    MissingTarget,
    #[error("more than one source tile: {0:?}")]
    MultipleSources(Vec<TileId>),
    #[error("more than one target tile: {0:?}")]
    MultipleTargets(Vec<TileId>),
    #[error("path-stepping puzzle has no ordered path")]
    MissingPath,
    #[error("ordered path needs at least two cells, got {0}")]
    PathTooShort(usize),
    #[error("ordered path visits {0} more than once")]
    PathRevisits(Cell),
    #[error("path cell {0} has no required mask")]
    PathCellWithoutMask(Cell),
    #[error("required mask at {0} is not on the ordered path")]
    MaskCellOffPath(Cell),
    #[error("solution table is empty")]
    EmptySolution,
    #[error("required cell {0} lies outside the grid")]
    CellOutsideGrid(Cell),
    #[error("mask value {0} does not fit in four bits")]
    InvalidMask(u8),
}

/// Errors from loading puzzle definitions
#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("failed to read puzzle definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse puzzle definition: {0}")]
    Parse(#[from] serde_json::Error),
}
