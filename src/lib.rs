//! Cable Grid - rotatable pipe-tile puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic puzzle logic (masks, grid discovery, validation)
//! - `settings`: Per-puzzle tuning
//! - `definition`: JSON puzzle layouts
//! - `error`: Configuration and loading errors

pub mod definition;
pub mod error;
pub mod settings;
pub mod sim;

pub use definition::PuzzleDefinition;
pub use error::{ConfigError, PuzzleError};
pub use settings::{PuzzleSettings, Variant};
pub use sim::{Puzzle, RotationOutcome, TimerQueue, Verdict};

/// Puzzle configuration constants
pub mod consts {
    /// Default distance between neighbouring tile centres (world units)
    pub const DEFAULT_SPACING: f32 = 1.1;
    /// Smallest spacing the grid builder divides by
    pub const MIN_SPACING: f32 = 0.0001;
    /// Largest grid (width x height) the builder will allocate
    pub const MAX_GRID_CELLS: usize = 256 * 256;

    /// Hold on a correct path step before it counts (seconds)
    pub const CORRECT_DELAY_SECS: f32 = 0.20;
    /// Wrong-rotation flash length (seconds)
    pub const WRONG_FLASH_SECS: f32 = 0.50;

    /// Solve blink cycles for the global-match variant
    pub const BLINK_COUNT: u32 = 3;
    /// Length of each blink half (seconds)
    pub const BLINK_SECS: f32 = 0.25;
    /// Upper bound on any configured delay (seconds)
    pub const MAX_DELAY_SECS: f32 = 3600.0;

    /// Fixed frame step used by the demo driver (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
}
