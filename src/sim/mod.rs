//! Puzzle simulation module
//!
//! All puzzle logic lives here. This module must stay deterministic:
//! - Seeded RNG only (scramble)
//! - Stable iteration order (definition order, row-major grid scans)
//! - No rendering, input or platform dependencies; those sit behind `ports`

pub mod engine;
pub mod grid;
pub mod mask;
pub mod ports;
pub mod schedule;
pub mod slot;
pub mod solution;
pub mod tile;

pub use engine::{Progress, Puzzle, RotationOutcome, Verdict};
pub use grid::{Cell, Endpoints, Grid, GridLayout, build_grid};
pub use mask::{Direction, Mask};
pub use ports::{BlinkPhase, Continuation, FeedbackPort, Gate, NoFeedback, NoGate, Scheduler};
pub use schedule::TimerQueue;
pub use slot::{SlotOutcome, TileSlot};
pub use solution::{Requirement, SolutionTable};
pub use tile::{Tile, TileId, TileSpec, TileState};
