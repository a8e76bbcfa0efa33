//! Collaborator interfaces
//!
//! The engine never touches doors, materials or frame loops directly. It is
//! handed these ports at construction and only calls through them.

use std::time::Duration;

use super::grid::Cell;
use super::tile::{TileId, TileState};

/// The locked resource the puzzle guards. Calls are idempotent.
pub trait Gate {
    fn lock(&mut self);
    fn unlock(&mut self);
}

/// Receives per-tile visual state changes
pub trait FeedbackPort {
    fn set_tile_state(&mut self, tile: TileId, state: TileState);
}

/// Runs a continuation once, no earlier than `delay` from now, on the same
/// logical thread as every other event. Continuations are handed back to
/// [`crate::sim::Puzzle::resume`].
pub trait Scheduler {
    fn after(&mut self, delay: Duration, continuation: Continuation);
}

/// Half of a blink cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Highlight,
    Neutral,
}

/// Deferred work captured when a timed transition starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Finish a correct path step: advance progress, maybe unlock
    ConfirmStep { tile: TileId, cell: Cell, step: usize },
    /// End a wrong-rotation flash
    EndRejectFlash { tile: TileId, cell: Cell },
    /// Next half of the solve blink; `remaining` counts full cycles left
    /// including the current one
    Blink { phase: BlinkPhase, remaining: u32 },
}

/// Gate that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGate;

impl Gate for NoGate {
    fn lock(&mut self) {}
    fn unlock(&mut self) {}
}

/// Feedback sink that drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl FeedbackPort for NoFeedback {
    fn set_tile_state(&mut self, _tile: TileId, _state: TileState) {}
}
