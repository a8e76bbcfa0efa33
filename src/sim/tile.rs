//! Rotatable cable tiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Cell;
use super::mask::Mask;

/// Stable tile identifier, assigned by the puzzle definition
pub type TileId = u32;

/// Abstract visual state reported to the feedback port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Unpowered, waiting for the player
    Neutral,
    /// Powered: correctly placed, or an endpoint
    Confirmed,
    /// Wrong rotation flash
    Rejected,
    /// Solve celebration blink
    Highlight,
}

/// Designer-facing description of a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub id: TileId,
    /// Local position inside the puzzle frame. Loose tiles have none.
    #[serde(default)]
    pub position: Option<Vec2>,
    /// Connection mask at rotation 0
    #[serde(default)]
    pub base_mask: Mask,
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub target: bool,
    /// Piece tag checked by sockets that only accept a specific piece
    #[serde(default)]
    pub piece: Option<String>,
}

impl TileSpec {
    /// A plain tile placed at `position`
    pub fn placed(id: TileId, position: Vec2, base_mask: Mask) -> Self {
        Self {
            id,
            position: Some(position),
            base_mask,
            source: false,
            target: false,
            piece: None,
        }
    }

    /// A tile that is not part of the grid until inserted into a socket
    pub fn loose(id: TileId, base_mask: Mask) -> Self {
        Self {
            id,
            position: None,
            base_mask,
            source: false,
            target: false,
            piece: None,
        }
    }

    pub fn as_source(mut self) -> Self {
        self.source = true;
        self
    }

    pub fn as_target(mut self) -> Self {
        self.target = true;
        self
    }

    pub fn with_piece(mut self, piece: impl Into<String>) -> Self {
        self.piece = Some(piece.into());
        self
    }
}

/// A live tile
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub base_mask: Mask,
    rotation_steps: u8,
    pub is_source: bool,
    pub is_target: bool,
    /// Locked tiles ignore player rotation
    pub locked: bool,
    /// Grid cell, `None` while the tile is out of the grid
    pub cell: Option<Cell>,
    pub position: Option<Vec2>,
    pub piece: Option<String>,
}

impl Tile {
    pub fn from_spec(spec: &TileSpec) -> Self {
        Self {
            id: spec.id,
            base_mask: spec.base_mask,
            rotation_steps: 0,
            is_source: spec.source,
            is_target: spec.target,
            locked: false,
            cell: None,
            position: spec.position,
            piece: spec.piece.clone(),
        }
    }

    #[inline]
    pub fn rotation_steps(&self) -> u8 {
        self.rotation_steps
    }

    /// Base mask rotated clockwise by the current rotation
    #[inline]
    pub fn current_mask(&self) -> Mask {
        self.base_mask.rotated(self.rotation_steps)
    }

    #[inline]
    pub fn is_endpoint(&self) -> bool {
        self.is_source || self.is_target
    }

    /// Player rotation: one quarter turn clockwise.
    ///
    /// Returns the new mask, or `None` if the tile is locked.
    pub fn rotate_once(&mut self) -> Option<Mask> {
        if self.locked {
            return None;
        }
        self.rotation_steps = (self.rotation_steps + 1) & 3;
        Some(self.current_mask())
    }

    /// Set rotation directly, ignoring the lock (scrambling, not play)
    pub fn force_set_rotation(&mut self, steps: i32) {
        self.rotation_steps = steps.rem_euclid(4) as u8;
    }

    pub fn reset(&mut self) {
        self.rotation_steps = 0;
    }
}
