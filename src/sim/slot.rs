//! Sockets that accept a loose tile into a fixed cell
//!
//! A slot can insist on a tagged piece and reassigns the inserted tile's
//! base mask, so the piece the player carries in only has to be rotated.

use serde::{Deserialize, Serialize};

use super::engine::Puzzle;
use super::grid::Cell;
use super::mask::Mask;
use super::ports::{FeedbackPort, Gate, Scheduler};
use super::tile::TileId;

/// Result of offering a tile to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Inserted,
    /// Piece tag did not match; the tile is handed back untouched
    WrongPiece,
    /// Slot already holds a tile
    Occupied,
    UnknownTile,
    /// The puzzle refused the insertion (cell outside the grid or taken)
    Refused,
}

/// A designer-placed socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSlot {
    pub cell: Cell,
    /// Only tiles carrying this piece tag are accepted
    #[serde(default)]
    pub required_piece: Option<String>,
    /// Base mask given to the tile on insertion
    pub inserted_base_mask: Mask,
    #[serde(skip)]
    occupant: Option<TileId>,
}

impl TileSlot {
    pub fn new(cell: Cell, inserted_base_mask: Mask) -> Self {
        Self {
            cell,
            required_piece: None,
            inserted_base_mask,
            occupant: None,
        }
    }

    pub fn requiring(mut self, piece: impl Into<String>) -> Self {
        self.required_piece = Some(piece.into());
        self
    }

    #[inline]
    pub fn occupant(&self) -> Option<TileId> {
        self.occupant
    }

    /// Seat `tile` in this slot and tell the puzzle
    pub fn insert<G: Gate, F: FeedbackPort, S: Scheduler>(
        &mut self,
        puzzle: &mut Puzzle<G, F, S>,
        tile: TileId,
    ) -> SlotOutcome {
        if self.occupant.is_some() {
            return SlotOutcome::Occupied;
        }
        let Some(t) = puzzle.tile(tile) else {
            return SlotOutcome::UnknownTile;
        };
        if let Some(required) = &self.required_piece {
            if t.piece.as_deref() != Some(required.as_str()) {
                log::debug!("Slot {} refused tile {tile}: wrong piece", self.cell);
                return SlotOutcome::WrongPiece;
            }
        }

        let previous = puzzle.tile_mut(tile).map(|t| {
            let before = t.base_mask;
            t.base_mask = self.inserted_base_mask;
            before
        });
        if puzzle.notify_inserted(tile, self.cell.x, self.cell.y) {
            self.occupant = Some(tile);
            SlotOutcome::Inserted
        } else {
            if let (Some(before), Some(t)) = (previous, puzzle.tile_mut(tile)) {
                t.base_mask = before;
            }
            SlotOutcome::Refused
        }
    }

    /// Pull the seated tile back out
    pub fn remove<G: Gate, F: FeedbackPort, S: Scheduler>(
        &mut self,
        puzzle: &mut Puzzle<G, F, S>,
    ) -> Option<TileId> {
        self.occupant.take()?;
        puzzle.notify_removed(self.cell.x, self.cell.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PuzzleSettings, Variant};
    use crate::sim::ports::testing::{RecordingFeedback, RecordingGate};
    use crate::sim::schedule::TimerQueue;
    use crate::sim::solution::SolutionTable;
    use crate::sim::tile::TileSpec;
    use glam::Vec2;

    type TestPuzzle = Puzzle<RecordingGate, RecordingFeedback, TimerQueue>;

    fn puzzle() -> TestPuzzle {
        let m = Mask::truncate;
        let specs = [
            TileSpec::placed(1, Vec2::new(0.0, 0.0), m(2)).as_source(),
            TileSpec::placed(3, Vec2::new(2.0, 0.0), m(8)).as_target(),
        ];
        let table = SolutionTable::with_path(
            [(Cell::new(0, 0), m(2)), (Cell::new(1, 0), m(10)), (Cell::new(2, 0), m(8))],
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)],
        );
        let settings = PuzzleSettings {
            spacing: 1.0,
            ..PuzzleSettings::for_variant(Variant::PathStepping)
        };
        let mut p = Puzzle::new(
            &specs,
            table,
            settings,
            RecordingGate::default(),
            RecordingFeedback::default(),
            TimerQueue::new(),
        );
        p.add_loose_tile(TileSpec::loose(2, m(15)).with_piece("MissingPiece"))
            .unwrap();
        p.add_loose_tile(TileSpec::loose(7, m(15)).with_piece("Decoy"))
            .unwrap();
        p
    }

    #[test]
    fn test_wrong_piece_is_refused() {
        let mut p = puzzle();
        let mut slot = TileSlot::new(Cell::new(1, 0), Mask::truncate(5)).requiring("MissingPiece");
        assert_eq!(slot.insert(&mut p, 7), SlotOutcome::WrongPiece);
        assert_eq!(p.tile(7).unwrap().base_mask, Mask::truncate(15));
        assert_eq!(p.grid().unwrap().get(Cell::new(1, 0)), None);
        assert_eq!(slot.insert(&mut p, 42), SlotOutcome::UnknownTile);
    }

    #[test]
    fn test_insert_sets_mask_and_registers() {
        let mut p = puzzle();
        p.tile_mut(2).unwrap().force_set_rotation(3);
        let mut slot = TileSlot::new(Cell::new(1, 0), Mask::truncate(5)).requiring("MissingPiece");
        assert_eq!(slot.insert(&mut p, 2), SlotOutcome::Inserted);
        let t = p.tile(2).unwrap();
        assert_eq!(t.base_mask, Mask::truncate(5));
        assert_eq!(t.rotation_steps(), 0);
        assert_eq!(p.grid().unwrap().get(Cell::new(1, 0)), Some(2));
        assert_eq!(slot.insert(&mut p, 7), SlotOutcome::Occupied);

        // The seated piece can now solve the last step
        p.rotate(2);
        p.tick(p.settings().correct_delay());
        assert!(p.is_finished());
        assert_eq!(p.gate().unlocks(), 1);
    }

    #[test]
    fn test_remove_clears_cell() {
        let mut p = puzzle();
        let mut slot = TileSlot::new(Cell::new(1, 0), Mask::truncate(5));
        assert_eq!(slot.remove(&mut p), None);
        slot.insert(&mut p, 7);
        assert_eq!(slot.remove(&mut p), Some(7));
        assert_eq!(slot.occupant(), None);
        assert_eq!(p.grid().unwrap().get(Cell::new(1, 0)), None);
    }

    #[test]
    fn test_out_of_grid_slot_restores_mask() {
        let mut p = puzzle();
        let mut slot = TileSlot::new(Cell::new(5, 5), Mask::truncate(5));
        assert_eq!(slot.insert(&mut p, 7), SlotOutcome::Refused);
        assert_eq!(p.tile(7).unwrap().base_mask, Mask::truncate(15));
        assert_eq!(slot.occupant(), None);
    }
}
