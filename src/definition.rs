//! JSON puzzle definitions
//!
//! A definition is everything a designer authors for one puzzle: tile
//! placements, the solution table, sockets and tuning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use crate::settings::PuzzleSettings;
use crate::sim::{FeedbackPort, Gate, Puzzle, Scheduler, SolutionTable, TileSlot, TileSpec};

/// The 4x4 cable room that ships with the crate
pub const CABLE_ROOM_JSON: &str = include_str!("../demos/cable_room.json");
/// Global-match relay room that ships with the crate
pub const RELAY_ROOM_JSON: &str = include_str!("../demos/relay_room.json");

/// A designer-authored puzzle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: PuzzleSettings,
    /// Placed tiles have a position; loose ones wait for a slot
    pub tiles: Vec<TileSpec>,
    pub solution: SolutionTable,
    #[serde(default)]
    pub slots: Vec<TileSlot>,
}

impl PuzzleDefinition {
    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a definition file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let def = Self::from_json(&json)?;
        log::info!("Loaded puzzle '{}' from {}", def.name, path.display());
        Ok(def)
    }

    pub fn to_json(&self) -> Result<String, PuzzleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Bind the definition to its collaborators. Tiles without a position
    /// start loose.
    pub fn build<G: Gate, F: FeedbackPort, S: Scheduler>(
        &self,
        gate: G,
        feedback: F,
        scheduler: S,
    ) -> Puzzle<G, F, S> {
        Puzzle::new(
            &self.tiles,
            self.solution.clone(),
            self.settings.clone(),
            gate,
            feedback,
            scheduler,
        )
    }
}
