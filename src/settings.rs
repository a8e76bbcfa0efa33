//! Puzzle settings
//!
//! Authored alongside each layout in its JSON definition. Every field has a
//! default, so a definition only lists what it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Validation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Tiles must be solved one at a time, in path order
    #[default]
    PathStepping,
    /// Every on-path tile must match at the same time
    GlobalMatch,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::PathStepping => "path_stepping",
            Variant::GlobalMatch => "global_match",
        }
    }
}

/// Tuning for one puzzle instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleSettings {
    /// World units between neighbouring cell centres
    pub spacing: f32,
    /// Max distance from a cell centre before a tile counts as misaligned.
    /// Defaults to half the spacing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_tolerance: Option<f32>,
    /// Hold before a correct path step advances
    pub correct_delay_secs: f32,
    /// Length of the wrong-rotation flash
    pub wrong_flash_secs: f32,
    /// Highlight/neutral cycles after a global solve
    pub blink_count: u32,
    /// Length of each blink half
    pub blink_secs: f32,
    /// Lock off-path tiles and clear their connectors
    pub lock_off_path_tiles: bool,
    pub variant: Variant,
    /// Seed for the initial scramble
    pub seed: u64,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            alignment_tolerance: None,
            correct_delay_secs: CORRECT_DELAY_SECS,
            wrong_flash_secs: WRONG_FLASH_SECS,
            blink_count: BLINK_COUNT,
            blink_secs: BLINK_SECS,
            lock_off_path_tiles: true,
            variant: Variant::PathStepping,
            seed: 0,
        }
    }
}

impl PuzzleSettings {
    /// Default settings for a given variant
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn correct_delay(&self) -> Duration {
        secs(self.correct_delay_secs)
    }

    pub fn wrong_flash(&self) -> Duration {
        secs(self.wrong_flash_secs)
    }

    pub fn blink_duration(&self) -> Duration {
        secs(self.blink_secs)
    }
}

/// Negative or non-finite durations collapse to zero, long ones are capped
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value)
        .map_or(Duration::ZERO, |d| d.min(Duration::from_secs_f32(MAX_DELAY_SECS)))
}
