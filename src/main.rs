//! Cable Grid - native demo driver
//!
//! Loads a puzzle definition (the built-in cable room by default), seats any
//! loose pieces in their slots and plays a scripted solve on a fixed frame
//! step, logging every gate and tile change.

use std::time::Duration;

use cable_grid::consts::FRAME_DT;
use cable_grid::definition::CABLE_ROOM_JSON;
use cable_grid::sim::{
    Cell, FeedbackPort, Gate, Mask, Progress, Puzzle, RotationOutcome, SlotOutcome, TileId,
    TileState, TimerQueue, Verdict,
};
use cable_grid::PuzzleDefinition;

/// Gate that logs its transitions
#[derive(Debug, Default)]
struct LogGate {
    unlocked: bool,
}

impl Gate for LogGate {
    fn lock(&mut self) {
        self.unlocked = false;
        log::info!("Door locked");
    }

    fn unlock(&mut self) {
        self.unlocked = true;
        log::info!("Door unlocked");
    }
}

struct LogFeedback;

impl FeedbackPort for LogFeedback {
    fn set_tile_state(&mut self, tile: TileId, state: TileState) {
        log::debug!("Tile {tile} -> {state:?}");
    }
}

type DemoPuzzle = Puzzle<LogGate, LogFeedback, TimerQueue>;

/// Safety cap on simulated frames per wait
const MAX_WAIT_FRAMES: u32 = 600;

/// Tick frames until no transition is pending
fn wait_idle(puzzle: &mut DemoPuzzle) {
    let dt = Duration::from_secs_f32(FRAME_DT);
    for _ in 0..MAX_WAIT_FRAMES {
        if !puzzle.is_busy() && puzzle.scheduler().is_idle() {
            return;
        }
        puzzle.tick(dt);
    }
    log::warn!("Gave up waiting for pending transitions");
}

/// Turn the tile at `cell` until the engine takes it, waiting out every
/// transition it starts. Global-match tiles that already fit are left alone.
fn turn_until(puzzle: &mut DemoPuzzle, cell: Cell, need: Mask, stepping: bool) -> bool {
    let Some(id) = puzzle.grid().and_then(|g| g.get(cell)) else {
        log::warn!("No tile at {cell}");
        return false;
    };
    for _ in 0..4 {
        if !stepping && puzzle.tile(id).is_some_and(|t| t.current_mask() == need) {
            return true;
        }
        let outcome = puzzle.rotate(id);
        log::info!("Rotate tile {id} at {cell}: {outcome:?}");
        wait_idle(puzzle);
        match outcome {
            RotationOutcome::Rotated {
                verdict: Verdict::Accepted | Verdict::Solved,
                ..
            } => return true,
            RotationOutcome::Rotated {
                verdict: Verdict::Rejected | Verdict::Unsolved,
                ..
            } => {}
            _ => return false,
        }
    }
    false
}

fn play(puzzle: &mut DemoPuzzle) {
    match puzzle.progress() {
        Progress::Path { .. } => {
            while let Some(cell) = puzzle.expected_cell() {
                let Some(need) = puzzle.solution().required(cell) else { break };
                if !turn_until(puzzle, cell, need, true) {
                    break;
                }
            }
        }
        Progress::Global { .. } => {
            let table: Vec<_> = puzzle.solution().iter().collect();
            for (cell, need) in table {
                turn_until(puzzle, cell, need, false);
                if puzzle.is_finished() {
                    break;
                }
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cable Grid demo starting...");

    let def = match std::env::args().nth(1) {
        Some(path) => PuzzleDefinition::load(&path),
        None => PuzzleDefinition::from_json(CABLE_ROOM_JSON),
    };
    let def = match def {
        Ok(def) => def,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "Puzzle '{}' ({}, {} tiles)",
        def.name,
        def.settings.variant.as_str(),
        def.tiles.len()
    );

    let mut puzzle = def.build(LogGate::default(), LogFeedback, TimerQueue::new());
    if puzzle.is_inert() {
        log::error!(
            "Puzzle is misconfigured ({} issues); door stays locked",
            puzzle.config_issues().len()
        );
        return;
    }

    // Seat each loose piece in the first slot that takes it
    let loose: Vec<TileId> = puzzle
        .tiles()
        .iter()
        .filter(|t| t.cell.is_none())
        .map(|t| t.id)
        .collect();
    let mut slots = def.slots.clone();
    for id in loose {
        for slot in slots.iter_mut().filter(|s| s.occupant().is_none()) {
            if slot.insert(&mut puzzle, id) == SlotOutcome::Inserted {
                break;
            }
        }
    }

    play(&mut puzzle);
    wait_idle(&mut puzzle);

    log::info!(
        "Finished after {:.2}s: solved={} door={}",
        puzzle.scheduler().now().as_secs_f32(),
        puzzle.is_finished(),
        if puzzle.gate().unlocked { "open" } else { "locked" }
    );
}
