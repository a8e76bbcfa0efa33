//! Puzzle engine: owns the tiles, grid and progress, and validates rotations
//!
//! Events come in as plain method calls (`rotate`, `notify_inserted`,
//! `notify_removed`). Timed transitions go out through the [`Scheduler`] and
//! come back through [`Puzzle::resume`]. While a transition is pending the
//! engine is `busy` and drops rotations without touching any state.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::{Cell, Endpoints, Grid, build_grid};
use super::mask::Mask;
use super::ports::{BlinkPhase, Continuation, FeedbackPort, Gate, Scheduler};
use super::schedule::TimerQueue;
use super::solution::SolutionTable;
use super::tile::{Tile, TileId, TileSpec, TileState};
use crate::error::ConfigError;
use crate::settings::{PuzzleSettings, Variant};

/// Validator progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Index into the ordered path of the next cell to solve. Index 0 is
    /// the source and starts satisfied.
    Path { step: usize },
    /// Whether every on-path cell matched at once
    Global { solved: bool },
}

/// What happened to a rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    UnknownTile,
    /// Tile is locked; nothing changed
    Locked,
    /// A timed transition is pending; nothing changed
    Busy,
    /// Tile turned a quarter clockwise
    Rotated { mask: Mask, verdict: Verdict },
}

/// Validator reaction to a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Puzzle is misconfigured and never progresses
    Inert,
    /// Tile is not in the grid
    NotInGrid,
    /// Not the cell the path expects next
    OutOfTurn,
    /// Puzzle already complete
    Finished,
    /// Correct path step; confirmation pending
    Accepted,
    /// Wrong mask on the expected cell; flash pending
    Rejected,
    /// Last rotation completed a global match
    Solved,
    /// Global match not complete yet
    Unsolved,
}

/// A connector-grid puzzle bound to its gate, feedback and scheduler
#[derive(Debug)]
pub struct Puzzle<G: Gate, F: FeedbackPort, S: Scheduler> {
    settings: PuzzleSettings,
    solution: SolutionTable,
    /// All known tiles in definition order, placed or loose
    tiles: Vec<Tile>,
    grid: Option<Grid>,
    endpoints: Endpoints,
    progress: Progress,
    busy: bool,
    /// Path tile locked in, waiting for its confirm continuation
    confirming: Option<(TileId, Cell)>,
    /// A global re-check was requested while busy; runs when busy clears
    recheck_pending: bool,
    /// Errors that make the solution unusable
    solution_broken: bool,
    issues: Vec<ConfigError>,
    rng: Pcg32,
    gate: G,
    feedback: F,
    scheduler: S,
}

impl<G: Gate, F: FeedbackPort, S: Scheduler> Puzzle<G, F, S> {
    /// Build the grid, check the solution, scramble (global variant) and
    /// show initial visuals. Configuration errors are logged and collected;
    /// an unusable puzzle is returned inert with its gate locked.
    pub fn new(
        specs: &[TileSpec],
        solution: SolutionTable,
        settings: PuzzleSettings,
        gate: G,
        feedback: F,
        scheduler: S,
    ) -> Self {
        let progress = match settings.variant {
            Variant::PathStepping => Progress::Path { step: 1 },
            Variant::GlobalMatch => Progress::Global { solved: false },
        };
        let mut puzzle = Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
            solution,
            tiles: Vec::with_capacity(specs.len()),
            grid: None,
            endpoints: Endpoints::default(),
            progress,
            busy: false,
            confirming: None,
            recheck_pending: false,
            solution_broken: false,
            issues: Vec::new(),
            gate,
            feedback,
            scheduler,
        };

        for spec in specs {
            if let Err(e) = puzzle.add_loose_tile(spec.clone()) {
                puzzle.report(e);
            }
        }
        puzzle.build();
        puzzle.check_solution();
        if puzzle.settings.variant == Variant::GlobalMatch && !puzzle.is_inert() {
            puzzle.scramble();
        }
        puzzle.refresh_tiles();
        puzzle.gate.lock();
        puzzle
    }

    fn report(&mut self, issue: ConfigError) {
        log::error!("Cable puzzle: {issue}");
        self.issues.push(issue);
    }

    fn build(&mut self) {
        let layout = match build_grid(
            &self.tiles,
            self.settings.spacing,
            self.settings.alignment_tolerance,
        ) {
            Ok(layout) => layout,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        for (id, cell) in &layout.assignments {
            if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == *id) {
                tile.cell = Some(*cell);
            }
        }
        // build_grid already logged these
        self.issues.extend(layout.issues);
        self.grid = Some(layout.grid);
        self.discover_endpoints();
    }

    fn discover_endpoints(&mut self) {
        let Some(grid) = &self.grid else { return };
        let (endpoints, issues) = Endpoints::discover(grid, &self.tiles);
        self.endpoints = endpoints;
        for issue in issues {
            self.report(issue);
        }
    }

    fn check_solution(&mut self) {
        let mut issues = match self.settings.variant {
            Variant::PathStepping => self.solution.validate_for_path(),
            Variant::GlobalMatch if self.solution.is_empty() => vec![ConfigError::EmptySolution],
            Variant::GlobalMatch => Vec::new(),
        };
        if let Some(grid) = &self.grid {
            issues.extend(
                self.solution
                    .iter()
                    .filter(|(cell, _)| !grid.contains(*cell))
                    .map(|(cell, _)| ConfigError::CellOutsideGrid(cell)),
            );
        }
        self.solution_broken = !issues.is_empty();
        for issue in issues {
            self.report(issue);
        }
    }

    /// Re-derive occupancy from the tile set after an insertion or removal
    fn rederive(&mut self) {
        let Some(grid) = &self.grid else { return };
        let (grid, issues) = Grid::from_tiles(grid.width(), grid.height(), &self.tiles);
        self.grid = Some(grid);
        for issue in issues {
            self.report(issue);
        }
        self.discover_endpoints();
    }

    /// Random rotation for every rotatable on-path tile. If that happens to
    /// solve the puzzle, one tile whose mask changes under rotation is
    /// turned once more.
    fn scramble(&mut self) {
        let Some(grid) = &self.grid else { return };
        let targets: Vec<usize> = grid
            .occupied()
            .filter(|(cell, _)| self.solution.is_on_path(*cell))
            .filter_map(|(_, id)| self.tile_index(id))
            .filter(|&i| !self.tiles[i].is_endpoint())
            .collect();

        for &i in &targets {
            let steps = self.rng.random_range(0..4);
            self.tiles[i].force_set_rotation(steps);
        }

        if self.all_match() {
            if let Some(&i) = targets
                .iter()
                .find(|&&i| self.tiles[i].base_mask.rotate_cw() != self.tiles[i].base_mask)
            {
                let tile = &mut self.tiles[i];
                tile.force_set_rotation(tile.rotation_steps() as i32 + 1);
            }
        }
        log::debug!("Scrambled {} tiles (seed {})", targets.len(), self.settings.seed);
    }

    /// Visual-state pass over the grid: re-lock off-path tiles, reset lock
    /// flags on the path and repaint.
    fn refresh_tiles(&mut self) {
        let Some(grid) = &self.grid else { return };
        let occupied: Vec<(Cell, TileId)> = grid.occupied().collect();
        let path_done = self.is_finished();

        for (cell, id) in occupied {
            let Some(i) = self.tile_index(id) else { continue };
            let on_path = self.solution.is_on_path(cell);
            let confirmed = self.is_cell_confirmed(cell, id);
            let lock_off_path = self.settings.lock_off_path_tiles;

            let tile = &mut self.tiles[i];
            let state = if lock_off_path && !on_path {
                tile.locked = true;
                tile.base_mask = Mask::EMPTY;
                TileState::Neutral
            } else if tile.is_source {
                tile.locked = true;
                TileState::Confirmed
            } else if tile.is_target {
                tile.locked = true;
                if path_done && matches!(self.progress, Progress::Path { .. }) {
                    TileState::Confirmed
                } else {
                    TileState::Neutral
                }
            } else if confirmed {
                tile.locked = true;
                TileState::Confirmed
            } else {
                tile.locked = false;
                TileState::Neutral
            };
            self.feedback.set_tile_state(id, state);
        }
    }

    /// Path cells behind the current step, or the one being confirmed
    fn is_cell_confirmed(&self, cell: Cell, id: TileId) -> bool {
        let Progress::Path { step } = self.progress else {
            return false;
        };
        if self.confirming == Some((id, cell)) {
            return true;
        }
        matches!(self.solution.path_index(cell), Some(i) if i >= 1 && i < step)
    }

    fn tile_index(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// Tile currently occupying `cell`
    fn tile_at(&self, cell: Cell) -> Option<&Tile> {
        let id = self.grid.as_ref()?.get(cell)?;
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Every table cell holds a tile showing its required mask
    fn all_match(&self) -> bool {
        !self.solution.is_empty()
            && self
                .solution
                .iter()
                .all(|(cell, need)| self.tile_at(cell).is_some_and(|t| t.current_mask() == need))
    }

    /// Register a tile that is not yet in the grid
    pub fn add_loose_tile(&mut self, spec: TileSpec) -> Result<(), ConfigError> {
        if self.tile_index(spec.id).is_some() {
            return Err(ConfigError::DuplicateTileId(spec.id));
        }
        self.tiles.push(Tile::from_spec(&spec));
        Ok(())
    }

    /// Player rotation of one tile
    pub fn rotate(&mut self, id: TileId) -> RotationOutcome {
        let Some(i) = self.tile_index(id) else {
            log::debug!("Rotate for unknown tile {id}");
            return RotationOutcome::UnknownTile;
        };
        if self.tiles[i].locked {
            return RotationOutcome::Locked;
        }
        if self.busy {
            return RotationOutcome::Busy;
        }
        let Some(mask) = self.tiles[i].rotate_once() else {
            return RotationOutcome::Locked;
        };
        let verdict = self.on_rotated(i);
        RotationOutcome::Rotated { mask, verdict }
    }

    fn on_rotated(&mut self, i: usize) -> Verdict {
        if self.is_inert() {
            return Verdict::Inert;
        }
        let (id, mask) = (self.tiles[i].id, self.tiles[i].current_mask());
        let Some(cell) = self.tiles[i].cell.filter(|c| self.tile_at(*c).is_some_and(|t| t.id == id))
        else {
            return Verdict::NotInGrid;
        };

        match self.progress {
            Progress::Path { step } => self.step_path(id, cell, mask, step),
            Progress::Global { solved: true } => Verdict::Finished,
            Progress::Global { solved: false } => {
                if self.all_match() {
                    self.solve_global();
                    Verdict::Solved
                } else {
                    Verdict::Unsolved
                }
            }
        }
    }

    fn step_path(&mut self, id: TileId, cell: Cell, mask: Mask, step: usize) -> Verdict {
        let Some(path) = self.solution.path() else {
            return Verdict::Inert;
        };
        if step < 1 || step + 1 >= path.len() {
            return Verdict::Finished;
        }
        let expected = path[step];
        if cell != expected {
            return Verdict::OutOfTurn;
        }
        let Some(need) = self.solution.required(expected) else {
            return Verdict::Inert;
        };

        self.busy = true;
        if mask == need {
            self.feedback.set_tile_state(id, TileState::Confirmed);
            if let Some(i) = self.tile_index(id) {
                self.tiles[i].locked = true;
            }
            self.confirming = Some((id, cell));
            self.scheduler.after(
                self.settings.correct_delay(),
                Continuation::ConfirmStep { tile: id, cell, step },
            );
            Verdict::Accepted
        } else {
            self.feedback.set_tile_state(id, TileState::Rejected);
            self.scheduler.after(
                self.settings.wrong_flash(),
                Continuation::EndRejectFlash { tile: id, cell },
            );
            Verdict::Rejected
        }
    }

    fn solve_global(&mut self) {
        self.progress = Progress::Global { solved: true };
        log::info!("Cable puzzle solved (global match)");
        self.gate.unlock();
        if self.settings.blink_count > 0 {
            self.busy = true;
            self.paint_all(TileState::Highlight);
            self.scheduler.after(
                self.settings.blink_duration(),
                Continuation::Blink {
                    phase: BlinkPhase::Neutral,
                    remaining: self.settings.blink_count,
                },
            );
        }
    }

    fn paint_all(&mut self, state: TileState) {
        let Some(grid) = &self.grid else { return };
        for (_, id) in grid.occupied() {
            self.feedback.set_tile_state(id, state);
        }
    }

    /// Run a continuation handed back by the scheduler
    pub fn resume(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::ConfirmStep { tile, cell, step } => {
                self.confirming = None;
                let still_there = self.tile_at(cell).is_some_and(|t| t.id == tile);
                match self.progress {
                    Progress::Path { step: current } if current == step && still_there => {
                        self.advance_path(step + 1);
                    }
                    _ => {
                        log::warn!("Dropping stale confirmation for tile {tile} at {cell}");
                    }
                }
                self.busy = false;
            }
            Continuation::EndRejectFlash { tile, cell } => {
                if self.tile_at(cell).is_some_and(|t| t.id == tile) {
                    self.feedback.set_tile_state(tile, TileState::Neutral);
                }
                self.busy = false;
            }
            Continuation::Blink { phase, remaining } => match phase {
                BlinkPhase::Neutral => {
                    self.paint_all(TileState::Neutral);
                    if remaining > 1 {
                        self.scheduler.after(
                            self.settings.blink_duration(),
                            Continuation::Blink {
                                phase: BlinkPhase::Highlight,
                                remaining: remaining - 1,
                            },
                        );
                    } else {
                        self.busy = false;
                        if std::mem::take(&mut self.recheck_pending) {
                            self.recheck_global();
                        }
                    }
                }
                BlinkPhase::Highlight => {
                    self.paint_all(TileState::Highlight);
                    self.scheduler.after(
                        self.settings.blink_duration(),
                        Continuation::Blink {
                            phase: BlinkPhase::Neutral,
                            remaining,
                        },
                    );
                }
            },
        }
    }

    fn advance_path(&mut self, step: usize) {
        self.progress = Progress::Path { step };
        let Some(path) = self.solution.path() else { return };
        if step + 1 == path.len() {
            let last = path[step];
            if let Some(id) = self.tile_at(last).map(|t| t.id) {
                self.feedback.set_tile_state(id, TileState::Confirmed);
            }
            log::info!("Cable puzzle solved (path complete)");
            self.gate.unlock();
        } else {
            log::debug!("Path step {step}/{}", path.len() - 1);
        }
    }

    /// A tile was seated in a socket at `(gx, gy)`.
    ///
    /// Returns false when the event was ignored (no grid, unknown tile,
    /// out-of-range or occupied cell).
    pub fn notify_inserted(&mut self, id: TileId, gx: i32, gy: i32) -> bool {
        let cell = Cell::new(gx, gy);
        let Some(grid) = &self.grid else { return false };
        if !grid.contains(cell) {
            log::debug!("Insert at {cell} outside the grid ignored");
            return false;
        }
        let Some(i) = self.tile_index(id) else {
            log::debug!("Insert of unknown tile {id} ignored");
            return false;
        };
        if let Some(kept) = grid.get(cell).filter(|other| *other != id) {
            self.report(ConfigError::DuplicateCell {
                cell,
                kept,
                rejected: id,
            });
            return false;
        }

        let tile = &mut self.tiles[i];
        tile.cell = Some(cell);
        tile.reset();
        self.rederive();
        self.refresh_tiles();
        log::info!("Tile {id} inserted at {cell}");

        if matches!(self.progress, Progress::Global { solved: false }) {
            if self.busy {
                self.recheck_pending = true;
            } else {
                self.recheck_global();
            }
        }
        true
    }

    fn recheck_global(&mut self) {
        if matches!(self.progress, Progress::Global { solved: false })
            && !self.is_inert()
            && self.all_match()
        {
            self.solve_global();
        }
    }

    /// The tile at `(gx, gy)` was pulled out. Returns the removed tile id.
    pub fn notify_removed(&mut self, gx: i32, gy: i32) -> Option<TileId> {
        let cell = Cell::new(gx, gy);
        let id = self.grid.as_ref()?.get(cell)?;
        if let Some(i) = self.tile_index(id) {
            self.tiles[i].cell = None;
            self.tiles[i].locked = false;
        }
        self.rederive();
        self.refresh_tiles();
        log::info!("Tile {id} removed from {cell}");

        if let Progress::Global { solved } = self.progress {
            self.progress = Progress::Global { solved: false };
            if solved {
                self.gate.lock();
            }
        }
        Some(id)
    }

    /// Misconfigured puzzles never progress
    pub fn is_inert(&self) -> bool {
        self.grid.is_none() || !self.endpoints.is_complete() || self.solution_broken
    }

    /// Path fully walked or global match reached
    pub fn is_finished(&self) -> bool {
        match self.progress {
            Progress::Path { step } => self.solution.path().is_some_and(|p| step + 1 >= p.len()),
            Progress::Global { solved } => solved,
        }
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn config_issues(&self) -> &[ConfigError] {
        &self.issues
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub(crate) fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    pub fn solution(&self) -> &SolutionTable {
        &self.solution
    }

    pub fn settings(&self) -> &PuzzleSettings {
        &self.settings
    }

    /// Cell the path expects next, if still stepping
    pub fn expected_cell(&self) -> Option<Cell> {
        let Progress::Path { step } = self.progress else {
            return None;
        };
        let path = self.solution.path()?;
        (step + 1 < path.len()).then(|| path[step])
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<G: Gate, F: FeedbackPort> Puzzle<G, F, TimerQueue> {
    /// Advance the frame clock and run every continuation that came due.
    /// Continuations scheduled from inside this call also run if their
    /// deadline has already passed. Returns how many ran.
    pub fn tick(&mut self, dt: Duration) -> usize {
        self.scheduler.advance(dt);
        let mut fired = 0;
        while let Some(continuation) = self.scheduler.pop_due() {
            self.resume(continuation);
            fired += 1;
        }
        fired
    }
}
