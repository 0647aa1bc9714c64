//! Move resolution
//!
//! The engine owns the board and drives a move to a stable state in one
//! synchronous call: swap (or slide), validate, then repeat clear, gravity
//! and refill until no match remains or the round cap is hit. Every step is
//! announced on the event channel in the order it happens.

use serde::{Deserialize, Serialize};

use super::board::{Ball, Board};
use super::events::{EventChannel, GridEvent, SharedListener};
use super::matcher::{MatchResult, check_all_matches, check_match_at};
use super::score::compute_score;
use super::spawner::Spawner;
use crate::error::EngineError;
use crate::level::LevelConfig;
use crate::{GridPos, grid_pos, is_adjacent};

/// What the engine is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnginePhase {
    #[default]
    Idle,
    Swapping,
    /// Clearing matches for cascade round `chain` (0-based)
    Resolving { chain: u32 },
}

/// Totals for one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CascadeSummary {
    /// Rounds resolved
    pub chain_count: u32,
    /// Match groups cleared
    pub total_matches: u32,
    pub balls_cleared: u32,
    pub total_score: u32,
    /// The round cap stopped the cascade while matches remained
    pub limit_reached: bool,
}

impl CascadeSummary {
    pub fn had_chain_reaction(&self) -> bool {
        self.chain_count > 1
    }
}

/// Result of a player move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Nothing happened (same cell, not adjacent, wrong occupancy)
    Rejected,
    /// Swap made no match and was undone
    Reverted,
    /// Slide into an empty cell that made no match; the ball stays
    Moved,
    /// At least one match cleared
    Resolved(CascadeSummary),
}

impl MoveOutcome {
    /// True if the move changed the board
    pub fn is_valid(&self) -> bool {
        matches!(self, MoveOutcome::Moved | MoveOutcome::Resolved(_))
    }

    pub fn summary(&self) -> Option<CascadeSummary> {
        match self {
            MoveOutcome::Resolved(summary) => Some(*summary),
            _ => None,
        }
    }
}

/// Round bookkeeping while a cascade runs
#[derive(Debug, Default)]
struct ChainState {
    chain: u32,
    total_matches: u32,
    balls_cleared: u32,
    total_score: u32,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_chain_iterations: u32,
    gravity_max_passes: usize,
}

/// Grid resolution engine
#[derive(Debug)]
pub struct ResolutionEngine {
    board: Board,
    spawner: Spawner,
    limits: Limits,
    phase: EnginePhase,
    initialized: bool,
    events: EventChannel<GridEvent>,
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionEngine {
    /// Uninitialized engine. Commands fail with `NotInitialized` until
    /// `initialize` succeeds.
    pub fn new() -> Self {
        Self {
            board: Board::new(0),
            spawner: Spawner::new(Vec::new(), 0),
            limits: Limits {
                max_chain_iterations: crate::consts::DEFAULT_MAX_CHAIN_ITERATIONS,
                gravity_max_passes: 0,
            },
            phase: EnginePhase::Idle,
            initialized: false,
            events: EventChannel::new(),
        }
    }

    /// Build a fresh board for `config` and fill it with no initial matches.
    ///
    /// Calling again discards the current board. Listeners are kept.
    pub fn initialize(&mut self, config: &LevelConfig) -> Result<(), EngineError> {
        self.load(config, Board::new(config.grid_size))?;

        let size = self.board.size() as i32;
        for x in 0..size {
            for y in 0..size {
                let pos = grid_pos(x, y);
                if self.board.is_empty_at(pos) {
                    let ball = self.spawner.spawn_avoiding_prematch(&mut self.board, pos)?;
                    self.emit_spawned(pos, ball);
                }
            }
        }

        log::info!(
            "Engine initialized: {} ({} balls, seed {})",
            config,
            self.board.occupied_count(),
            config.seed
        );
        Ok(())
    }

    /// Take over a prepared board instead of generating one. The spawner and
    /// limits still come from `config`; the board's own size wins.
    pub fn initialize_with_board(
        &mut self,
        config: &LevelConfig,
        board: Board,
    ) -> Result<(), EngineError> {
        self.load(config, board)?;
        log::info!(
            "Engine initialized with prepared {}x{} board",
            self.board.size(),
            self.board.size()
        );
        Ok(())
    }

    fn load(&mut self, config: &LevelConfig, board: Board) -> Result<(), EngineError> {
        config.check().map_err(EngineError::InvalidConfig)?;
        if board.size() == 0 {
            return Err(EngineError::InvalidConfig(crate::error::ConfigIssue::EmptyGrid));
        }
        self.limits = Limits {
            max_chain_iterations: config.max_chain_iterations().max(1),
            gravity_max_passes: config.gravity_max_passes.unwrap_or(board.size()).max(1),
        };
        self.spawner = Spawner::new(config.colors.clone(), config.seed);
        self.board = board;
        self.phase = EnginePhase::Idle;
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn events(&self) -> &EventChannel<GridEvent> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventChannel<GridEvent> {
        &mut self.events
    }

    /// Register a listener. Returns false if it is already registered.
    pub fn subscribe(&mut self, listener: SharedListener<GridEvent>) -> bool {
        self.events.register(listener)
    }

    pub fn unsubscribe(&mut self, listener: &SharedListener<GridEvent>) -> bool {
        self.events.unregister(listener)
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    fn ensure_on_board(&self, pos: GridPos) -> Result<(), EngineError> {
        if self.board.is_valid_position(pos) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds {
                pos,
                size: self.board.size(),
            })
        }
    }

    /// Match through `pos` on the current board
    pub fn check_match_at(&self, pos: GridPos) -> Result<Option<MatchResult>, EngineError> {
        self.ensure_initialized()?;
        check_match_at(&self.board, pos)
    }

    /// Every match on the current board, pairwise disjoint
    pub fn check_all_matches(&self) -> Result<Vec<MatchResult>, EngineError> {
        self.ensure_initialized()?;
        Ok(check_all_matches(&self.board))
    }

    /// Swap two cells and resolve the result.
    ///
    /// A swap that makes no match through either cell is undone exactly
    /// (`SwapReverted`, then an empty `ProcessingComplete`). Adjacency is
    /// not enforced here; see `crate::is_adjacent`.
    pub fn process_swap(&mut self, a: GridPos, b: GridPos) -> Result<MoveOutcome, EngineError> {
        self.ensure_initialized()?;
        self.ensure_on_board(a)?;
        self.ensure_on_board(b)?;
        if a == b {
            log::debug!("Swap rejected: same cell ({}, {})", a.x, a.y);
            return Ok(MoveOutcome::Rejected);
        }

        self.phase = EnginePhase::Swapping;
        self.board.swap_balls(a, b)?;

        let mut matches = Vec::with_capacity(2);
        if let Some(m) = check_match_at(&self.board, a)? {
            matches.push(m);
        }
        if let Some(m) = check_match_at(&self.board, b)? {
            if !matches.iter().any(|existing| existing.same_positions(&m)) {
                matches.push(m);
            }
        }

        if matches.is_empty() {
            self.board.swap_balls(a, b)?;
            self.phase = EnginePhase::Idle;
            log::debug!("Swap ({}, {}) <-> ({}, {}) reverted", a.x, a.y, b.x, b.y);
            self.emit(GridEvent::SwapReverted { a, b });
            self.emit_complete(&CascadeSummary::default());
            return Ok(MoveOutcome::Reverted);
        }

        log::debug!(
            "Swap ({}, {}) <-> ({}, {}) made {} match(es)",
            a.x,
            a.y,
            b.x,
            b.y,
            matches.len()
        );
        let summary = self.resolve(matches)?;
        Ok(MoveOutcome::Resolved(summary))
    }

    /// Slide the ball at `from` into the empty neighbor `to` and resolve any
    /// match it makes there. A slide is not undone when nothing matches.
    pub fn process_slide(
        &mut self,
        from: GridPos,
        to: GridPos,
    ) -> Result<MoveOutcome, EngineError> {
        self.ensure_initialized()?;
        self.ensure_on_board(from)?;
        self.ensure_on_board(to)?;
        if !is_adjacent(from, to) {
            return Ok(MoveOutcome::Rejected);
        }
        let source = self.board.cell(from)?;
        if source.locked || !self.board.is_empty_at(to) {
            return Ok(MoveOutcome::Rejected);
        }

        self.phase = EnginePhase::Swapping;
        let Some(ball) = self.board.move_ball(from, to)? else {
            self.phase = EnginePhase::Idle;
            return Ok(MoveOutcome::Rejected);
        };
        self.emit(GridEvent::BallMoved {
            ball: ball.id,
            from,
            to,
        });

        match check_match_at(&self.board, to)? {
            Some(m) => {
                let summary = self.resolve(vec![m])?;
                Ok(MoveOutcome::Resolved(summary))
            }
            None => {
                self.phase = EnginePhase::Idle;
                self.emit_complete(&CascadeSummary::default());
                Ok(MoveOutcome::Moved)
            }
        }
    }

    /// Resolve matches the caller already found. An empty list does nothing.
    pub fn process_matches(
        &mut self,
        matches: Vec<MatchResult>,
    ) -> Result<CascadeSummary, EngineError> {
        self.ensure_initialized()?;
        if matches.is_empty() {
            return Ok(CascadeSummary::default());
        }
        for pos in matches.iter().flat_map(|m| m.positions.iter()) {
            self.ensure_on_board(*pos)?;
        }
        self.resolve(matches)
    }

    /// Cascade loop: clear, settle, refill, rescan
    fn resolve(&mut self, initial: Vec<MatchResult>) -> Result<CascadeSummary, EngineError> {
        let result = self.run_cascade(initial);
        self.phase = EnginePhase::Idle;
        let summary = result?;

        self.emit_complete(&summary);
        if summary.had_chain_reaction() {
            self.emit(GridEvent::ComboCompleted {
                chain_count: summary.chain_count,
                total_matches: summary.total_matches,
            });
        }
        Ok(summary)
    }

    fn run_cascade(&mut self, initial: Vec<MatchResult>) -> Result<CascadeSummary, EngineError> {
        let mut state = ChainState::default();
        let mut matches = initial;
        let mut limit_reached = false;

        loop {
            self.phase = EnginePhase::Resolving { chain: state.chain };
            self.clear_matches(&matches, &mut state)?;
            self.apply_gravity()?;
            self.refill()?;
            state.chain += 1;

            matches = check_all_matches(&self.board);
            if matches.is_empty() {
                break;
            }
            if state.chain >= self.limits.max_chain_iterations {
                log::warn!(
                    "Cascade stopped after {} rounds with {} match(es) left on the board",
                    state.chain,
                    matches.len()
                );
                limit_reached = true;
                break;
            }
            log::debug!("Chain reaction: round {}", state.chain + 1);
        }

        log::debug!(
            "Resolved {} round(s): {} matches, {} balls, {} points",
            state.chain,
            state.total_matches,
            state.balls_cleared,
            state.total_score
        );

        Ok(CascadeSummary {
            chain_count: state.chain,
            total_matches: state.total_matches,
            balls_cleared: state.balls_cleared,
            total_score: state.total_score,
            limit_reached,
        })
    }

    /// Announce every match of the round, then pop their balls
    fn clear_matches(
        &mut self,
        matches: &[MatchResult],
        state: &mut ChainState,
    ) -> Result<(), EngineError> {
        for m in matches {
            state.total_matches += 1;
            state.total_score += compute_score(m.count(), m.shape);
            self.emit(GridEvent::MatchFound {
                shape: m.shape,
                count: m.count(),
                color: m.color,
                positions: m.positions.clone(),
                chain: state.chain,
            });
        }

        for m in matches {
            for &pos in &m.positions {
                if let Some(ball) = self.board.clear_ball(pos)? {
                    state.balls_cleared += 1;
                    self.emit(GridEvent::BallPopped {
                        pos,
                        ball: ball.id,
                        color: ball.color,
                        match_count: m.count(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop balls one cell per step into empty cells below them.
    ///
    /// Each pass walks columns left to right and rows bottom to top, so a
    /// stack above a gap shifts down together within a pass. Locked cells
    /// keep their ball. Returns the number of steps.
    fn apply_gravity(&mut self) -> Result<usize, EngineError> {
        let size = self.board.size() as i32;
        let mut steps = 0;
        let mut passes = 0;

        loop {
            passes += 1;
            let mut moved = false;

            for x in 0..size {
                for y in 0..size - 1 {
                    let below = grid_pos(x, y);
                    let above = grid_pos(x, y + 1);
                    if !self.board.is_empty_at(below) {
                        continue;
                    }
                    let upper = self.board.cell(above)?;
                    if upper.locked {
                        continue;
                    }
                    if let Some(ball) = self.board.move_ball(above, below)? {
                        self.emit(GridEvent::BallMoved {
                            ball: ball.id,
                            from: above,
                            to: below,
                        });
                        steps += 1;
                        moved = true;
                    }
                }
            }

            if !moved {
                break;
            }
            if passes >= self.limits.gravity_max_passes {
                log::warn!("Gravity stopped after {} passes with balls still falling", passes);
                break;
            }
        }

        log::trace!("Gravity: {} step(s) in {} pass(es)", steps, passes);
        Ok(steps)
    }

    /// Fill every empty cell, top row first, left to right within a row
    fn refill(&mut self) -> Result<usize, EngineError> {
        let size = self.board.size() as i32;
        let mut spawned = 0;
        for y in (0..size).rev() {
            for x in 0..size {
                let pos = grid_pos(x, y);
                if self.board.is_empty_at(pos) {
                    let ball = self.spawner.spawn_avoiding_prematch(&mut self.board, pos)?;
                    self.emit_spawned(pos, ball);
                    spawned += 1;
                }
            }
        }
        log::trace!("Refill: {} ball(s)", spawned);
        Ok(spawned)
    }

    fn emit(&self, event: GridEvent) {
        self.events.raise(&event);
    }

    fn emit_spawned(&self, pos: GridPos, ball: Ball) {
        self.emit(GridEvent::BallSpawned {
            pos,
            ball: ball.id,
            color: ball.color,
        });
    }

    fn emit_complete(&self, summary: &CascadeSummary) {
        self.emit(GridEvent::ProcessingComplete {
            total_matches: summary.total_matches,
            total_score: summary.total_score,
            had_chain_reaction: summary.had_chain_reaction(),
        });
    }
}
