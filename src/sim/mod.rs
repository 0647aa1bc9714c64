//! Deterministic simulation module
//!
//! All grid logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (row-major from the bottom-left)
//! - One synchronous call per move, no timing or waiting
//! - No rendering or platform dependencies

pub mod board;
pub mod engine;
pub mod events;
pub mod matcher;
pub mod score;
pub mod spawner;

pub use board::{Ball, BallId, Board, CellView};
pub use engine::{CascadeSummary, EnginePhase, MoveOutcome, ResolutionEngine};
pub use events::{EventChannel, EventListener, EventLog, GridEvent, SharedListener};
pub use matcher::{MatchResult, MatchShape, check_all_matches, check_match_at};
pub use score::{LevelOutcome, compute_score, level_outcome, star_rating, stars_for};
pub use spawner::Spawner;
