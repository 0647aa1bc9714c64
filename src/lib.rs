//! Color Chain - A deterministic match-3 grid engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board, spawning, matching, cascades, scoring)
//! - `level`: Data-driven level configuration
//! - `session`: Move/score bookkeeping that listens to engine events
//! - `progress`: Per-level stars, high scores and unlocks

pub mod error;
pub mod level;
pub mod progress;
pub mod session;
pub mod sim;

pub use error::EngineError;
pub use level::{BallColor, ColorWeight, ConfigError, LevelConfig};
pub use progress::{LevelProgress, ProgressBook};
pub use session::{LevelSession, LevelState};

use glam::IVec2;

/// Grid coordinate. `x` grows to the right, `y` grows upward (row 0 is the bottom).
pub type GridPos = IVec2;

/// Engine configuration constants
pub mod consts {
    /// Shortest run of same-colored balls that counts as a match
    pub const MIN_MATCH: usize = 3;

    /// Points per matched ball
    pub const BASE_POINTS: u32 = 10;
    /// Bonus per ball beyond `MIN_MATCH`
    pub const COMBO_BONUS: u32 = 5;
    /// Multiplier applied to the base score of a cross-shaped match
    pub const CROSS_MULTIPLIER: f64 = 1.5;

    /// Maximum cascade rounds per resolution before force-terminating
    pub const DEFAULT_MAX_CHAIN_ITERATIONS: u32 = 10;

    /// Grid size bounds accepted by level validation
    pub const MIN_GRID_SIZE: usize = 6;
    pub const MAX_GRID_SIZE: usize = 10;
    pub const DEFAULT_GRID_SIZE: usize = 8;

    /// Star thresholds as a fraction of the target score
    pub const THREE_STAR_RATIO: f64 = 1.5;
    pub const TWO_STAR_RATIO: f64 = 1.2;
}

/// Shorthand for building a grid coordinate
#[inline]
pub const fn grid_pos(x: i32, y: i32) -> GridPos {
    IVec2::new(x, y)
}

/// True if `pos` lies inside a `size`×`size` grid
#[inline]
pub fn in_bounds(pos: GridPos, size: usize) -> bool {
    let size = size as i64;
    (0..size).contains(&(pos.x as i64)) && (0..size).contains(&(pos.y as i64))
}

/// True if two coordinates share an edge
#[inline]
pub fn is_adjacent(a: GridPos, b: GridPos) -> bool {
    (a - b).abs().element_sum() == 1
}
