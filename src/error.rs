//! Engine error taxonomy
//!
//! A swap that produces no match is not an error: it is a normal outcome
//! (the swap is reverted). Hitting the cascade cap is not an error either;
//! it is logged and reported on the cascade summary.

use std::fmt;

use crate::GridPos;

/// Why a level configuration cannot drive the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    /// Grid size of zero
    EmptyGrid,
    /// No spawnable colors
    NoColors,
}

impl ConfigIssue {
    pub fn message(self) -> &'static str {
        match self {
            ConfigIssue::EmptyGrid => "grid size must be at least 1",
            ConfigIssue::NoColors => "at least one color is required",
        }
    }
}

/// Errors returned by board and engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Coordinate outside `[0, size)` on either axis
    OutOfBounds { pos: GridPos, size: usize },
    /// Command issued before `initialize`
    NotInitialized,
    /// Level configuration the engine cannot run
    InvalidConfig(ConfigIssue),
}

impl EngineError {
    pub fn code(self) -> &'static str {
        match self {
            EngineError::OutOfBounds { .. } => "out_of_bounds",
            EngineError::NotInitialized => "not_initialized",
            EngineError::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::OutOfBounds { pos, size } => write!(
                f,
                "position ({}, {}) is outside the {}x{} grid",
                pos.x, pos.y, size, size
            ),
            EngineError::NotInitialized => write!(f, "engine has not been initialized"),
            EngineError::InvalidConfig(issue) => {
                write!(f, "invalid level config: {}", issue.message())
            }
        }
    }
}

impl std::error::Error for EngineError {}
