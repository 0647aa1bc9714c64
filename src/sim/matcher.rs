//! Match detection
//!
//! A match is a maximal run of at least `MIN_MATCH` same-colored balls along
//! a row or a column. When a cell sits on both a horizontal and a vertical
//! run, the two runs form a single cross-shaped match.

use serde::{Deserialize, Serialize};

use super::board::Board;
use crate::consts::MIN_MATCH;
use crate::error::EngineError;
use crate::level::BallColor;
use crate::{GridPos, grid_pos};

/// Shape of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchShape {
    Horizontal,
    Vertical,
    /// Horizontal and vertical runs sharing at least one cell
    Cross,
}

/// A detected match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Unique coordinates, horizontal run first (left to right), then
    /// vertical run (bottom to top)
    pub positions: Vec<GridPos>,
    pub color: BallColor,
    pub shape: MatchShape,
}

impl MatchResult {
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.positions.contains(&pos)
    }

    /// True if both matches cover exactly the same coordinates
    pub fn same_positions(&self, other: &MatchResult) -> bool {
        self.positions.len() == other.positions.len()
            && self.positions.iter().all(|p| other.contains(*p))
    }

    pub fn overlaps(&self, other: &MatchResult) -> bool {
        self.positions.iter().any(|p| other.contains(*p))
    }

    /// Fold `other` into this match, turning it into a cross
    fn absorb(&mut self, other: MatchResult) {
        for pos in other.positions {
            if !self.contains(pos) {
                self.positions.push(pos);
            }
        }
        self.shape = MatchShape::Cross;
    }
}

/// Maximal same-color run through `pos` along `axis`, ordered low to high.
/// Empty if `pos` holds no ball.
fn run_through(board: &Board, pos: GridPos, axis: GridPos) -> Vec<GridPos> {
    let Some(color) = board.color_at(pos) else {
        return Vec::new();
    };

    let mut start = pos;
    while board.color_at(start - axis) == Some(color) {
        start -= axis;
    }

    let mut run = Vec::new();
    let mut cursor = start;
    while board.color_at(cursor) == Some(color) {
        run.push(cursor);
        cursor += axis;
    }
    run
}

/// Match through `pos`, if any. `pos` must be on the board.
fn match_at(board: &Board, pos: GridPos) -> Option<MatchResult> {
    let color = board.color_at(pos)?;
    let horizontal = run_through(board, pos, grid_pos(1, 0));
    let vertical = run_through(board, pos, grid_pos(0, 1));

    let has_h = horizontal.len() >= MIN_MATCH;
    let has_v = vertical.len() >= MIN_MATCH;

    let (positions, shape) = match (has_h, has_v) {
        (true, true) => {
            let mut positions = horizontal;
            positions.extend(vertical.into_iter().filter(|p| *p != pos));
            (positions, MatchShape::Cross)
        }
        (true, false) => (horizontal, MatchShape::Horizontal),
        (false, true) => (vertical, MatchShape::Vertical),
        (false, false) => return None,
    };

    Some(MatchResult {
        positions,
        color,
        shape,
    })
}

/// Check for a match through `pos`.
///
/// Returns `Ok(None)` for a cell without a ball and an error for a
/// coordinate off the board.
pub fn check_match_at(board: &Board, pos: GridPos) -> Result<Option<MatchResult>, EngineError> {
    if !board.is_valid_position(pos) {
        return Err(EngineError::OutOfBounds {
            pos,
            size: board.size(),
        });
    }
    Ok(match_at(board, pos))
}

/// Find every match on the board.
///
/// Cells are scanned row-major from the bottom-left. Each matching cell is
/// reported exactly once: cells already covered by a reported match are
/// skipped, and a later match that reaches into an earlier one is merged
/// into it. The returned matches are pairwise disjoint.
pub fn check_all_matches(board: &Board) -> Vec<MatchResult> {
    let size = board.size();
    let index = |p: GridPos| p.y as usize * size + p.x as usize;

    let mut visited = vec![false; size * size];
    let mut results: Vec<MatchResult> = Vec::new();

    for pos in board.positions() {
        if visited[index(pos)] {
            continue;
        }

        let Some(found) = match_at(board, pos) else {
            visited[index(pos)] = true;
            continue;
        };

        for p in &found.positions {
            visited[index(*p)] = true;
        }

        let overlapping: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.overlaps(&found))
            .map(|(i, _)| i)
            .collect();

        match overlapping.split_first() {
            None => results.push(found),
            Some((&first, rest)) => {
                log::trace!("Merging overlapping match at ({}, {})", pos.x, pos.y);
                results[first].absorb(found);
                for &i in rest.iter().rev() {
                    let other = results.remove(i);
                    results[first].absorb(other);
                }
            }
        }
    }

    results
}
