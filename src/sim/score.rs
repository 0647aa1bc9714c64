//! Scoring rules
//!
//! Pure functions; the engine uses them to total a resolution and the level
//! session uses them to keep the running score.

use serde::{Deserialize, Serialize};

use super::matcher::MatchShape;
use crate::level::LevelConfig;
use crate::consts::{
    BASE_POINTS, COMBO_BONUS, CROSS_MULTIPLIER, MIN_MATCH, THREE_STAR_RATIO, TWO_STAR_RATIO,
};

/// Points for a single match.
///
/// `round(count * BASE_POINTS * multiplier)` where the multiplier is
/// `CROSS_MULTIPLIER` for crosses, then `COMBO_BONUS` for every ball past
/// `MIN_MATCH` (added after rounding).
pub fn compute_score(match_count: usize, shape: MatchShape) -> u32 {
    let base = match_count as f64 * BASE_POINTS as f64;
    let multiplier = match shape {
        MatchShape::Cross => CROSS_MULTIPLIER,
        MatchShape::Horizontal | MatchShape::Vertical => 1.0,
    };
    // f64::round rounds half away from zero
    let mut score = (base * multiplier).round() as u32;
    if match_count > MIN_MATCH {
        score += (match_count - MIN_MATCH) as u32 * COMBO_BONUS;
    }
    score
}

/// End-of-level stars: 3 at 150% of target, 2 at 120%, otherwise 1
pub fn star_rating(score: u32, target: u32) -> u8 {
    let score = score as f64;
    let target = target as f64;
    if score >= target * THREE_STAR_RATIO {
        3
    } else if score >= target * TWO_STAR_RATIO {
        2
    } else {
        1
    }
}

/// Stars against explicit thresholds, never fewer than 1
pub fn stars_for(score: u32, two_star: u32, three_star: u32) -> u8 {
    if score >= three_star {
        3
    } else if score >= two_star {
        2
    } else {
        1
    }
}

/// Result of checking a level after a move resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelOutcome {
    /// Target reached
    Completed { stars: u8 },
    /// Out of moves below target
    Failed,
    /// Keep playing
    InProgress,
}

/// Success is checked before failure, so reaching the target on the last
/// move completes the level. Stars use the level's own thresholds.
pub fn level_outcome(score: u32, level: &LevelConfig, moves_remaining: u32) -> LevelOutcome {
    if score >= level.target_score {
        LevelOutcome::Completed {
            stars: level.star_rating(score),
        }
    } else if moves_remaining == 0 {
        LevelOutcome::Failed
    } else {
        LevelOutcome::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_scores() {
        assert_eq!(compute_score(3, MatchShape::Horizontal), 30);
        assert_eq!(compute_score(3, MatchShape::Vertical), 30);
        assert_eq!(compute_score(4, MatchShape::Vertical), 45);
        assert_eq!(compute_score(5, MatchShape::Horizontal), 60);
    }

    #[test]
    fn test_cross_scores() {
        assert_eq!(compute_score(4, MatchShape::Cross), 65);
        assert_eq!(compute_score(5, MatchShape::Cross), 85);
        // 5 + 4 - 1 shared cell
        assert_eq!(compute_score(8, MatchShape::Cross), 145);
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(star_rating(1000, 1000), 1);
        assert_eq!(star_rating(1199, 1000), 1);
        assert_eq!(star_rating(1200, 1000), 2);
        assert_eq!(star_rating(1499, 1000), 2);
        assert_eq!(star_rating(1500, 1000), 3);
    }

    #[test]
    fn test_stars_for_thresholds() {
        assert_eq!(stars_for(1000, 1500, 2000), 1);
        assert_eq!(stars_for(1500, 1500, 2000), 2);
        assert_eq!(stars_for(2000, 1500, 2000), 3);
    }

    #[test]
    fn test_level_outcome() {
        let level = LevelConfig {
            target_score: 1000,
            ..LevelConfig::default()
        };
        assert_eq!(level_outcome(500, &level, 3), LevelOutcome::InProgress);
        assert_eq!(level_outcome(500, &level, 0), LevelOutcome::Failed);
        assert_eq!(
            level_outcome(1000, &level, 5),
            LevelOutcome::Completed { stars: 1 }
        );
        // Success wins when both apply
        assert_eq!(
            level_outcome(1600, &level, 0),
            LevelOutcome::Completed { stars: 3 }
        );
    }

    #[test]
    fn test_level_outcome_custom_thresholds() {
        let level = LevelConfig {
            target_score: 1000,
            two_star_score: Some(1100),
            three_star_score: Some(1300),
            ..LevelConfig::default()
        };
        assert_eq!(
            level_outcome(1150, &level, 2),
            LevelOutcome::Completed { stars: 2 }
        );
        assert_eq!(
            level_outcome(1300, &level, 2),
            LevelOutcome::Completed { stars: 3 }
        );
    }
}
