//! Level session
//!
//! Listens to engine events, keeps the running score and move budget, and
//! decides when a level is won or lost. The engine knows nothing about
//! levels; register the session on the engine's event channel.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::level::LevelConfig;
use crate::sim::events::{EventListener, GridEvent};
use crate::sim::score::{LevelOutcome, compute_score, level_outcome};

/// Level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelState {
    #[default]
    NotStarted,
    Playing,
    Paused,
    Completed,
    Failed,
}

impl LevelState {
    /// Completed or Failed
    pub fn is_finished(&self) -> bool {
        matches!(self, LevelState::Completed | LevelState::Failed)
    }
}

/// Score and move bookkeeping for one level attempt
#[derive(Debug, Clone, Default)]
pub struct LevelSession {
    config: Option<LevelConfig>,
    state: LevelState,
    score: u32,
    moves_remaining: u32,
    stars: u8,
    matches_cleared: u32,
    best_chain: u32,
}

impl LevelSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session already wrapped for registration
    pub fn shared() -> Rc<RefCell<LevelSession>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Begin (or begin again) a level with a full move budget and zero score
    pub fn start(&mut self, config: &LevelConfig) {
        self.moves_remaining = config.max_moves;
        self.score = 0;
        self.stars = 0;
        self.matches_cleared = 0;
        self.best_chain = 0;
        self.state = LevelState::Playing;
        log::info!(
            "Level {} started: target {}, {} moves",
            config.level_number,
            config.target_score,
            config.max_moves
        );
        self.config = Some(config.clone());
    }

    /// Start the current level over. Returns false if no level was started.
    ///
    /// The board is not touched; re-initialize the engine alongside.
    pub fn restart(&mut self) -> bool {
        match self.config.take() {
            Some(config) => {
                self.start(&config);
                log::info!("Level {} restarted", config.level_number);
                true
            }
            None => {
                log::warn!("No level to restart");
                false
            }
        }
    }

    /// Config for the level after this one on the standard progression
    pub fn next_level(&self) -> LevelConfig {
        let current = self.config.as_ref().map_or(0, |c| c.level_number);
        LevelConfig::for_level(current + 1)
    }

    pub fn pause(&mut self) {
        if self.state == LevelState::Playing {
            self.state = LevelState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == LevelState::Paused {
            self.state = LevelState::Playing;
        }
    }

    /// Spend one move, then re-check the level. Call after the engine
    /// returns; reverted swaps are not counted.
    pub fn on_move_completed(&mut self) {
        if self.state != LevelState::Playing {
            return;
        }
        self.moves_remaining = self.moves_remaining.saturating_sub(1);
        log::debug!("Move completed, {} remaining", self.moves_remaining);
        self.check_status();
    }

    fn check_status(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        match level_outcome(self.score, config, self.moves_remaining) {
            LevelOutcome::Completed { stars } => {
                self.stars = stars;
                self.state = LevelState::Completed;
                log::info!(
                    "Level {} completed: {} points, {} star(s)",
                    config.level_number,
                    self.score,
                    stars
                );
            }
            LevelOutcome::Failed => {
                self.state = LevelState::Failed;
                log::info!(
                    "Level {} failed: {}/{} points",
                    config.level_number,
                    self.score,
                    config.target_score
                );
            }
            LevelOutcome::InProgress => {}
        }
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn config(&self) -> Option<&LevelConfig> {
        self.config.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_remaining(&self) -> u32 {
        self.moves_remaining
    }

    /// Stars earned; 0 until the level is completed
    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn matches_cleared(&self) -> u32 {
        self.matches_cleared
    }

    /// Longest cascade seen this attempt
    pub fn best_chain(&self) -> u32 {
        self.best_chain
    }
}

impl EventListener<GridEvent> for LevelSession {
    fn on_event(&mut self, event: &GridEvent) {
        if self.state != LevelState::Playing {
            return;
        }
        match event {
            GridEvent::MatchFound {
                shape, count, chain, ..
            } => {
                let points = compute_score(*count, *shape);
                self.score += points;
                self.matches_cleared += 1;
                self.best_chain = self.best_chain.max(chain + 1);
                log::debug!("Match +{} ({} total)", points, self.score);
            }
            GridEvent::ProcessingComplete { .. } => self.check_status(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::matcher::MatchShape;
    use crate::level::BallColor;

    fn match_event(count: usize, shape: MatchShape, chain: u32) -> GridEvent {
        GridEvent::MatchFound {
            shape,
            count,
            color: BallColor::Red,
            positions: Vec::new(),
            chain,
        }
    }

    fn complete() -> GridEvent {
        GridEvent::ProcessingComplete {
            total_matches: 0,
            total_score: 0,
            had_chain_reaction: false,
        }
    }

    fn config(target: u32, moves: u32) -> LevelConfig {
        LevelConfig {
            target_score: target,
            max_moves: moves,
            ..LevelConfig::default()
        }
    }

    #[test]
    fn test_ignores_events_before_start() {
        let mut session = LevelSession::new();
        session.on_event(&match_event(3, MatchShape::Horizontal, 0));
        session.on_move_completed();
        assert_eq!(session.score(), 0);
        assert_eq!(session.state(), LevelState::NotStarted);
    }

    #[test]
    fn test_accumulates_score() {
        let mut session = LevelSession::new();
        session.start(&config(1000, 10));
        session.on_event(&match_event(3, MatchShape::Horizontal, 0));
        session.on_event(&match_event(5, MatchShape::Cross, 1));
        assert_eq!(session.score(), 30 + 85);
        assert_eq!(session.matches_cleared(), 2);
        assert_eq!(session.best_chain(), 2);
        session.on_event(&complete());
        assert_eq!(session.state(), LevelState::Playing);
    }

    #[test]
    fn test_completes_with_stars() {
        let mut session = LevelSession::new();
        session.start(&config(60, 10));
        session.on_event(&match_event(3, MatchShape::Horizontal, 0));
        session.on_event(&match_event(3, MatchShape::Vertical, 0));
        session.on_event(&match_event(3, MatchShape::Vertical, 1));
        session.on_event(&complete());
        // 90 / 60 = 1.5
        assert_eq!(session.state(), LevelState::Completed);
        assert_eq!(session.stars(), 3);

        // Finished sessions ignore further events
        session.on_event(&match_event(3, MatchShape::Vertical, 0));
        assert_eq!(session.score(), 90);
    }

    #[test]
    fn test_fails_when_out_of_moves() {
        let mut session = LevelSession::new();
        session.start(&config(1000, 2));
        session.on_move_completed();
        assert_eq!(session.state(), LevelState::Playing);
        session.on_move_completed();
        assert_eq!(session.moves_remaining(), 0);
        assert_eq!(session.state(), LevelState::Failed);
        assert_eq!(session.stars(), 0);
    }

    #[test]
    fn test_completes_with_level_thresholds() {
        let mut session = LevelSession::new();
        session.start(&LevelConfig {
            two_star_score: Some(40),
            three_star_score: Some(100),
            ..config(30, 5)
        });
        session.on_event(&match_event(4, MatchShape::Horizontal, 0));
        session.on_event(&complete());
        // 45 clears the two-star mark but not three
        assert_eq!(session.state(), LevelState::Completed);
        assert_eq!(session.stars(), 2);
    }

    #[test]
    fn test_target_on_last_move_wins() {
        let mut session = LevelSession::new();
        session.start(&config(30, 1));
        session.on_event(&match_event(3, MatchShape::Horizontal, 0));
        session.on_move_completed();
        assert_eq!(session.state(), LevelState::Completed);
        assert_eq!(session.stars(), 1);
    }

    #[test]
    fn test_pause_blocks_scoring() {
        let mut session = LevelSession::new();
        session.start(&config(1000, 5));
        session.pause();
        assert_eq!(session.state(), LevelState::Paused);
        session.on_event(&match_event(3, MatchShape::Horizontal, 0));
        session.on_move_completed();
        assert_eq!(session.score(), 0);
        assert_eq!(session.moves_remaining(), 5);

        session.resume();
        assert_eq!(session.state(), LevelState::Playing);
    }

    #[test]
    fn test_restart_resets() {
        let mut session = LevelSession::new();
        assert!(!session.restart());

        session.start(&config(1000, 5));
        session.on_event(&match_event(4, MatchShape::Horizontal, 0));
        session.on_move_completed();
        assert!(session.restart());
        assert_eq!(session.score(), 0);
        assert_eq!(session.moves_remaining(), 5);
        assert_eq!(session.state(), LevelState::Playing);
    }

    #[test]
    fn test_next_level() {
        let mut session = LevelSession::new();
        session.start(&LevelConfig::for_level(3));
        let next = session.next_level();
        assert_eq!(next.level_number, 4);
        assert_eq!(next.target_score, 2500);
    }
}
