//! Level progress book
//!
//! Best stars and high score per level, plus which levels are unlocked.
//! Kept in memory; serializable for callers that want to store it.

use serde::{Deserialize, Serialize};

/// Progress on a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// 0-based
    pub level_index: usize,
    pub unlocked: bool,
    /// Best stars earned (0 = never completed)
    pub stars: u8,
    pub high_score: u32,
}

impl LevelProgress {
    /// Fresh record; only the first level starts unlocked
    pub fn new(level_index: usize) -> Self {
        Self {
            level_index,
            unlocked: level_index == 0,
            stars: 0,
            high_score: 0,
        }
    }

    /// Keep the better of the stored and the new result, per field
    pub fn update(&mut self, stars: u8, score: u32) {
        self.stars = self.stars.max(stars);
        self.high_score = self.high_score.max(score);
    }
}

impl std::fmt::Display for LevelProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level {}: unlocked={}, stars={}, high score={}",
            self.level_index, self.unlocked, self.stars, self.high_score
        )
    }
}

/// Progress across a fixed list of levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressBook {
    pub levels: Vec<LevelProgress>,
}

impl ProgressBook {
    pub fn new(level_count: usize) -> Self {
        Self {
            levels: (0..level_count).map(LevelProgress::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn progress(&self, level_index: usize) -> Option<&LevelProgress> {
        self.levels.get(level_index)
    }

    /// Record a finished level. Earning at least one star unlocks the next
    /// level. Returns false for an unknown level.
    pub fn complete_level(&mut self, level_index: usize, stars: u8, score: u32) -> bool {
        let Some(progress) = self.levels.get_mut(level_index) else {
            log::warn!("Progress for unknown level {}", level_index);
            return false;
        };
        progress.update(stars, score);
        log::info!("Level {} completed: {} star(s), {} points", level_index, stars, score);

        if stars >= 1 && level_index + 1 < self.levels.len() {
            self.unlock(level_index + 1);
        }
        true
    }

    /// Returns false for an unknown level
    pub fn unlock(&mut self, level_index: usize) -> bool {
        match self.levels.get_mut(level_index) {
            Some(progress) => {
                if !progress.unlocked {
                    progress.unlocked = true;
                    log::info!("Level {} unlocked", level_index);
                }
                true
            }
            None => false,
        }
    }

    /// The first level is always playable
    pub fn is_unlocked(&self, level_index: usize) -> bool {
        level_index == 0 || self.levels.get(level_index).is_some_and(|p| p.unlocked)
    }

    /// Sum of best stars
    pub fn total_stars(&self) -> u32 {
        self.levels.iter().map(|p| p.stars as u32).sum()
    }

    /// Forget all results; only the first level stays unlocked
    pub fn clear(&mut self) {
        let count = self.levels.len();
        *self = Self::new(count);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_level_unlocked() {
        let book = ProgressBook::new(3);
        assert!(book.is_unlocked(0));
        assert!(!book.is_unlocked(1));
        assert!(!book.is_unlocked(7));
        assert_eq!(book.total_stars(), 0);
    }

    #[test]
    fn test_complete_unlocks_next() {
        let mut book = ProgressBook::new(3);
        assert!(book.complete_level(0, 2, 1300));
        assert!(book.is_unlocked(1));
        assert!(!book.is_unlocked(2));

        // Last level has no successor
        book.complete_level(2, 3, 9000);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_zero_stars_keeps_next_locked() {
        let mut book = ProgressBook::new(2);
        book.complete_level(0, 0, 400);
        assert!(!book.is_unlocked(1));
        assert_eq!(book.progress(0).unwrap().high_score, 400);
    }

    #[test]
    fn test_keeps_bests() {
        let mut book = ProgressBook::new(2);
        book.complete_level(0, 3, 1500);
        book.complete_level(0, 1, 1800);
        let p = book.progress(0).unwrap();
        assert_eq!(p.stars, 3);
        assert_eq!(p.high_score, 1800);
    }

    #[test]
    fn test_unknown_level() {
        let mut book = ProgressBook::new(1);
        assert!(!book.complete_level(5, 3, 10));
        assert!(!book.unlock(5));
    }

    #[test]
    fn test_json_round_trip_and_clear() {
        let mut book = ProgressBook::new(2);
        book.complete_level(0, 2, 1200);
        let restored = ProgressBook::from_json(&book.to_json().unwrap()).unwrap();
        assert_eq!(restored, book);

        book.clear();
        assert_eq!(book, ProgressBook::new(2));
    }
}
