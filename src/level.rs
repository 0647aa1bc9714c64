//! Level configuration
//!
//! Read-only input to the engine: grid size, spawnable colors and their
//! weights, target score and move budget. Loaded from JSON or built in code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_GRID_SIZE, MAX_GRID_SIZE, MIN_GRID_SIZE, THREE_STAR_RATIO, TWO_STAR_RATIO,
};
use crate::error::ConfigIssue;
use crate::sim::score::stars_for;

/// Ball colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl BallColor {
    pub const ALL: [BallColor; 6] = [
        BallColor::Red,
        BallColor::Blue,
        BallColor::Green,
        BallColor::Yellow,
        BallColor::Purple,
        BallColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BallColor::Red => "Red",
            BallColor::Blue => "Blue",
            BallColor::Green => "Green",
            BallColor::Yellow => "Yellow",
            BallColor::Purple => "Purple",
            BallColor::Orange => "Orange",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(BallColor::Red),
            "blue" => Some(BallColor::Blue),
            "green" => Some(BallColor::Green),
            "yellow" => Some(BallColor::Yellow),
            "purple" => Some(BallColor::Purple),
            "orange" => Some(BallColor::Orange),
            _ => None,
        }
    }
}

impl fmt::Display for BallColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spawnable color and its relative weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorWeight {
    pub color: BallColor,
    /// Non-negative; 0 makes the color unreachable unless nothing else is eligible
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl ColorWeight {
    pub fn new(color: BallColor, weight: f32) -> Self {
        Self { color, weight }
    }

    /// Equal weight for every given color
    pub fn uniform(colors: &[BallColor]) -> Vec<Self> {
        colors.iter().map(|&c| Self::new(c, 1.0)).collect()
    }
}

/// Errors from loading a level file
#[derive(Debug)]
pub enum ConfigError {
    /// Malformed JSON
    Parse(serde_json::Error),
    /// Well-formed but unusable
    Invalid(ConfigIssue),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "failed to parse level config: {}", e),
            ConfigError::Invalid(issue) => write!(f, "invalid level config: {}", issue.message()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Level configuration consumed by the engine and the level session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// 1-based level number
    pub level_number: u32,
    pub name: String,
    /// Board is `grid_size`×`grid_size`
    pub grid_size: usize,
    pub max_moves: u32,
    pub target_score: u32,
    /// Two-star score (defaults to `TWO_STAR_RATIO` of the target)
    pub two_star_score: Option<u32>,
    /// Three-star score (defaults to `THREE_STAR_RATIO` of the target)
    pub three_star_score: Option<u32>,
    /// Spawnable colors with weights
    pub colors: Vec<ColorWeight>,
    /// Spawner seed
    pub seed: u64,
    /// Cascade round cap (defaults to `DEFAULT_MAX_CHAIN_ITERATIONS`)
    pub max_chain_iterations: Option<u32>,
    /// Gravity pass cap (defaults to the board size)
    pub gravity_max_passes: Option<usize>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            level_number: 1,
            name: "Level 1".to_string(),
            grid_size: DEFAULT_GRID_SIZE,
            max_moves: 20,
            target_score: 1000,
            two_star_score: None,
            three_star_score: None,
            colors: ColorWeight::uniform(&[BallColor::Red, BallColor::Blue, BallColor::Green]),
            seed: 0,
            max_chain_iterations: None,
            gravity_max_passes: None,
        }
    }
}

impl LevelConfig {
    /// Minimum move budget accepted by `validated`
    pub const MIN_MOVES: u32 = 5;

    /// Gap `validated` puts between out-of-order star thresholds
    pub const STAR_STEP: u32 = 500;

    /// Progression curve: +500 target per level, one move fewer every two levels (at most 5 fewer)
    pub fn for_level(level_number: u32) -> Self {
        let level_number = level_number.max(1);
        Self {
            level_number,
            name: format!("Level {}", level_number),
            target_score: (level_number - 1).saturating_mul(500).saturating_add(1000),
            max_moves: 20 - (level_number / 2).min(5),
            ..Self::default()
        }
    }

    /// Parse a level from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(json)?;
        config.check().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hard requirements for running the engine at all
    pub fn check(&self) -> Result<(), ConfigIssue> {
        if self.grid_size == 0 {
            return Err(ConfigIssue::EmptyGrid);
        }
        if self.colors.is_empty() {
            return Err(ConfigIssue::NoColors);
        }
        Ok(())
    }

    /// Return a copy normalized to authoring rules: even grid size in
    /// 6..=10, at least `MIN_MOVES` moves, star thresholds strictly above
    /// the target and each other, at least two distinct colors, weights in
    /// [0, 1]. Each adjustment is logged.
    pub fn validated(&self) -> Self {
        let mut config = self.clone();

        if config.level_number < 1 {
            config.level_number = 1;
        }

        let mut size = config.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        if size % 2 != 0 {
            size = (size + 1).clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        }
        if size != config.grid_size {
            log::warn!("Grid size {} adjusted to {}", config.grid_size, size);
            config.grid_size = size;
        }

        if config.max_moves < Self::MIN_MOVES {
            log::warn!("Max moves {} raised to {}", config.max_moves, Self::MIN_MOVES);
            config.max_moves = Self::MIN_MOVES;
        }

        if let Some(two) = config.two_star_score {
            if two <= config.target_score {
                let raised = config.target_score.saturating_add(Self::STAR_STEP);
                log::warn!("Two-star score {} raised to {}", two, raised);
                config.two_star_score = Some(raised);
            }
        }
        if let Some(three) = config.three_star_score {
            let (two, _) = config.star_thresholds();
            if three <= two {
                let raised = two.saturating_add(Self::STAR_STEP);
                log::warn!("Three-star score {} raised to {}", three, raised);
                config.three_star_score = Some(raised);
            }
        }

        let mut colors: Vec<ColorWeight> = Vec::with_capacity(config.colors.len());
        for entry in &config.colors {
            if colors.iter().any(|c| c.color == entry.color) {
                log::warn!("Duplicate color {} dropped", entry.color);
                continue;
            }
            let weight = if entry.weight.is_nan() {
                0.0
            } else {
                entry.weight.clamp(0.0, 1.0)
            };
            colors.push(ColorWeight::new(entry.color, weight));
        }
        if colors.len() < 2 {
            log::warn!("At least 2 colors required, using defaults");
            colors = ColorWeight::uniform(&[BallColor::Red, BallColor::Blue, BallColor::Green]);
        }
        config.colors = colors;

        config
    }

    /// Scores needed for two and three stars
    pub fn star_thresholds(&self) -> (u32, u32) {
        let by_ratio = |ratio: f64| (self.target_score as f64 * ratio).ceil() as u32;
        (
            self.two_star_score.unwrap_or_else(|| by_ratio(TWO_STAR_RATIO)),
            self.three_star_score.unwrap_or_else(|| by_ratio(THREE_STAR_RATIO)),
        )
    }

    /// Stars for a completed level, 1 to 3
    pub fn star_rating(&self, score: u32) -> u8 {
        let (two, three) = self.star_thresholds();
        stars_for(score, two, three)
    }

    pub fn max_chain_iterations(&self) -> u32 {
        self.max_chain_iterations
            .unwrap_or(crate::consts::DEFAULT_MAX_CHAIN_ITERATIONS)
    }
}

impl fmt::Display for LevelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level {}: {} | Grid: {}x{} | Moves: {} | Target: {}",
            self.level_number,
            self.name,
            self.grid_size,
            self.grid_size,
            self.max_moves,
            self.target_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_str() {
        assert_eq!(BallColor::from_str("RED"), Some(BallColor::Red));
        assert_eq!(BallColor::from_str("purple"), Some(BallColor::Purple));
        assert_eq!(BallColor::from_str("pink"), None);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LevelConfig::from_json(r#"{ "grid_size": 6, "target_score": 500 }"#).unwrap();
        assert_eq!(config.grid_size, 6);
        assert_eq!(config.target_score, 500);
        assert_eq!(config.max_moves, 20);
        assert_eq!(config.colors.len(), 3);
    }

    #[test]
    fn test_from_json_color_weights() {
        let json = r#"{
            "colors": [
                { "color": "Red", "weight": 0.5 },
                { "color": "Yellow" }
            ]
        }"#;
        let config = LevelConfig::from_json(json).unwrap();
        assert_eq!(config.colors[0], ColorWeight::new(BallColor::Red, 0.5));
        assert_eq!(config.colors[1], ColorWeight::new(BallColor::Yellow, 1.0));
    }

    #[test]
    fn test_from_json_rejects_unusable() {
        let err = LevelConfig::from_json(r#"{ "colors": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ConfigIssue::NoColors)));

        let err = LevelConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validated_even_grid() {
        let mut config = LevelConfig::default();
        config.grid_size = 7;
        assert_eq!(config.validated().grid_size, 8);
        config.grid_size = 9;
        assert_eq!(config.validated().grid_size, 10);
        config.grid_size = 3;
        assert_eq!(config.validated().grid_size, 6);
        config.grid_size = 40;
        assert_eq!(config.validated().grid_size, 10);
    }

    #[test]
    fn test_validated_moves_and_colors() {
        let config = LevelConfig {
            max_moves: 2,
            colors: vec![
                ColorWeight::new(BallColor::Red, 3.0),
                ColorWeight::new(BallColor::Red, 1.0),
            ],
            ..LevelConfig::default()
        };
        let v = config.validated();
        assert_eq!(v.max_moves, LevelConfig::MIN_MOVES);
        // Only one distinct color survives, so defaults are used
        assert_eq!(v.colors.len(), 3);

        let config = LevelConfig {
            colors: vec![
                ColorWeight::new(BallColor::Red, 3.0),
                ColorWeight::new(BallColor::Blue, -1.0),
            ],
            ..LevelConfig::default()
        };
        let v = config.validated();
        assert_eq!(v.colors[0].weight, 1.0);
        assert_eq!(v.colors[1].weight, 0.0);
    }

    #[test]
    fn test_for_level_curve() {
        let l1 = LevelConfig::for_level(1);
        assert_eq!(l1.target_score, 1000);
        assert_eq!(l1.max_moves, 20);

        let l4 = LevelConfig::for_level(4);
        assert_eq!(l4.target_score, 2500);
        assert_eq!(l4.max_moves, 18);

        let l20 = LevelConfig::for_level(20);
        assert_eq!(l20.max_moves, 15);

        let far = LevelConfig::for_level(u32::MAX);
        assert_eq!(far.target_score, u32::MAX);
        assert_eq!(far.max_moves, 15);
    }

    #[test]
    fn test_star_thresholds() {
        let config = LevelConfig::default();
        assert_eq!(config.star_thresholds(), (1200, 1500));
        assert_eq!(config.star_rating(1199), 1);
        assert_eq!(config.star_rating(1200), 2);
        assert_eq!(config.star_rating(1500), 3);

        let config = LevelConfig {
            two_star_score: Some(1500),
            three_star_score: Some(2000),
            ..LevelConfig::default()
        };
        assert_eq!(config.star_rating(1499), 1);
        assert_eq!(config.star_rating(1500), 2);
        assert_eq!(config.star_rating(1999), 2);
        assert_eq!(config.star_rating(2000), 3);
    }

    #[test]
    fn test_validated_orders_star_thresholds() {
        let config = LevelConfig {
            target_score: 1000,
            two_star_score: Some(900),
            three_star_score: Some(1200),
            ..LevelConfig::default()
        };
        let v = config.validated();
        assert_eq!(v.two_star_score, Some(1500));
        assert_eq!(v.three_star_score, Some(2000));

        // Three-star alone is checked against the ratio-based two-star mark
        let config = LevelConfig {
            target_score: 1000,
            three_star_score: Some(1100),
            ..LevelConfig::default()
        };
        let v = config.validated();
        assert_eq!(v.two_star_score, None);
        assert_eq!(v.three_star_score, Some(1700));

        let ordered = LevelConfig {
            two_star_score: Some(1500),
            three_star_score: Some(2000),
            ..LevelConfig::default()
        };
        assert_eq!(ordered.validated(), ordered);
    }

    #[test]
    fn test_json_roundtrip_keeps_overrides() {
        let config = LevelConfig {
            seed: 42,
            max_chain_iterations: Some(3),
            ..LevelConfig::default()
        };
        let json = config.to_json().unwrap();
        let back = LevelConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.max_chain_iterations(), 3);
        assert_eq!(back.gravity_max_passes, None);
    }
}
