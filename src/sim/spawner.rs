//! Weighted ball generation
//!
//! Colors are drawn from the level's weighted distribution. When filling a
//! cell, colors that would complete a three-in-a-row with the two cells to
//! the left or the two cells below are excluded. The check only looks left
//! and down, which is enough when cells are filled bottom-up, left to right.

use rand::{Rng, SeedableRng};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_pcg::Pcg32;

use super::board::{Ball, Board};
use crate::error::EngineError;
use crate::level::{BallColor, ColorWeight};
use crate::{GridPos, grid_pos};

/// Seeded color generator
#[derive(Debug, Clone)]
pub struct Spawner {
    colors: Vec<ColorWeight>,
    rng: Pcg32,
}

impl Spawner {
    pub fn new(colors: Vec<ColorWeight>, seed: u64) -> Self {
        Self {
            colors,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn colors(&self) -> &[ColorWeight] {
        &self.colors
    }

    /// Sample a color not in `excluded`.
    ///
    /// Falls back to the full distribution if every color is excluded, and
    /// to a uniform pick if every weight is zero. When the eligible colors
    /// all have zero weight the first eligible one is returned.
    pub fn choose_color(&mut self, excluded: &[BallColor]) -> BallColor {
        let eligible: Vec<ColorWeight> = self
            .colors
            .iter()
            .copied()
            .filter(|cw| !excluded.contains(&cw.color))
            .collect();

        if eligible.is_empty() {
            log::debug!("All colors excluded, sampling unrestricted");
            let all = self.colors.clone();
            return match self.sample(&all) {
                Some(color) => color,
                None => {
                    let index = self.rng.random_range(0..all.len());
                    all[index].color
                }
            };
        }

        self.sample(&eligible).unwrap_or(eligible[0].color)
    }

    fn sample(&mut self, pool: &[ColorWeight]) -> Option<BallColor> {
        let dist = WeightedIndex::new(pool.iter().map(|cw| cw.weight.max(0.0))).ok()?;
        Some(pool[dist.sample(&mut self.rng)].color)
    }

    /// Colors that would complete a run ending at `pos` from the left or from below
    pub fn prematch_exclusions(board: &Board, pos: GridPos) -> Vec<BallColor> {
        let mut excluded = Vec::with_capacity(2);
        for step in [grid_pos(1, 0), grid_pos(0, 1)] {
            let near = board.color_at(pos - step);
            let far = board.color_at(pos - step * 2);
            if let (Some(a), Some(b)) = (near, far) {
                if a == b && !excluded.contains(&a) {
                    excluded.push(a);
                }
            }
        }
        excluded
    }

    /// Place a new ball at `pos` whose color does not finish a left or downward run
    pub fn spawn_avoiding_prematch(
        &mut self,
        board: &mut Board,
        pos: GridPos,
    ) -> Result<Ball, EngineError> {
        if !board.is_valid_position(pos) {
            return Err(EngineError::OutOfBounds {
                pos,
                size: board.size(),
            });
        }
        let excluded = Self::prematch_exclusions(board, pos);
        let color = self.choose_color(&excluded);
        board.spawn_ball(pos, color)
    }
}
