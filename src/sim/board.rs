//! Board storage
//!
//! Balls live in a dense slot arena; each cell holds a slot index or nothing.
//! Moving a ball hands its slot index from one cell to another, so a ball is
//! never owned by two cells at once. Callers only ever see copies
//! (`CellView`, `Ball`), never references into the arena.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::level::BallColor;
use crate::{GridPos, grid_pos, in_bounds};

/// Opaque per-ball identity for correlating animations. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub u64);

/// A placed ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub color: BallColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct CellSlot {
    ball: Option<u32>,
    locked: bool,
    special: bool,
}

/// Read-only copy of a cell. Mutating it does not affect the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub pos: GridPos,
    pub ball: Option<Ball>,
    pub locked: bool,
    pub special: bool,
}

impl CellView {
    /// No ball, not locked, not a special block
    pub fn is_empty(&self) -> bool {
        self.ball.is_none() && !self.locked && !self.special
    }

    pub fn is_occupied(&self) -> bool {
        self.ball.is_some()
    }

    pub fn color(&self) -> Option<BallColor> {
        self.ball.map(|b| b.color)
    }
}

/// Square grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    /// Row-major, row 0 at the bottom
    cells: Vec<CellSlot>,
    balls: Vec<Option<Ball>>,
    free_slots: Vec<u32>,
    next_id: u64,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellSlot::default(); size * size],
            balls: Vec::with_capacity(size * size),
            free_slots: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a board from text rows, top row first.
    ///
    /// `R B G Y P O` place a ball of that color, `.` is an empty cell and
    /// `#` is a special block. Returns `None` unless the rows form a square
    /// of known symbols.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let size = rows.len();
        let mut board = Board::new(size);
        for (row, line) in rows.iter().enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != size {
                return None;
            }
            let y = (size - 1 - row) as i32;
            for (x, &symbol) in symbols.iter().enumerate() {
                let pos = grid_pos(x as i32, y);
                match symbol {
                    '.' => {}
                    '#' => board.set_special(pos, true).ok()?,
                    _ => {
                        board.spawn_ball(pos, color_from_symbol(symbol)?).ok()?;
                    }
                }
            }
        }
        Some(board)
    }

    /// Render as text rows, top row first (inverse of `from_rows`)
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.size)
            .rev()
            .map(|y| {
                (0..self.size)
                    .map(|x| {
                        let slot = self.cells[y * self.size + x];
                        match self.slot_ball(slot) {
                            Some(ball) => color_symbol(ball.color),
                            None if slot.special => '#',
                            None => '.',
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_valid_position(&self, pos: GridPos) -> bool {
        in_bounds(pos, self.size)
    }

    fn index(&self, pos: GridPos) -> Result<usize, EngineError> {
        if !self.is_valid_position(pos) {
            return Err(EngineError::OutOfBounds {
                pos,
                size: self.size,
            });
        }
        Ok(pos.y as usize * self.size + pos.x as usize)
    }

    fn slot_ball(&self, slot: CellSlot) -> Option<Ball> {
        slot.ball.and_then(|i| self.balls[i as usize])
    }

    fn alloc(&mut self, ball: Ball) -> u32 {
        match self.free_slots.pop() {
            Some(slot) => {
                self.balls[slot as usize] = Some(ball);
                slot
            }
            None => {
                self.balls.push(Some(ball));
                (self.balls.len() - 1) as u32
            }
        }
    }

    fn release(&mut self, slot: u32) -> Option<Ball> {
        let ball = self.balls[slot as usize].take();
        self.free_slots.push(slot);
        ball
    }

    /// Copy of the cell at `pos`
    pub fn cell(&self, pos: GridPos) -> Result<CellView, EngineError> {
        let slot = self.cells[self.index(pos)?];
        Ok(CellView {
            pos,
            ball: self.slot_ball(slot),
            locked: slot.locked,
            special: slot.special,
        })
    }

    pub fn ball_at(&self, pos: GridPos) -> Result<Option<Ball>, EngineError> {
        Ok(self.slot_ball(self.cells[self.index(pos)?]))
    }

    /// Color at `pos`, or `None` when the cell is empty or off the board.
    /// Non-failing lookup for scans that walk up to the edge.
    pub fn color_at(&self, pos: GridPos) -> Option<BallColor> {
        let index = self.index(pos).ok()?;
        self.slot_ball(self.cells[index]).map(|b| b.color)
    }

    /// Mint a ball with a fresh identity without placing it
    pub fn new_ball(&mut self, color: BallColor) -> Ball {
        let id = BallId(self.next_id);
        self.next_id += 1;
        Ball { id, color }
    }

    /// Mint a ball and place it at `pos`
    pub fn spawn_ball(&mut self, pos: GridPos, color: BallColor) -> Result<Ball, EngineError> {
        self.index(pos)?;
        let ball = self.new_ball(color);
        self.set_ball(pos, ball)?;
        Ok(ball)
    }

    /// Place `ball` at `pos`, overwriting any occupant. Returns the displaced ball.
    pub fn set_ball(&mut self, pos: GridPos, ball: Ball) -> Result<Option<Ball>, EngineError> {
        let index = self.index(pos)?;
        let displaced = self.cells[index].ball.take().and_then(|s| self.release(s));
        let slot = self.alloc(ball);
        self.cells[index].ball = Some(slot);
        Ok(displaced)
    }

    /// Remove and return the ball at `pos`
    pub fn clear_ball(&mut self, pos: GridPos) -> Result<Option<Ball>, EngineError> {
        let index = self.index(pos)?;
        Ok(self.cells[index].ball.take().and_then(|s| self.release(s)))
    }

    /// Exchange the balls of two cells (either may be empty). Self-swap is a no-op.
    pub fn swap_balls(&mut self, a: GridPos, b: GridPos) -> Result<(), EngineError> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        if ia != ib {
            let tmp = self.cells[ia].ball;
            self.cells[ia].ball = self.cells[ib].ball;
            self.cells[ib].ball = tmp;
        }
        Ok(())
    }

    /// Transfer the ball at `from` to `to`. Any ball already at `to` is
    /// destroyed. Returns the moved ball, or `None` if `from` was empty.
    pub fn move_ball(&mut self, from: GridPos, to: GridPos) -> Result<Option<Ball>, EngineError> {
        let ifrom = self.index(from)?;
        let ito = self.index(to)?;
        if ifrom == ito {
            return Ok(self.slot_ball(self.cells[ifrom]));
        }
        let Some(slot) = self.cells[ifrom].ball.take() else {
            return Ok(None);
        };
        if let Some(old) = self.cells[ito].ball.replace(slot) {
            self.release(old);
        }
        Ok(self.balls[slot as usize])
    }

    pub fn set_locked(&mut self, pos: GridPos, locked: bool) -> Result<(), EngineError> {
        let index = self.index(pos)?;
        self.cells[index].locked = locked;
        Ok(())
    }

    pub fn set_special(&mut self, pos: GridPos, special: bool) -> Result<(), EngineError> {
        let index = self.index(pos)?;
        self.cells[index].special = special;
        Ok(())
    }

    /// True if the cell exists and is empty (see `CellView::is_empty`)
    pub fn is_empty_at(&self, pos: GridPos) -> bool {
        self.cell(pos).map(|c| c.is_empty()).unwrap_or(false)
    }

    /// All coordinates, row-major from the bottom-left corner
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + use<> {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| grid_pos(x, y)))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.ball.is_some()).count()
    }

    /// Remove every ball, keeping cell flags
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.ball = None;
        }
        self.balls.clear();
        self.free_slots.clear();
    }
}

fn color_symbol(color: BallColor) -> char {
    match color {
        BallColor::Red => 'R',
        BallColor::Blue => 'B',
        BallColor::Green => 'G',
        BallColor::Yellow => 'Y',
        BallColor::Purple => 'P',
        BallColor::Orange => 'O',
    }
}

fn color_from_symbol(symbol: char) -> Option<BallColor> {
    BallColor::ALL
        .into_iter()
        .find(|&c| color_symbol(c) == symbol.to_ascii_uppercase())
}
