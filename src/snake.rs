//! Snake on the 16x8 cell grid the 128x64 panel gives us at 8px cells.
//! The simulation advances on its own fixed cadence while rendering rides
//! the main loop's frame rate. Walls are fatal; heading changes buffer one
//! step ahead and a direct reversal is silently ignored.

use std::collections::VecDeque;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::frame::{Frame, HEIGHT, WIDTH};

const CELL_PX: u32 = 8;
/// Steps-per-interval divisor at game start; shrinks as the score climbs.
const START_SPEED_TICKS: u32 = 5;
const MIN_SPEED_TICKS: u32 = 2;
/// Score interval between speedups.
const SPEEDUP_EVERY: u32 = 3;
const START_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    fn delta(self) -> (i16, i16) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    fn opposite(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    /// Quarter turn; clockwise matches a clockwise twist of the encoder.
    fn turned(self, clockwise: bool) -> Self {
        match (self, clockwise) {
            (Heading::Up, true) => Heading::Right,
            (Heading::Right, true) => Heading::Down,
            (Heading::Down, true) => Heading::Left,
            (Heading::Left, true) => Heading::Up,
            (Heading::Up, false) => Heading::Left,
            (Heading::Left, false) => Heading::Down,
            (Heading::Down, false) => Heading::Right,
            (Heading::Right, false) => Heading::Up,
        }
    }
}

/// Xorshift32; plenty for food placement and seedable for tests.
struct Rng(u32);

impl Rng {
    fn new(seed: u32) -> Self {
        // Xorshift must not start at zero.
        Self(seed.max(1))
    }

    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }

    fn range(&mut self, max: u32) -> u32 {
        self.next() % max
    }
}

pub struct SnakeGame {
    cols: i16,
    rows: i16,
    /// Head first; always a simple path.
    body: VecDeque<Cell>,
    heading: Heading,
    pending: Option<Heading>,
    food: Cell,
    score: u32,
    steps: u64,
    terminal: bool,
    speed_ticks: u32,
    rng: Rng,
}

impl SnakeGame {
    /// Fresh game sized to the display, snake centered heading right.
    pub fn new(seed: u32) -> Self {
        Self::with_board((WIDTH / CELL_PX) as i16, (HEIGHT / CELL_PX) as i16, seed)
    }

    pub fn with_board(cols: i16, rows: i16, seed: u32) -> Self {
        let mid = Cell {
            x: cols / 2,
            y: rows / 2,
        };
        let body: VecDeque<Cell> = (0..START_LENGTH as i16)
            .map(|i| Cell {
                x: mid.x - i,
                y: mid.y,
            })
            .collect();
        let mut game = Self {
            cols,
            rows,
            body,
            heading: Heading::Right,
            pending: None,
            food: mid, // replaced below
            score: 0,
            steps: 0,
            terminal: false,
            speed_ticks: START_SPEED_TICKS,
            rng: Rng::new(seed),
        };
        game.spawn_food();
        game
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_over(&self) -> bool {
        self.terminal
    }

    pub fn head(&self) -> Cell {
        *self.body.front().expect("body is never empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Current step cadence as a multiple of the base interval; shrinks as
    /// food is eaten so the game speeds up.
    pub fn speed_factor(&self) -> f32 {
        self.speed_ticks as f32 / START_SPEED_TICKS as f32
    }

    /// Buffer a quarter turn off the encoder for the next step.
    pub fn turn(&mut self, clockwise: bool) {
        let base = self.pending.unwrap_or(self.heading);
        self.pending = Some(base.turned(clockwise));
    }

    /// Buffer an absolute heading (directional input sources).
    pub fn set_pending(&mut self, heading: Heading) {
        self.pending = Some(heading);
    }

    /// Advance one simulation step.
    pub fn step(&mut self) {
        if self.terminal {
            return;
        }
        self.steps += 1;

        if let Some(pending) = self.pending.take() {
            // Reversing through your own neck is never a move.
            if pending != self.heading.opposite() {
                self.heading = pending;
            }
        }

        let (dx, dy) = self.heading.delta();
        let head = self.head();
        let new_head = Cell {
            x: head.x + dx,
            y: head.y + dy,
        };

        // Walls are fatal on a board this small.
        if new_head.x < 0 || new_head.y < 0 || new_head.x >= self.cols || new_head.y >= self.rows {
            self.terminal = true;
            return;
        }

        let eats = new_head == self.food;
        // The tail cell vacates this step unless we grow, so it does not
        // count as a collision target.
        let occupied = self.body.len() - usize::from(!eats);
        if self.body.iter().take(occupied).any(|c| *c == new_head) {
            self.terminal = true;
            return;
        }

        self.body.push_front(new_head);
        if eats {
            self.score += 1;
            if self.speed_ticks > MIN_SPEED_TICKS && self.score % SPEEDUP_EVERY == 0 {
                self.speed_ticks -= 1;
            }
            self.spawn_food();
        } else {
            self.body.pop_back();
        }
    }

    /// Place food uniformly among free cells. A board with no free cell left
    /// means the snake won; treat it as terminal.
    fn spawn_food(&mut self) {
        let free: Vec<Cell> = (0..self.rows)
            .flat_map(|y| (0..self.cols).map(move |x| Cell { x, y }))
            .filter(|c| !self.body.contains(c))
            .collect();
        match free.len() {
            0 => self.terminal = true,
            n => self.food = free[self.rng.range(n as u32) as usize],
        }
    }

    fn cell_rect(&self, cell: Cell) -> Rectangle {
        Rectangle::new(
            Point::new(
                i32::from(cell.x) * CELL_PX as i32 + 1,
                i32::from(cell.y) * CELL_PX as i32 + 1,
            ),
            Size::new(CELL_PX - 2, CELL_PX - 2),
        )
    }

    /// Draw the board, score, and (when over) the game-over banner.
    pub fn render(&self, frame: &mut Frame) {
        let outline = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
        let filled = PrimitiveStyle::with_fill(BinaryColor::On);

        self.cell_rect(self.food)
            .into_styled(outline)
            .draw(frame)
            .ok();
        for (i, cell) in self.body.iter().enumerate() {
            let style = if i == 0 { filled } else { outline };
            self.cell_rect(*cell).into_styled(style).draw(frame).ok();
        }

        let text = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(
            &format!("Score: {}", self.score),
            Point::new(2, 0),
            text,
            Baseline::Top,
        )
        .draw(frame)
        .ok();
        if self.terminal {
            Text::with_baseline("GAME OVER", Point::new(32, 26), text, Baseline::Top)
                .draw(frame)
                .ok();
        }
    }
}
