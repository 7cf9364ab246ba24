//! Reel window geometry and the draw seam
//!
//! Tiles are `TILE_SIZE` squares spread evenly inside the machine window:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ gap [tile] gap [tile] gap    │  gap_x = (width  - reels × tile) / (reels + 1)
//! │                              │  gap_y = (height - rows  × tile) / (rows  + 1)
//! └──────────────────────────────┘  row_height = tile + gap_y
//! ```

use serde::{Deserialize, Serialize};

use crate::Symbol;
use crate::event::Position;

/// Side of one symbol tile (pixels)
pub const TILE_SIZE: f32 = 40.0;

/// Axis-aligned rectangle (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Placement of reels and tiles inside a machine window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReelLayout {
    pub rect: Rect,
    pub reels: usize,
    pub rows: usize,
}

impl ReelLayout {
    pub fn new(rect: Rect, reels: usize, rows: usize) -> Self {
        Self { rect, reels, rows }
    }

    /// Reel window of a machine drawn at `origin`
    pub fn default_window(origin: Position) -> Rect {
        Rect::new(origin.x + 10.0, origin.y + 60.0, 164.0, 86.0)
    }

    pub fn gap_x(&self) -> f32 {
        (self.rect.width - self.reels as f32 * TILE_SIZE) / (self.reels as f32 + 1.0)
    }

    pub fn gap_y(&self) -> f32 {
        (self.rect.height - self.rows as f32 * TILE_SIZE) / (self.rows as f32 + 1.0)
    }

    /// Scroll distance for one shift-in
    pub fn row_height(&self) -> f32 {
        TILE_SIZE + self.gap_y()
    }

    /// Full-height column of one reel
    pub fn reel_rect(&self, reel: usize) -> Rect {
        Rect::new(
            self.reel_x(reel),
            self.rect.y,
            TILE_SIZE,
            self.rect.height,
        )
    }

    /// Top-left of the tile at `row` (-1 = the upcoming symbol above the
    /// window), shifted down by the reel's scroll `offset`
    pub fn tile_position(&self, reel: usize, row: i32, offset: f32) -> Position {
        let gap_y = self.gap_y();
        Position::new(
            self.reel_x(reel),
            self.rect.y + gap_y * (row + 1) as f32 + row as f32 * TILE_SIZE + offset,
        )
    }

    fn reel_x(&self, reel: usize) -> f32 {
        self.rect.x + self.gap_x() * (reel + 1) as f32 + reel as f32 * TILE_SIZE
    }
}

/// Drawing backend a machine renders through
pub trait SlotRenderer {
    fn draw_tile(&mut self, symbol: Symbol, pos: Position);

    /// Flash a reel that is being anticipated
    fn highlight_reel(&mut self, _rect: Rect) {}

    /// Restrict drawing to `rect` until [`SlotRenderer::end_clip`]
    fn begin_clip(&mut self, _rect: Rect) {}

    fn end_clip(&mut self) {}
}
