// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::ops::{Add, Sub};

/// A point in 2D space, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Position {
        Position { x, y }
    }
}

impl Add for Position {
    type Output = Position;
    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;
    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Size {
        Size { width, height }
    }
}

/// Width and height in whole units, e.g. the dimensions of a tile map in
/// tiles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> GridSize {
        GridSize { width, height }
    }

    /// The amount of cells in a grid of this size.
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A floating-point axis-aligned 2D rectangle.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    /// The top-left corner of the rectangle.
    pub pos: Position,
    /// The dimensions of the rectangle.
    pub size: Size,
}

impl Rect {
    /// Creates a new [`Rect`] from a given top-left corner and dimensions.
    pub const fn new(pos: Position, size: Size) -> Rect {
        Rect { pos, size }
    }

    /// Creates a new [`Rect`] from a given top-left corner and dimensions.
    pub const fn xywh(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Position::new(x, y), Size::new(w, h))
    }

    /// Returns true if the rectangles overlap. Rectangles that only share an
    /// edge do not.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.pos.x < other.pos.x + other.size.width
            && self.pos.x + self.size.width > other.pos.x
            && self.pos.y < other.pos.y + other.size.height
            && self.pos.y + self.size.height > other.pos.y
    }

    /// Returns the same rectangle moved by `delta`.
    pub fn offset(self, delta: Position) -> Rect {
        Rect::new(self.pos + delta, self.size)
    }
}

/// Rounds towards negative infinity. Saturates at the bounds of `i32`, NaN
/// becomes 0.
pub fn floor_to_i32(value: f32) -> i32 {
    let truncated = value as i32;
    if (truncated as f32) > value {
        truncated.saturating_sub(1)
    } else {
        truncated
    }
}

/// Rounds towards positive infinity. Saturates at the bounds of `i32`, NaN
/// becomes 0.
pub fn ceil_to_i32(value: f32) -> i32 {
    let truncated = value as i32;
    if (truncated as f32) < value {
        truncated.saturating_add(1)
    } else {
        truncated
    }
}
