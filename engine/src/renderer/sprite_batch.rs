// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use tilekit_platform::Platform;

use crate::{
    allocators::LinearAllocator,
    collections::FixedVec,
    geom::{Position, Rect, Size},
    resources::SpriteSheet,
};

use super::{draw_region, sheet_render_mode, RegionBinder};

/// Many copies of the same sprite, drawn with a single texture bind. Useful
/// for particles, bullets, coins and such.
pub struct SpriteBatch<'a> {
    sheet: SpriteSheet,
    positions: FixedVec<'a, Position>,
    size: Size,
    render_offset: Position,
}

impl<'a> SpriteBatch<'a> {
    /// Creates an empty batch with room for `capacity` sprites of `size`,
    /// each drawn `render_offset` up and left from its position.
    ///
    /// ### Panics
    ///
    /// If `zone` doesn't have room for `capacity` positions.
    #[track_caller]
    pub fn new_in(
        zone: &'a LinearAllocator,
        sheet: SpriteSheet,
        capacity: usize,
        size: Size,
        render_offset: Position,
    ) -> SpriteBatch<'a> {
        SpriteBatch {
            sheet,
            positions: FixedVec::new(zone, capacity),
            size,
            render_offset,
        }
    }

    /// Adds a sprite at `position`. Returns the position back if the batch
    /// is full.
    pub fn push(&mut self, position: Position) -> Result<(), Position> {
        self.positions.push(position)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// The positions of the sprites, for moving them around between draws.
    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    /// Removes all the sprites.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Draws every sprite overlapping `camera` using `frame` of the sheet.
    pub fn draw(&self, platform: &dyn Platform, frame: u32, camera: Rect) {
        profiling::function_scope!();
        let Some(mode) = sheet_render_mode(&self.sheet) else {
            return;
        };

        let mut visible = (self.positions.iter())
            .filter(|pos| Rect::new(**pos, self.size).intersects(&camera))
            .peekable();
        if visible.peek().is_none() {
            return;
        }

        platform.set_render_mode(self.sheet.texture, mode);
        let Some(region) = RegionBinder::new(platform, &self.sheet).bind(frame) else {
            return;
        };
        for &position in visible {
            draw_region(platform, region, position - self.render_offset, self.size);
        }
    }
}
