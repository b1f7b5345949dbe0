// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{ops::RangeInclusive, time::Duration};

use tilekit_platform::Platform;

use crate::{
    geom::{Position, Rect, Size},
    resources::SpriteSheet,
};

use super::{draw_region, sheet_render_mode, RegionBinder};

/// A sprite cycling through a range of frames of a sprite sheet.
#[derive(Debug, Clone)]
pub struct AnimatedSprite {
    sheet: SpriteSheet,
    size: Size,
    render_offset: Position,
    first_frame: u32,
    frame_count: u32,
    frame_duration: Duration,
    /// Milliseconds into the current loop of the animation.
    elapsed_ms: f64,
    current_frame: u32,
}

impl AnimatedSprite {
    /// Creates an animation playing `frames` of the sheet, each shown for
    /// `frame_duration`. `size` is used for culling, `render_offset` is
    /// subtracted from the position when drawing.
    ///
    /// ### Panics
    ///
    /// If `frames` is empty.
    #[track_caller]
    pub fn new(
        sheet: SpriteSheet,
        size: Size,
        render_offset: Position,
        frames: RangeInclusive<u32>,
        frame_duration: Duration,
    ) -> AnimatedSprite {
        let (first_frame, last_frame) = frames.into_inner();
        assert!(
            first_frame <= last_frame,
            "animations need at least one frame, got {first_frame}..={last_frame}",
        );
        AnimatedSprite {
            sheet,
            size,
            render_offset,
            first_frame,
            frame_count: last_frame - first_frame + 1,
            frame_duration,
            elapsed_ms: 0.0,
            current_frame: first_frame,
        }
    }

    /// Advances the animation by `elapsed` time scaled by `rate`, e.g. 2.0
    /// plays twice as fast.
    pub fn tick(&mut self, elapsed: Duration, rate: f32) {
        let frame_ms = self.frame_duration.as_secs_f64() * 1000.0;
        if frame_ms <= 0.0 {
            return;
        }
        let loop_ms = frame_ms * self.frame_count as f64;
        let advanced_ms = self.elapsed_ms + elapsed.as_secs_f64() * 1000.0 * rate as f64;
        self.elapsed_ms = advanced_ms % loop_ms;
        if self.elapsed_ms < 0.0 {
            self.elapsed_ms += loop_ms;
        }
        let frame_offset = (self.elapsed_ms / frame_ms) as u32 % self.frame_count;
        self.current_frame = self.first_frame + frame_offset;
    }

    /// The frame of the sheet that gets drawn.
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Draws the current frame at `position`, if it overlaps `camera`.
    pub fn draw(&self, platform: &dyn Platform, position: Position, camera: Rect) {
        let Some(mode) = sheet_render_mode(&self.sheet) else {
            return;
        };
        if !Rect::new(position, self.size).intersects(&camera) {
            return;
        }
        platform.set_render_mode(self.sheet.texture, mode);

        let Some(region) = RegionBinder::new(platform, &self.sheet).bind(self.current_frame) else {
            return;
        };
        let frame_size = Size::new(region.width() as f32, region.height() as f32);
        draw_region(platform, region, position - self.render_offset, frame_size);
    }
}
