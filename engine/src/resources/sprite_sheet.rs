// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use tilekit_platform::{AtlasRegion, PixelFormat, TextureRef};

/// A texture sliced into a grid of equally sized frames, addressed
/// row-major from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    /// The texture the frames are drawn from.
    pub texture: TextureRef,
    /// The width of the whole texture in texels.
    pub width: u16,
    /// The height of the whole texture in texels.
    pub height: u16,
    /// The amount of frames on each row.
    pub horizontal_slices: u16,
    /// The amount of rows of frames.
    pub vertical_slices: u16,
    /// The pixel format of the texture, which decides how it can be drawn.
    pub format: PixelFormat,
}

impl SpriteSheet {
    /// The width of one frame in texels.
    pub fn frame_width(&self) -> u16 {
        self.width.checked_div(self.horizontal_slices).unwrap_or(0)
    }

    /// The height of one frame in texels.
    pub fn frame_height(&self) -> u16 {
        self.height.checked_div(self.vertical_slices).unwrap_or(0)
    }

    /// The amount of frames in the sheet.
    pub fn frame_count(&self) -> u32 {
        self.horizontal_slices as u32 * self.vertical_slices as u32
    }

    /// Returns the region of the texture that contains `frame`, or None if
    /// the sheet doesn't have that many frames.
    pub fn frame_region(&self, frame: u32) -> Option<AtlasRegion> {
        if frame >= self.frame_count() {
            return None;
        }
        let (fw, fh) = (self.frame_width(), self.frame_height());
        let column = (frame % self.horizontal_slices as u32) as u16;
        let row = (frame / self.horizontal_slices as u32) as u16;
        let (x0, y0) = (column * fw, row * fh);
        Some(AtlasRegion {
            x0,
            y0,
            x1: x0 + fw,
            y1: y0 + fh,
        })
    }

    /// Returns true if `region` of this sheet fits in the rasterizer's
    /// texture memory. Formats with an unknown size never fit.
    pub fn fits_texture_memory(&self, region: AtlasRegion) -> bool {
        let Some(bits_per_pixel) = self.format.bits_per_pixel() else {
            return false;
        };
        let texels = region.width() as usize * region.height() as usize;
        (texels * bits_per_pixel).div_ceil(8) <= self.format.texture_memory_budget()
    }
}
