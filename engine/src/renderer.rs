// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drawing through the platform's rasterizer.
//!
//! The rasterizer draws textured rectangles from a small texture memory, which
//! is filled by binding one region of a texture at a time. Binding is the
//! expensive part, so the renderers here are structured around binding as
//! rarely as possible: tile maps bind once per run of identical tiles, sprite
//! batches once per batch.

mod animated_sprite;
mod sprite_batch;
mod tile_map;
mod tile_map_cached;

use tilekit_platform::{AtlasRegion, Palette, PixelFormat, Platform, RenderMode, TexturedRect};
use tracing::warn;

use crate::{
    geom::{Position, Size},
    resources::SpriteSheet,
};

pub use animated_sprite::AnimatedSprite;
pub use sprite_batch::SpriteBatch;
pub use tile_map::TileMap;
pub use tile_map_cached::{TileCoord, TileMapCached, CACHED_TILE_IDS};

/// Returns the rasterizer configuration used to draw textures of the given
/// format, or None if the engine can't draw the format.
///
/// 4-bit intensity formats (other than color-indexed ones) can't be drawn in
/// copy mode, so they go through the standard pipeline.
pub fn render_mode(format: PixelFormat) -> Option<RenderMode> {
    match format {
        PixelFormat::I4 | PixelFormat::I8 => Some(RenderMode::Standard {
            alpha_compare: false,
        }),
        PixelFormat::Ia4 => Some(RenderMode::Standard {
            alpha_compare: true,
        }),
        PixelFormat::Ci4 => Some(RenderMode::Copy {
            palette: Some(Palette::Colors16),
        }),
        PixelFormat::Ci8 => Some(RenderMode::Copy {
            palette: Some(Palette::Colors256),
        }),
        PixelFormat::Ia8 | PixelFormat::Ia16 | PixelFormat::Rgba16 | PixelFormat::Rgba32 => {
            Some(RenderMode::Copy { palette: None })
        }
        PixelFormat::Yuv16 | PixelFormat::Unknown => None,
    }
}

/// [`render_mode`] for the sheet's format, logging a warning if the format
/// isn't drawable.
fn sheet_render_mode(sheet: &SpriteSheet) -> Option<RenderMode> {
    let mode = render_mode(sheet.format);
    if mode.is_none() {
        warn!(
            "Skipping a draw from a sprite sheet with an unsupported pixel format: {:?}",
            sheet.format,
        );
    }
    mode
}

/// Binds frames of a sprite sheet, skipping the bind if the frame is already
/// in texture memory.
///
/// Create one per render call: the binder assumes nothing else binds texture
/// regions while it's alive.
struct RegionBinder<'a> {
    platform: &'a dyn Platform,
    sheet: &'a SpriteSheet,
    bound: Option<(u32, AtlasRegion)>,
}

impl<'a> RegionBinder<'a> {
    fn new(platform: &'a dyn Platform, sheet: &'a SpriteSheet) -> RegionBinder<'a> {
        RegionBinder {
            platform,
            sheet,
            bound: None,
        }
    }

    /// Makes sure `frame` is the bound region, and returns the region. Returns
    /// None without binding anything if the sheet doesn't have the frame, or
    /// if it doesn't fit in texture memory.
    fn bind(&mut self, frame: u32) -> Option<AtlasRegion> {
        if let Some((bound_frame, region)) = self.bound {
            if bound_frame == frame {
                return Some(region);
            }
        }

        let region = self.sheet.frame_region(frame)?;
        if !self.sheet.fits_texture_memory(region) {
            return None;
        }
        self.platform
            .bind_texture_region(self.sheet.texture, region);
        self.bound = Some((frame, region));
        Some(region)
    }
}

/// Draws the bound `region` as a rectangle with the top-left corner at
/// `position`.
fn draw_region(platform: &dyn Platform, region: AtlasRegion, position: Position, size: Size) {
    platform.draw_textured_rectangle(TexturedRect {
        x0: position.x,
        y0: position.y,
        x1: position.x + size.width,
        y1: position.y + size.height,
        s: region.x0,
        t: region.y0,
    });
}

#[cfg(test)]
mod tests {
    use tilekit_platform::{
        AtlasRegion, Palette, PixelFormat, RenderMode, TextureRef, TEXTURE_MEMORY_SIZE,
    };

    use crate::{resources::SpriteSheet, test_platform::TestPlatform};

    use super::{render_mode, RegionBinder};

    #[test]
    fn render_modes_per_format() {
        use PixelFormat::*;
        let standard = |alpha_compare| Some(RenderMode::Standard { alpha_compare });
        let copy = |palette| Some(RenderMode::Copy { palette });

        assert_eq!(standard(false), render_mode(I4));
        assert_eq!(standard(false), render_mode(I8));
        assert_eq!(standard(true), render_mode(Ia4));
        assert_eq!(copy(Some(Palette::Colors16)), render_mode(Ci4));
        assert_eq!(copy(Some(Palette::Colors256)), render_mode(Ci8));
        for format in [Ia8, Ia16, Rgba16, Rgba32] {
            assert_eq!(copy(None), render_mode(format));
        }
        assert_eq!(None, render_mode(Yuv16));
        assert_eq!(None, render_mode(Unknown));
    }

    #[test]
    fn binder_skips_rebinding_the_same_frame() {
        let platform = TestPlatform::new();
        let sheet = SpriteSheet {
            texture: TextureRef::new(1),
            width: 32,
            height: 16,
            horizontal_slices: 2,
            vertical_slices: 1,
            format: PixelFormat::Rgba16,
        };
        let mut binder = RegionBinder::new(&platform, &sheet);

        for frame in [0, 0, 1, 1, 1, 0, 5, 0] {
            binder.bind(frame);
        }

        let left = AtlasRegion {
            x0: 0,
            y0: 0,
            x1: 16,
            y1: 16,
        };
        let right = AtlasRegion {
            x0: 16,
            y0: 0,
            x1: 32,
            y1: 16,
        };
        assert_eq!(&[left, right, left], &*platform.binds());
    }

    #[test]
    fn binder_refuses_regions_larger_than_texture_memory() {
        let platform = TestPlatform::new();
        let side = 64;
        // 64 * 64 * 2 bytes is double the texture memory.
        assert!(side * side * 2 > TEXTURE_MEMORY_SIZE);
        let sheet = SpriteSheet {
            texture: TextureRef::new(1),
            width: side as u16,
            height: side as u16,
            horizontal_slices: 1,
            vertical_slices: 1,
            format: PixelFormat::Rgba16,
        };
        let mut binder = RegionBinder::new(&platform, &sheet);
        assert_eq!(None, binder.bind(0));
        assert!(platform.rasterizer_calls().is_empty());
    }
}
