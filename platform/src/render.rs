// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};

/// The size of the rasterizer's fast texture memory, in bytes. Texture regions
/// are bound into this memory before drawing, so a region larger than this
/// can't be drawn at all.
pub const TEXTURE_MEMORY_SIZE: usize = 4096;

/// Platform-specific texture reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextureRef(u64);

impl TextureRef {
    /// Creates a new [`TextureRef`]. Should only be created in the platform
    /// implementation, which also knows how the inner value is going to be
    /// used.
    pub fn new(id: u64) -> TextureRef {
        TextureRef(id)
    }

    /// Returns the inner value passed into [`TextureRef::new`]. Generally only
    /// relevant to the platform implementation.
    pub fn inner(self) -> u64 {
        self.0
    }
}

/// Descriptions of pixel data layouts of textures, as stored by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 5-5-5-1 bit RGBA colors.
    Rgba16,
    /// 8-bit per channel RGBA colors.
    Rgba32,
    /// 4-bit indices into a 16 color palette.
    Ci4,
    /// 8-bit indices into a 256 color palette.
    Ci8,
    /// 3-bit intensity with a 1-bit alpha.
    Ia4,
    /// 4-bit intensity with a 4-bit alpha.
    Ia8,
    /// 8-bit intensity with an 8-bit alpha.
    Ia16,
    /// 4-bit intensity.
    I4,
    /// 8-bit intensity.
    I8,
    /// Packed YUV. Known to the hardware, but not drawable by the engine.
    Yuv16,
    /// Anything the platform couldn't identify.
    Unknown,
}

impl PixelFormat {
    /// Returns the amount of bits each pixel takes up in texture memory, or
    /// None if the layout is not known.
    pub const fn bits_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Ci4 | PixelFormat::Ia4 | PixelFormat::I4 => Some(4),
            PixelFormat::Ci8 | PixelFormat::Ia8 | PixelFormat::I8 => Some(8),
            PixelFormat::Rgba16 | PixelFormat::Ia16 | PixelFormat::Yuv16 => Some(16),
            PixelFormat::Rgba32 => Some(32),
            PixelFormat::Unknown => None,
        }
    }

    /// Returns true for the formats which are indices into a palette.
    pub const fn is_palettized(self) -> bool {
        matches!(self, PixelFormat::Ci4 | PixelFormat::Ci8)
    }

    /// Returns the amount of texture memory available for pixel data of this
    /// format. Palettized formats get half of [`TEXTURE_MEMORY_SIZE`], the
    /// palette lives in the upper half.
    pub const fn texture_memory_budget(self) -> usize {
        if self.is_palettized() {
            TEXTURE_MEMORY_SIZE / 2
        } else {
            TEXTURE_MEMORY_SIZE
        }
    }
}

/// Rasterizer configurations the engine picks between, based on the pixel
/// format of the texture being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Texels are copied straight into the framebuffer. Fastest, but not
    /// available for every format.
    Copy {
        /// The palette to look colors up from, for palettized textures.
        palette: Option<Palette>,
    },
    /// The full pipeline, for formats that copy mode can't handle.
    Standard {
        /// If true, pixels with zero alpha are discarded.
        alpha_compare: bool,
    },
}

/// Sizes of color lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// 16 RGBA16 colors, for [`PixelFormat::Ci4`].
    Colors16,
    /// 256 RGBA16 colors, for [`PixelFormat::Ci8`].
    Colors256,
}

/// A rectangular region of a texture, in texels. `x1` and `y1` are exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct AtlasRegion {
    /// The left edge of the region.
    pub x0: u16,
    /// The top edge of the region.
    pub y0: u16,
    /// The right edge of the region, exclusive.
    pub x1: u16,
    /// The bottom edge of the region, exclusive.
    pub y1: u16,
}

impl AtlasRegion {
    /// The width of the region in texels.
    pub const fn width(&self) -> u16 {
        self.x1.saturating_sub(self.x0)
    }

    /// The height of the region in texels.
    pub const fn height(&self) -> u16 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Parameters for drawing one rectangle with the currently bound texture
/// region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TexturedRect {
    /// The horizontal screen coordinate of the top-left corner.
    pub x0: f32,
    /// The vertical screen coordinate of the top-left corner.
    pub y0: f32,
    /// The horizontal screen coordinate of the bottom-right corner.
    pub x1: f32,
    /// The vertical screen coordinate of the bottom-right corner.
    pub y1: f32,
    /// The horizontal texture coordinate (in texels) sampled at the top-left
    /// corner.
    pub s: u16,
    /// The vertical texture coordinate (in texels) sampled at the top-left
    /// corner.
    pub t: u16,
}
