// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tilekit::{
    geom::{GridSize, Position, Size},
    resources::SpriteSheet,
};
use tilekit_platform::{PixelFormat, TextureRef};

/// A tile map and the sprite sheet it's drawn with, as described in a JSON
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// The tile CSV file, relative to the config file.
    pub csv: PathBuf,
    /// Width and height in tiles.
    pub map_size: [u32; 2],
    /// Width and height of one tile in pixels.
    pub tile_size: [f32; 2],
    #[serde(default)]
    pub render_offset: [f32; 2],
    /// Load the map as a [`TileMapCached`](tilekit::renderer::TileMapCached).
    #[serde(default)]
    pub cached: bool,
    pub sheet: SheetConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetConfig {
    pub width: u16,
    pub height: u16,
    pub horizontal_slices: u16,
    pub vertical_slices: u16,
    pub format: FormatName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatName {
    Rgba16,
    Rgba32,
    Ci4,
    Ci8,
    Ia4,
    Ia8,
    Ia16,
    I4,
    I8,
    Yuv16,
}

impl From<FormatName> for PixelFormat {
    fn from(format: FormatName) -> PixelFormat {
        match format {
            FormatName::Rgba16 => PixelFormat::Rgba16,
            FormatName::Rgba32 => PixelFormat::Rgba32,
            FormatName::Ci4 => PixelFormat::Ci4,
            FormatName::Ci8 => PixelFormat::Ci8,
            FormatName::Ia4 => PixelFormat::Ia4,
            FormatName::Ia8 => PixelFormat::Ia8,
            FormatName::Ia16 => PixelFormat::Ia16,
            FormatName::I4 => PixelFormat::I4,
            FormatName::I8 => PixelFormat::I8,
            FormatName::Yuv16 => PixelFormat::Yuv16,
        }
    }
}

impl MapConfig {
    pub fn map_size(&self) -> GridSize {
        GridSize::new(self.map_size[0], self.map_size[1])
    }

    pub fn tile_size(&self) -> Size {
        Size::new(self.tile_size[0], self.tile_size[1])
    }

    pub fn render_offset(&self) -> Position {
        Position::new(self.render_offset[0], self.render_offset[1])
    }

    pub fn sprite_sheet(&self, texture: TextureRef) -> SpriteSheet {
        SpriteSheet {
            texture,
            width: self.sheet.width,
            height: self.sheet.height,
            horizontal_slices: self.sheet.horizontal_slices,
            vertical_slices: self.sheet.vertical_slices,
            format: self.sheet.format.into(),
        }
    }

    /// Resolves the CSV path against the directory of the config file.
    pub fn csv_path(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) => dir.join(&self.csv),
            None => self.csv.clone(),
        }
    }
}

pub fn read(path: &Path) -> anyhow::Result<MapConfig> {
    let config = fs::read_to_string(path).context("Failed to open the map config file")?;
    let config: MapConfig =
        serde_json::from_str(&config).context("Failed to parse the map config file")?;
    if config.map_size.contains(&0) {
        anyhow::bail!("The map config has an empty map_size: {:?}", config.map_size);
    }
    Ok(config)
}
