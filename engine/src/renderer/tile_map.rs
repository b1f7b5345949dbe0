// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use alloc::{boxed::Box, vec};

use tilekit_platform::Platform;

use crate::{
    allocators::LinearAllocator,
    collections::FixedVec,
    geom::{ceil_to_i32, floor_to_i32, GridSize, Position, Rect, Size},
    resources::{SpriteSheet, TileSource, EMPTY_TILE},
};

use super::{draw_region, sheet_render_mode, RegionBinder};

enum TileStorage<'a> {
    Zone(FixedVec<'a, i16>),
    Heap(Box<[i16]>),
}

impl TileStorage<'_> {
    fn as_slice(&self) -> &[i16] {
        match self {
            TileStorage::Zone(tiles) => tiles,
            TileStorage::Heap(tiles) => tiles,
        }
    }
}

/// A grid of tiles drawn from a sprite sheet, with only the tiles visible
/// through the camera being drawn.
///
/// Each cell holds a frame index into the sheet, or [`EMPTY_TILE`].
pub struct TileMap<'a> {
    tiles: TileStorage<'a>,
    map_size: GridSize,
    tile_size: Size,
    sheet: SpriteSheet,
    render_offset: Position,
    bounds: Rect,
}

impl<'a> TileMap<'a> {
    /// Creates a tile map with its tiles stored in `zone`. Returns None if the
    /// source is a file that can't be read.
    ///
    /// ### Panics
    ///
    /// If `zone` doesn't have room for `map_size.area()` tiles.
    #[track_caller]
    pub fn new_in(
        zone: &'a LinearAllocator,
        sheet: SpriteSheet,
        source: TileSource,
        map_size: GridSize,
        tile_size: Size,
    ) -> Option<TileMap<'a>> {
        let mut tiles = FixedVec::new(zone, map_size.area());
        tiles.fill_with(EMPTY_TILE);
        source.for_each_tile(tiles.len(), |i, id| tiles[i] = id)?;
        Some(TileMap::with_storage(
            TileStorage::Zone(tiles),
            sheet,
            map_size,
            tile_size,
        ))
    }
}

impl TileMap<'static> {
    /// Creates a tile map with its tiles stored on the heap, freed when the
    /// map is dropped. Returns None if the source is a file that can't be
    /// read.
    pub fn new_owned(
        sheet: SpriteSheet,
        source: TileSource,
        map_size: GridSize,
        tile_size: Size,
    ) -> Option<TileMap<'static>> {
        let mut tiles = vec![EMPTY_TILE; map_size.area()].into_boxed_slice();
        source.for_each_tile(tiles.len(), |i, id| tiles[i] = id)?;
        Some(TileMap::with_storage(
            TileStorage::Heap(tiles),
            sheet,
            map_size,
            tile_size,
        ))
    }
}

impl<'a> TileMap<'a> {
    fn with_storage(
        tiles: TileStorage<'a>,
        sheet: SpriteSheet,
        map_size: GridSize,
        tile_size: Size,
    ) -> TileMap<'a> {
        let render_offset = Position::default();
        TileMap {
            tiles,
            map_size,
            tile_size,
            sheet,
            render_offset,
            bounds: map_bounds(render_offset, map_size, tile_size),
        }
    }

    /// Moves the map's top-left corner to `offset` in world space.
    pub fn set_render_offset(&mut self, offset: Position) {
        self.render_offset = offset;
        self.bounds = map_bounds(offset, self.map_size, self.tile_size);
    }

    /// Draws the part of the map visible through `camera`, with the world
    /// scrolled by `view_position`.
    ///
    /// A point `p` in world space is drawn at `p - view_position` on the
    /// screen. Only the tiles overlapping the camera are drawn, and runs of
    /// the same tile are drawn with a single texture bind.
    pub fn render(&self, platform: &dyn Platform, camera: Rect, view_position: Position) {
        profiling::function_scope!();
        let Some(mode) = sheet_render_mode(&self.sheet) else {
            return;
        };

        let visible_bounds = self.bounds.offset(Position::default() - view_position);
        if !camera.intersects(&visible_bounds) {
            return;
        }
        platform.set_render_mode(self.sheet.texture, mode);

        let Size {
            width: tile_w,
            height: tile_h,
        } = self.tile_size;
        let (map_w, map_h) = (self.map_size.width as i32, self.map_size.height as i32);

        // The map-space point at the camera's top-left corner.
        let origin = camera.pos + view_position - self.render_offset;
        let x0 = floor_to_i32(origin.x / tile_w).clamp(0, map_w);
        let y0 = floor_to_i32(origin.y / tile_h).clamp(0, map_h);
        let x1 = ceil_to_i32((origin.x + camera.size.width) / tile_w).clamp(0, map_w);
        let y1 = ceil_to_i32((origin.y + camera.size.height) / tile_h).clamp(0, map_h);

        // How far into the first visible tile the camera has scrolled.
        let scroll = Position::new(origin.x - x0 as f32 * tile_w, origin.y - y0 as f32 * tile_h);

        let tiles = self.tiles.as_slice();
        let mut binder = RegionBinder::new(platform, &self.sheet);
        for y in y0..y1 {
            let row = y as usize * map_w as usize;
            for x in x0..x1 {
                let id = tiles[row + x as usize];
                if id < 0 {
                    continue;
                }
                let Some(region) = binder.bind(id as u32) else {
                    continue;
                };
                let position = Position::new(
                    camera.pos.x + (x - x0) as f32 * tile_w - scroll.x,
                    camera.pos.y + (y - y0) as f32 * tile_h - scroll.y,
                );
                draw_region(platform, region, position, self.tile_size);
            }
        }
    }

    /// Returns the tile at the given cell, or None if the cell is outside the
    /// map.
    pub fn tile(&self, x: u32, y: u32) -> Option<i16> {
        if x >= self.map_size.width || y >= self.map_size.height {
            return None;
        }
        let index = y as usize * self.map_size.width as usize + x as usize;
        self.tiles.as_slice().get(index).copied()
    }

    /// All the tiles in row-major order.
    pub fn tiles(&self) -> &[i16] {
        self.tiles.as_slice()
    }

    pub fn map_size(&self) -> GridSize {
        self.map_size
    }

    pub fn tile_size(&self) -> Size {
        self.tile_size
    }

    pub fn render_offset(&self) -> Position {
        self.render_offset
    }

    /// The area the map covers in world space.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn sheet(&self) -> &SpriteSheet {
        &self.sheet
    }
}

fn map_bounds(render_offset: Position, map_size: GridSize, tile_size: Size) -> Rect {
    Rect::new(
        render_offset,
        Size::new(
            map_size.width as f32 * tile_size.width,
            map_size.height as f32 * tile_size.height,
        ),
    )
}
