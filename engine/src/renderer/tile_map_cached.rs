// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! A tile map variant which groups the cells by tile id at load time, so that
//! each tile only needs to be bound once per frame. It has no culling beyond
//! checking whether the whole map is visible, so it's only a good fit for
//! maps that fit on the screen. [`TileMap`](super::TileMap) is the one to use
//! for everything else.

use core::array;

use alloc::vec;

use tilekit_platform::Platform;
use tracing::{debug, warn};

use crate::{
    allocators::LinearAllocator,
    collections::FixedVec,
    geom::{GridSize, Position, Rect, Size},
    resources::{SpriteSheet, TileSource, EMPTY_TILE},
};

use super::{draw_region, sheet_render_mode, RegionBinder};

/// The amount of distinct tile ids [`TileMapCached`] can draw. Cells with
/// larger ids are dropped when loading.
pub const CACHED_TILE_IDS: usize = 256;

/// A cell of a tile map.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

/// A read-only tile map stored as a list of cells per tile id.
pub struct TileMapCached<'a> {
    positions: [FixedVec<'a, TileCoord>; CACHED_TILE_IDS],
    map_size: GridSize,
    tile_size: Size,
    sheet: SpriteSheet,
    render_offset: Position,
}

impl<'a> TileMapCached<'a> {
    /// Loads the map and sorts its cells by tile id into lists allocated from
    /// `zone`, each exactly as long as needed. Returns None if the source is a
    /// file that can't be read.
    ///
    /// ### Panics
    ///
    /// If `zone` doesn't have room for the cell lists.
    #[track_caller]
    pub fn new_in(
        zone: &'a LinearAllocator,
        sheet: SpriteSheet,
        source: TileSource,
        map_size: GridSize,
        tile_size: Size,
    ) -> Option<TileMapCached<'a>> {
        let mut grid = vec![EMPTY_TILE; map_size.area()].into_boxed_slice();
        source.for_each_tile(grid.len(), |i, id| grid[i] = id)?;

        let mut counts = [0usize; CACHED_TILE_IDS];
        let mut dropped = 0;
        for &id in grid.iter().filter(|id| **id >= 0) {
            match counts.get_mut(id as usize) {
                Some(count) => *count += 1,
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!("Dropped {dropped} cells with tile ids past {CACHED_TILE_IDS}.");
        }

        let mut positions: [FixedVec<'a, TileCoord>; CACHED_TILE_IDS] =
            array::from_fn(|id| FixedVec::new(zone, counts[id]));
        for (i, &id) in grid.iter().enumerate() {
            if id < 0 {
                continue;
            }
            let Some(list) = positions.get_mut(id as usize) else {
                continue;
            };
            let coord = TileCoord {
                x: (i % map_size.width as usize) as u32,
                y: (i / map_size.width as usize) as u32,
            };
            // Each list was allocated to fit exactly the cells counted above.
            let Ok(()) = list.push(coord) else {
                unreachable!()
            };
        }

        debug!(
            "Cached a {}x{} tile map with {} distinct tiles.",
            map_size.width,
            map_size.height,
            counts.iter().filter(|count| **count > 0).count(),
        );

        Some(TileMapCached {
            positions,
            map_size,
            tile_size,
            sheet,
            render_offset: Position::default(),
        })
    }

    /// Moves the map's top-left corner to `offset`.
    pub fn set_render_offset(&mut self, offset: Position) {
        self.render_offset = offset;
    }

    /// Draws the whole map, if any of it overlaps `camera`. Each tile is bound
    /// once, followed by a draw for every cell it's in.
    ///
    /// The overlap check against the whole map is the only culling: there's
    /// no per-cell windowing, so a visible map always draws every cell.
    pub fn render(&self, platform: &dyn Platform, camera: Rect) {
        profiling::function_scope!();
        let Some(mode) = sheet_render_mode(&self.sheet) else {
            return;
        };
        if !camera.intersects(&self.bounds()) {
            return;
        }
        platform.set_render_mode(self.sheet.texture, mode);

        let mut binder = RegionBinder::new(platform, &self.sheet);
        for (id, coords) in self.positions.iter().enumerate() {
            if coords.is_empty() {
                continue;
            }
            let Some(region) = binder.bind(id as u32) else {
                continue;
            };
            for coord in coords.iter() {
                let position = Position::new(
                    self.render_offset.x + coord.x as f32 * self.tile_size.width,
                    self.render_offset.y + coord.y as f32 * self.tile_size.height,
                );
                draw_region(platform, region, position, self.tile_size);
            }
        }
    }

    /// The cells that have the tile `id`, in row-major order.
    pub fn positions(&self, id: u8) -> &[TileCoord] {
        &self.positions[id as usize]
    }

    pub fn count(&self, id: u8) -> usize {
        self.positions[id as usize].len()
    }

    /// The amount of non-empty cells in the map.
    pub fn total_count(&self) -> usize {
        self.positions.iter().map(|coords| coords.len()).sum()
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

    /// The area the map covers.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.render_offset,
            Size::new(
                self.map_size.width as f32 * self.tile_size.width,
                self.map_size.height as f32 * self.tile_size.height,
            ),
        )
    }

    pub fn sheet(&self) -> &SpriteSheet {
        &self.sheet
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};
    use core::fmt::Write;

    use tilekit_platform::{AtlasRegion, PixelFormat, TextureRef};

    use crate::{
        allocators::LinearAllocator,
        geom::{GridSize, Position, Rect, Size},
        resources::{SpriteSheet, TileSource},
        test_platform::TestPlatform,
    };

    use super::{TileCoord, TileMapCached};

    const MAP_CSV: &[u8] = b"1,1,2,0\n1,1,2,0\n3,3,0,0\n3,3,0,0\n";

    fn sheet(horizontal_slices: u16) -> SpriteSheet {
        SpriteSheet {
            texture: TextureRef::new(3),
            width: 16 * horizontal_slices,
            height: 16,
            horizontal_slices,
            vertical_slices: 1,
            format: PixelFormat::I8,
        }
    }

    #[test]
    fn cells_are_grouped_by_id() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 4096).unwrap();
        let map = TileMapCached::new_in(
            &zone,
            sheet(4),
            TileSource::Csv(MAP_CSV),
            GridSize::new(4, 4),
            Size::new(16.0, 16.0),
        )
        .unwrap();

        assert_eq!(4, map.count(0));
        assert_eq!(2, map.count(1));
        assert_eq!(4, map.count(2));
        assert_eq!(0, map.count(3));
        assert_eq!(10, map.total_count());
        assert_eq!(
            &[TileCoord { x: 2, y: 0 }, TileCoord { x: 2, y: 1 }],
            map.positions(1),
        );
    }

    #[test]
    fn renders_one_bind_per_tile() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 4096).unwrap();
        let mut map = TileMapCached::new_in(
            &zone,
            sheet(4),
            TileSource::Csv(MAP_CSV),
            GridSize::new(4, 4),
            Size::new(16.0, 16.0),
        )
        .unwrap();
        map.set_render_offset(Position::new(8.0, 0.0));

        map.render(&platform, Rect::xywh(0.0, 0.0, 320.0, 240.0));

        let binds = platform.binds();
        assert_eq!(3, binds.len());
        assert_eq!(
            AtlasRegion {
                x0: 32,
                y0: 0,
                x1: 48,
                y1: 16
            },
            binds[2],
        );
        let draws = platform.draws();
        assert_eq!(10, draws.len());
        // The first tile 1 cell, drawn right after the four tile 0 cells.
        assert_eq!((40.0, 0.0), (draws[4].x0, draws[4].y0));
    }

    #[test]
    fn invisible_maps_draw_nothing() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 4096).unwrap();
        let map = TileMapCached::new_in(
            &zone,
            sheet(4),
            TileSource::Csv(MAP_CSV),
            GridSize::new(4, 4),
            Size::new(16.0, 16.0),
        )
        .unwrap();

        map.render(&platform, Rect::xywh(64.0, 0.0, 320.0, 240.0));

        assert!(platform.rasterizer_calls().is_empty());
    }

    #[test]
    fn unsupported_formats_draw_nothing() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 4096).unwrap();
        let mut yuv_sheet = sheet(4);
        yuv_sheet.format = PixelFormat::Yuv16;
        let map = TileMapCached::new_in(
            &zone,
            yuv_sheet,
            TileSource::Csv(MAP_CSV),
            GridSize::new(4, 4),
            Size::new(16.0, 16.0),
        )
        .unwrap();

        map.render(&platform, Rect::xywh(0.0, 0.0, 320.0, 240.0));

        assert_eq!(10, map.total_count());
        assert!(platform.rasterizer_calls().is_empty());
    }

    #[test]
    fn ids_past_the_cache_are_dropped() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 4096).unwrap();
        let mut csv = String::new();
        for id in [1, 256, 257, 300, 0, 256] {
            write!(csv, "{id},").unwrap();
        }
        let map = TileMapCached::new_in(
            &zone,
            sheet(16),
            TileSource::Csv(csv.as_bytes()),
            GridSize::new(6, 1),
            Size::new(8.0, 8.0),
        )
        .unwrap();

        assert_eq!(1, map.count(0));
        assert_eq!(2, map.count(255));
        assert_eq!(3, map.total_count());
        let cells: Vec<u32> = map.positions(255).iter().map(|coord| coord.x).collect();
        assert_eq!(&[1, 5], &*cells);
    }
}
