// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asset data the toolkit loads: sprite sheet addressing, tile CSVs, and raw
//! PCM sounds. Everything is read synchronously through the platform, once,
//! when the component owning the data is created.

mod pcm_sound;
mod sprite_sheet;
mod tile_csv;

use tilekit_platform::{FileHandle, Platform};
use tracing::warn;

pub use pcm_sound::PcmSound;
pub use sprite_sheet::SpriteSheet;
pub use tile_csv::{TileSource, CSV_READ_CHUNK_SIZE, EMPTY_TILE};

/// A file opened through the platform, closed when dropped.
struct OpenFile<'p> {
    platform: &'p dyn Platform,
    handle: FileHandle,
    path: &'p str,
}

impl<'p> OpenFile<'p> {
    fn open(platform: &'p dyn Platform, path: &'p str) -> Option<OpenFile<'p>> {
        let Some(handle) = platform.open_file(path) else {
            warn!("Could not open file: {path}");
            return None;
        };
        Some(OpenFile {
            platform,
            handle,
            path,
        })
    }

    fn size(&self) -> Option<u64> {
        let size = self.platform.file_size(self.handle);
        if size.is_none() {
            warn!("Could not get the size of file: {}", self.path);
        }
        size
    }

    /// Reads from `first_byte` onwards into `buffer`, returning the amount of
    /// bytes read, which is 0 at the end of the file.
    fn read_at(&self, first_byte: u64, buffer: &mut [u8]) -> Option<usize> {
        let read = self.platform.read_file(self.handle, first_byte, buffer);
        if read.is_none() {
            warn!("Reading {} at offset {first_byte} failed.", self.path);
        }
        read
    }

    /// Reads until `buffer` is full or the file ends, returning the amount of
    /// bytes read.
    fn read_to_fill(&self, buffer: &mut [u8]) -> Option<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            let read = self.read_at(filled as u64, &mut buffer[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        Some(filled)
    }
}

impl Drop for OpenFile<'_> {
    fn drop(&mut self) {
        self.platform.close_file(self.handle);
    }
}
