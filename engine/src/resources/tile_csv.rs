// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use tilekit_platform::Platform;
use tracing::debug;

use super::OpenFile;

/// The stored id of cells without a tile.
pub const EMPTY_TILE: i16 = -1;

/// How many bytes of a tile CSV file are read from the platform at a time.
pub const CSV_READ_CHUNK_SIZE: usize = 256;

/// Where the tile ids of a map are read from.
///
/// The contents are integers separated by commas and newlines, one per cell
/// in row-major order. The ids in the file are 1-based, with 0 meaning "no
/// tile", and they're stored 0-based with [`EMPTY_TILE`] for empty cells.
#[derive(Clone, Copy)]
pub enum TileSource<'s> {
    /// CSV contents that are already in memory.
    Csv(&'s [u8]),
    /// A CSV file, streamed through the platform.
    File {
        platform: &'s dyn Platform,
        path: &'s str,
    },
}

impl TileSource<'_> {
    /// Parses the source and calls `f` with the cell index and stored tile id
    /// of each token, up to `cells` tokens. Cells past the last token are not
    /// visited, so the caller should initialize them to [`EMPTY_TILE`].
    ///
    /// Returns None if the file could not be read. Malformed contents are not
    /// an error, see [`TileSource`] for how tokens are interpreted.
    pub fn for_each_tile(&self, cells: usize, mut f: impl FnMut(usize, i16)) -> Option<()> {
        let mut parser = CellParser::default();
        let mut index = 0;
        let mut emit = |id: i16| {
            if index < cells {
                f(index, id);
                index += 1;
            }
        };

        match *self {
            TileSource::Csv(bytes) => {
                for &byte in bytes {
                    parser.feed(byte, &mut emit);
                }
            }

            TileSource::File { platform, path } => {
                let file = OpenFile::open(platform, path)?;
                let mut chunk = [0u8; CSV_READ_CHUNK_SIZE];
                let mut offset = 0;
                loop {
                    let read = file.read_at(offset, &mut chunk)?;
                    if read == 0 {
                        break;
                    }
                    for &byte in &chunk[..read] {
                        parser.feed(byte, &mut emit);
                    }
                    offset += read as u64;
                }
                debug!("Read {offset} bytes of tile data from {path}.");
            }
        }

        parser.finish(&mut emit);
        Some(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum TokenPhase {
    /// Skipping blanks before the number.
    #[default]
    Leading,
    /// Reading digits, after an optional sign.
    Digits,
    /// Past the number, the rest of the token is ignored.
    Trailing,
}

/// Splits bytes into tokens at delimiters and parses each token like C's
/// `atoi`: leading blanks, an optional sign, then digits up to the first
/// non-digit. A token without digits is 0. Keeps its state between calls, so
/// a token split over two reads parses as one.
#[derive(Debug, Default)]
struct CellParser {
    in_token: bool,
    phase: TokenPhase,
    negative: bool,
    magnitude: i64,
}

impl CellParser {
    fn feed(&mut self, byte: u8, emit: &mut impl FnMut(i16)) {
        if matches!(byte, b',' | b'\n' | b'\r') {
            self.finish(emit);
            return;
        }

        self.in_token = true;
        match self.phase {
            TokenPhase::Leading => match byte {
                b' ' | b'\t' | 0x0B | 0x0C => {}
                b'-' | b'+' => {
                    self.negative = byte == b'-';
                    self.phase = TokenPhase::Digits;
                }
                b'0'..=b'9' => {
                    self.push_digit(byte);
                    self.phase = TokenPhase::Digits;
                }
                _ => self.phase = TokenPhase::Trailing,
            },
            TokenPhase::Digits => match byte {
                b'0'..=b'9' => self.push_digit(byte),
                _ => self.phase = TokenPhase::Trailing,
            },
            TokenPhase::Trailing => {}
        }
    }

    /// Ends the current token, if any.
    fn finish(&mut self, emit: &mut impl FnMut(i16)) {
        if self.in_token {
            let value = if self.negative {
                -self.magnitude
            } else {
                self.magnitude
            };
            emit(stored_tile_id(value));
        }
        *self = CellParser::default();
    }

    fn push_digit(&mut self, digit: u8) {
        // Anything this big saturates to i16::MAX later anyway.
        const CAP: i64 = 1 << 32;
        self.magnitude = (self.magnitude * 10 + (digit - b'0') as i64).min(CAP);
    }
}

fn stored_tile_id(value_in_file: i64) -> i16 {
    let id = value_in_file - 1;
    if id < 0 {
        EMPTY_TILE
    } else {
        id.min(i16::MAX as i64) as i16
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::test_platform::TestPlatform;

    use super::{TileSource, CSV_READ_CHUNK_SIZE, EMPTY_TILE};

    fn parse(source: TileSource, cells: usize) -> Option<Vec<i16>> {
        let mut tiles = alloc::vec![EMPTY_TILE; cells];
        source.for_each_tile(cells, |i, id| tiles[i] = id)?;
        Some(tiles)
    }

    #[test]
    fn ids_are_stored_zero_based() {
        let tiles = parse(TileSource::Csv(b"1,1,2,0\n3,0,0,4\n"), 8).unwrap();
        assert_eq!(&[0, 0, 1, -1, 2, -1, -1, 3], &*tiles);
    }

    #[test]
    fn tokens_are_parsed_like_atoi() {
        let csv = b" 5,+3,-2,abc,7x,,\r\n\r\n40000,  ,";
        let tiles = parse(TileSource::Csv(csv), 8).unwrap();
        assert_eq!(&[4, 2, -1, -1, 6, i16::MAX, -1, -1], &*tiles);
    }

    #[test]
    fn short_and_long_inputs() {
        let short = parse(TileSource::Csv(b"2,2"), 4).unwrap();
        assert_eq!(&[1, 1, EMPTY_TILE, EMPTY_TILE], &*short);

        let long = parse(TileSource::Csv(b"1,2,3,4,5,6"), 3).unwrap();
        assert_eq!(&[0, 1, 2], &*long);
    }

    #[test]
    fn tokens_split_across_reads_parse_the_same() {
        let platform = TestPlatform::new();
        let mut csv = Vec::new();
        for i in 0..200u32 {
            csv.extend_from_slice(alloc::format!("{},", 1000 + i).as_bytes());
        }
        assert!(csv.len() > CSV_READ_CHUNK_SIZE);
        platform.add_file("map.csv", &csv);
        platform.set_max_read_length(Some(7));

        let from_file = TileSource::File {
            platform: &platform,
            path: "map.csv",
        };
        let streamed = parse(from_file, 200).unwrap();
        let in_memory = parse(TileSource::Csv(&csv), 200).unwrap();
        assert_eq!(in_memory, streamed);
        assert_eq!(999, streamed[0]);
        assert_eq!(1198, streamed[199]);
    }

    #[test]
    fn missing_files_are_reported() {
        let platform = TestPlatform::new();
        let source = TileSource::File {
            platform: &platform,
            path: "nope.csv",
        };
        assert_eq!(None, parse(source, 4));
    }
}
