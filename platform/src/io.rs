// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

/// Platform-specific file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(u64);

impl FileHandle {
    /// Creates a new [`FileHandle`]. Should only be created in the platform
    /// implementation, which also knows how the inner value is going to be
    /// used.
    pub fn new(id: u64) -> FileHandle {
        FileHandle(id)
    }

    /// Returns the inner value passed into [`FileHandle::new`]. Generally only
    /// relevant to the platform implementation.
    pub fn inner(self) -> u64 {
        self.0
    }
}
