// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::ffi::c_void;
use std::{
    alloc::{self, Layout},
    cell::RefCell,
    fs::File,
    io::{Read, Seek, SeekFrom},
    mem, ptr,
};

use serde::Serialize;
use tilekit_platform::{
    AtlasRegion, FileHandle, Platform, RenderMode, TextureRef, TexturedRect, AUDIO_CHANNELS,
};
use tracing::{debug, trace, warn};

const MALLOC_ALIGNMENT: usize = 16;

/// A platform call the rasterizer received.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RecordedCall {
    SetRenderMode {
        texture: u64,
        mode: String,
    },
    Bind {
        texture: u64,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    },
    Draw {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        s: u16,
        t: u16,
    },
}

/// A [`Platform`] reading files from disk and recording everything else:
/// rasterizer calls are kept in a list and audio buffers are appended into
/// one long recording. The audio device is always ready.
pub struct HostPlatform {
    files: RefCell<Vec<Option<File>>>,
    calls: RefCell<Vec<RecordedCall>>,
    audio: RefCell<Vec<[i16; AUDIO_CHANNELS]>>,
    audio_buffer_length: usize,
}

impl HostPlatform {
    pub fn new(audio_buffer_length: usize) -> HostPlatform {
        HostPlatform {
            files: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            audio: RefCell::new(Vec::new()),
            audio_buffer_length,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Takes the audio written so far, leaving the recording empty.
    pub fn take_audio(&self) -> Vec<[i16; AUDIO_CHANNELS]> {
        mem::take(&mut *self.audio.borrow_mut())
    }

    fn with_file<T>(&self, file: FileHandle, f: impl FnOnce(&mut File) -> Option<T>) -> Option<T> {
        let mut files = self.files.borrow_mut();
        let file = files.get_mut(file.inner() as usize)?.as_mut()?;
        f(file)
    }
}

impl Platform for HostPlatform {
    fn set_render_mode(&self, texture: TextureRef, mode: RenderMode) {
        (self.calls.borrow_mut()).push(RecordedCall::SetRenderMode {
            texture: texture.inner(),
            mode: format!("{mode:?}"),
        });
    }

    fn bind_texture_region(&self, texture: TextureRef, region: AtlasRegion) {
        let AtlasRegion { x0, y0, x1, y1 } = region;
        (self.calls.borrow_mut()).push(RecordedCall::Bind {
            texture: texture.inner(),
            x0,
            y0,
            x1,
            y1,
        });
    }

    fn draw_textured_rectangle(&self, rect: TexturedRect) {
        let TexturedRect {
            x0,
            y0,
            x1,
            y1,
            s,
            t,
        } = rect;
        (self.calls.borrow_mut()).push(RecordedCall::Draw {
            x0,
            y0,
            x1,
            y1,
            s,
            t,
        });
    }

    fn open_file(&self, path: &str) -> Option<FileHandle> {
        match File::open(path) {
            Ok(file) => {
                let mut files = self.files.borrow_mut();
                let handle = FileHandle::new(files.len() as u64);
                files.push(Some(file));
                debug!("Opened {path} as file #{}.", handle.inner());
                Some(handle)
            }
            Err(err) => {
                warn!("Failed to open {path}: {err}");
                None
            }
        }
    }

    fn file_size(&self, file: FileHandle) -> Option<u64> {
        self.with_file(file, |file| file.metadata().ok().map(|meta| meta.len()))
    }

    fn read_file(&self, file: FileHandle, first_byte: u64, buffer: &mut [u8]) -> Option<usize> {
        self.with_file(file, |file| {
            file.seek(SeekFrom::Start(first_byte)).ok()?;
            match file.read(buffer) {
                Ok(read) => Some(read),
                Err(err) => {
                    warn!("Failed to read {} bytes at {first_byte}: {err}", buffer.len());
                    None
                }
            }
        })
    }

    fn close_file(&self, file: FileHandle) {
        if let Some(slot) = self.files.borrow_mut().get_mut(file.inner() as usize) {
            *slot = None;
        }
    }

    fn audio_buffer_length(&self) -> usize {
        self.audio_buffer_length
    }

    fn audio_can_write(&self) -> bool {
        true
    }

    fn audio_write(&self, samples: &[[i16; AUDIO_CHANNELS]]) {
        trace!("Recorded {} audio frames.", samples.len());
        self.audio.borrow_mut().extend_from_slice(samples);
    }

    fn malloc(&self, size: usize) -> *mut c_void {
        let Ok(layout) = Layout::from_size_align(size, MALLOC_ALIGNMENT) else {
            return ptr::null_mut();
        };
        if layout.size() == 0 {
            return ptr::null_mut();
        }
        // Safety: the layout has a non-zero size.
        unsafe { alloc::alloc(layout) as *mut c_void }
    }

    unsafe fn free(&self, ptr: *mut c_void, size: usize) {
        if let Ok(layout) = Layout::from_size_align(size, MALLOC_ALIGNMENT) {
            // Safety: the caller guarantees ptr came from malloc with the same
            // size, and malloc used this same layout for it.
            unsafe { alloc::dealloc(ptr as *mut u8, layout) };
        }
    }
}
