// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! This crate mainly revolves around the [`Platform`] trait, which can be
//! implemented to provide a "platform implementation" for the toolkit: the
//! rasterizer, the file system, the audio device, and the memory the toolkit's
//! zones are carved out of.
//!
//! This is split off of the main engine crate so that the engine and the
//! platform implementation can be compiled independently, and so that a
//! platform implementation doesn't need to depend on the whole engine.

#![no_std]
#![warn(missing_docs)]

mod io;
mod render;

use core::ffi::c_void;

pub use io::*;
pub use render::*;

/// Sample rate for the audio data played back by the engine, unless the game
/// asks for another one when creating its mixer.
pub const AUDIO_SAMPLE_RATE: u32 = 32000;

/// The amount of channels of audio data played back by the engine.
pub const AUDIO_CHANNELS: usize = 2;

/// A trait for using platform-dependent features from the engine without
/// depending on any platform implementation directly.
///
/// All the functions have a `&self` parameter, so that the methods can access
/// some (possibly internally mutable) state, but still keeping the platform
/// object as widely usable as possible (a "platform" is about as global an
/// object as you get). This trait is object safe, and the engine only ever
/// uses it as `&dyn Platform`.
pub trait Platform {
    /// Configure the rasterizer for drawing from `texture` with the given
    /// mode. For palettized modes, this is also where the platform should load
    /// the texture's palette.
    fn set_render_mode(&self, texture: TextureRef, mode: RenderMode);

    /// Load the given region of the texture into texture memory, to be used by
    /// the following [`Platform::draw_textured_rectangle`] calls.
    ///
    /// This is assumed to be expensive relative to drawing, the engine calls
    /// this as rarely as it can.
    fn bind_texture_region(&self, texture: TextureRef, region: AtlasRegion);

    /// Draw a rectangle textured with the currently bound texture region.
    fn draw_textured_rectangle(&self, rect: TexturedRect);

    /// Open a file for reading. Returns None if the file can't be read.
    fn open_file(&self, path: &str) -> Option<FileHandle>;

    /// Returns the size of the file in bytes, or None if that can't be
    /// determined.
    fn file_size(&self, file: FileHandle) -> Option<u64>;

    /// Fill `buffer` from the `file` starting at offset `first_byte`, returning
    /// the amount of bytes written into the buffer. Reads past the end of the
    /// file return `Some(0)`, failures return None.
    fn read_file(&self, file: FileHandle, first_byte: u64, buffer: &mut [u8]) -> Option<usize>;

    /// Close a file opened with [`Platform::open_file`]. The handle must not
    /// be used after this.
    fn close_file(&self, file: FileHandle);

    /// The length of one audio buffer passed to [`Platform::audio_write`], in
    /// stereo frames.
    fn audio_buffer_length(&self) -> usize;

    /// Returns true if the audio device can take another buffer right now.
    /// Must not block.
    fn audio_can_write(&self) -> bool;

    /// Passes a buffer of audio samples to be played back. Each sample should
    /// be a tuple containing the left and right channels' audio samples for
    /// stereo playback, in that order.
    fn audio_write(&self, samples: &[[i16; AUDIO_CHANNELS]]);

    /// Allocate the given amount of bytes (returning a null pointer on error).
    /// Not called often from the engine, memory is allocated in big zones, so
    /// this can be slow and defensively implemented. The pointer must be
    /// aligned to at least 16 bytes.
    fn malloc(&self, size: usize) -> *mut c_void;

    /// Free the memory allocated by [`Platform::malloc`].
    ///
    /// ### Safety
    ///
    /// - `ptr` must have been returned by [`Platform::malloc`] with the same
    ///   `size`, and not freed already.
    /// - Since the implementation is free to free the memory, the memory
    ///   pointed at by the given pointer shouldn't be accessed after calling
    ///   this.
    unsafe fn free(&self, ptr: *mut c_void, size: usize);
}
