// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    cell::{Cell, RefCell},
    ffi::c_void,
    ptr,
};

use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec::Vec,
};
use tilekit_platform::{
    AtlasRegion, FileHandle, Platform, RenderMode, TextureRef, TexturedRect, AUDIO_CHANNELS,
};

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct VeryAlignedThing([u8; 64]);
const VERY_ALIGNED_THING: VeryAlignedThing = VeryAlignedThing([0; 64]);

/// Every rasterizer call made through [`TestPlatform`], in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterizerCall {
    SetRenderMode(TextureRef, RenderMode),
    Bind(TextureRef, AtlasRegion),
    Draw(TexturedRect),
}

/// A [`Platform`] for tests: records rasterizer calls, serves files from
/// memory, and collects written audio buffers.
pub struct TestPlatform {
    rasterizer_calls: RefCell<Vec<RasterizerCall>>,
    files: RefCell<Vec<(String, Vec<u8>)>>,
    /// If set, reads return at most this many bytes at a time.
    max_read_length: Cell<Option<usize>>,
    audio_ready: Cell<bool>,
    audio_buffer_length: Cell<usize>,
    written_audio: RefCell<Vec<Vec<[i16; AUDIO_CHANNELS]>>>,
    allocations: RefCell<Vec<usize>>,
}

impl TestPlatform {
    pub fn new() -> TestPlatform {
        TestPlatform {
            rasterizer_calls: RefCell::new(Vec::new()),
            files: RefCell::new(Vec::new()),
            max_read_length: Cell::new(None),
            audio_ready: Cell::new(true),
            audio_buffer_length: Cell::new(8),
            written_audio: RefCell::new(Vec::new()),
            allocations: RefCell::new(Vec::new()),
        }
    }

    pub fn add_file(&self, path: &str, contents: &[u8]) {
        self.files
            .borrow_mut()
            .push((path.to_string(), contents.to_vec()));
    }

    pub fn set_max_read_length(&self, max_read_length: Option<usize>) {
        self.max_read_length.set(max_read_length);
    }

    pub fn set_audio_ready(&self, ready: bool) {
        self.audio_ready.set(ready);
    }

    pub fn set_audio_buffer_length(&self, frames: usize) {
        self.audio_buffer_length.set(frames);
    }

    pub fn rasterizer_calls(&self) -> Vec<RasterizerCall> {
        self.rasterizer_calls.borrow().clone()
    }

    pub fn clear_rasterizer_calls(&self) {
        self.rasterizer_calls.borrow_mut().clear();
    }

    pub fn binds(&self) -> Vec<AtlasRegion> {
        (self.rasterizer_calls.borrow().iter())
            .filter_map(|call| match call {
                RasterizerCall::Bind(_, region) => Some(*region),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<TexturedRect> {
        (self.rasterizer_calls.borrow().iter())
            .filter_map(|call| match call {
                RasterizerCall::Draw(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn written_audio(&self) -> Vec<Vec<[i16; AUDIO_CHANNELS]>> {
        self.written_audio.borrow().clone()
    }

    /// Returns the address returned by the `index`th call to `malloc`.
    pub fn allocation_address(&self, index: usize) -> usize {
        self.allocations.borrow()[index]
    }
}

impl Platform for TestPlatform {
    fn set_render_mode(&self, texture: TextureRef, mode: RenderMode) {
        (self.rasterizer_calls.borrow_mut()).push(RasterizerCall::SetRenderMode(texture, mode));
    }

    fn bind_texture_region(&self, texture: TextureRef, region: AtlasRegion) {
        (self.rasterizer_calls.borrow_mut()).push(RasterizerCall::Bind(texture, region));
    }

    fn draw_textured_rectangle(&self, rect: TexturedRect) {
        (self.rasterizer_calls.borrow_mut()).push(RasterizerCall::Draw(rect));
    }

    fn open_file(&self, path: &str) -> Option<FileHandle> {
        let files = self.files.borrow();
        let index = files.iter().position(|(file_path, _)| file_path == path)?;
        Some(FileHandle::new(index as u64))
    }

    fn file_size(&self, file: FileHandle) -> Option<u64> {
        let files = self.files.borrow();
        let (_, contents) = files.get(file.inner() as usize)?;
        Some(contents.len() as u64)
    }

    fn read_file(&self, file: FileHandle, first_byte: u64, buffer: &mut [u8]) -> Option<usize> {
        let files = self.files.borrow();
        let (_, contents) = files.get(file.inner() as usize)?;
        let start = (first_byte as usize).min(contents.len());
        let mut len = buffer.len().min(contents.len() - start);
        if let Some(max_len) = self.max_read_length.get() {
            len = len.min(max_len);
        }
        buffer[..len].copy_from_slice(&contents[start..start + len]);
        Some(len)
    }

    fn close_file(&self, _file: FileHandle) {}

    fn audio_buffer_length(&self) -> usize {
        self.audio_buffer_length.get()
    }

    fn audio_can_write(&self) -> bool {
        self.audio_ready.get()
    }

    fn audio_write(&self, samples: &[[i16; AUDIO_CHANNELS]]) {
        self.written_audio.borrow_mut().push(samples.to_vec());
    }

    fn malloc(&self, size: usize) -> *mut c_void {
        let count = size.div_ceil(size_of::<VeryAlignedThing>());
        let boxed: Box<[VeryAlignedThing]> = alloc::vec![VERY_ALIGNED_THING; count].into_boxed_slice();
        let ptr = Box::into_raw(boxed) as *mut VeryAlignedThing as *mut c_void;
        self.allocations.borrow_mut().push(ptr as usize);
        ptr
    }

    unsafe fn free(&self, ptr: *mut c_void, size: usize) {
        let count = size.div_ceil(size_of::<VeryAlignedThing>());
        let slice_ptr = ptr::slice_from_raw_parts_mut(ptr as *mut VeryAlignedThing, count);
        // Safety: the pointer was created from a boxed slice of the same
        // length in `malloc` (the caller guarantees `size` matches), and
        // hasn't been freed yet.
        drop(unsafe { Box::from_raw(slice_ptr) });
    }
}
