// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! A small 2D toolkit for a fixed-function console: memory zones, tile maps
//! with viewport culling, sprite batches and animations, tweens and timers,
//! and a software PCM mixer. Everything platform-specific goes through
//! [`tilekit_platform::Platform`].

#![no_std]

extern crate alloc;

pub mod allocators;
pub mod clock;
pub mod collections;
pub mod geom;
pub mod mixer;
pub mod renderer;
pub mod resources;
pub mod tween;

#[cfg(test)]
mod test_platform;
