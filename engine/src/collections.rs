// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod pool;
mod vec;

pub use pool::{Pool, PoolHandle};
pub use vec::FixedVec;
