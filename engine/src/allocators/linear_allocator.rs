// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    cell::Cell,
    ffi::c_void,
    fmt::Debug,
    marker::PhantomData,
    mem::MaybeUninit,
    slice,
};

use tilekit_platform::Platform;
use tracing::{error, trace};

/// A linear allocator (a "memory zone") with a constant capacity. Can allocate
/// memory regions with any size or alignment (within the capacity) very fast,
/// but individual allocations can't be freed, the whole zone is reclaimed at
/// once with [`LinearAllocator::reset`].
///
/// The allocation functions come in two flavors: `try_` functions return None
/// when the zone is full, and the rest treat a full zone as a sizing bug and
/// panic. Zones are meant to be sized up front for the scene they back.
///
/// NOTE: The allocation functions return mutable borrows to the allocated
/// values, and [`LinearAllocator::reset`] does not drop those values. Use
/// containers like [`FixedVec`](crate::collections::FixedVec) if the values
/// need to be dropped.
pub struct LinearAllocator<'a> {
    backing_mem_ptr: *mut c_void,
    backing_mem_size: usize,
    /// The platform where the memory was allocated from. If `None`, the
    /// backing memory is borrowed from a parent zone for `'a`.
    platform: Option<&'a dyn Platform>,
    /// The amount of bytes allocated starting from `backing_mem_ptr`. Never
    /// larger than `backing_mem_size`.
    allocated: Cell<usize>,
    _parent_memory: PhantomData<&'a mut [MaybeUninit<u8>]>,
}

impl Debug for LinearAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinearAllocator")
            .field("backing_mem_ptr", &self.backing_mem_ptr)
            .field("backing_mem_size", &self.backing_mem_size)
            .field("allocated", &self.allocated)
            .finish_non_exhaustive()
    }
}

impl Drop for LinearAllocator<'_> {
    fn drop(&mut self) {
        if let Some(platform) = self.platform {
            // Safety: since we have an exclusive borrow of self, there can't
            // be any borrows of the memory dealt out by this allocator (they
            // all borrow the allocator immutably), so nobody is using the
            // memory anymore. The pointer and size are the ones returned by
            // and passed into malloc in the constructor.
            unsafe { platform.free(self.backing_mem_ptr, self.backing_mem_size) };
        }
    }
}

impl<'a> LinearAllocator<'a> {
    /// Creates a new [`LinearAllocator`] with `capacity` bytes of backing
    /// memory from the platform. Returns None if allocating the memory fails
    /// or if `capacity` overflows `isize`.
    pub fn new(platform: &'a dyn Platform, capacity: usize) -> Option<LinearAllocator<'a>> {
        if capacity > isize::MAX as usize {
            // Practically never happens, but asserting this here helps avoid a
            // safety check later.
            return None;
        }

        let backing_mem_ptr = platform.malloc(capacity);
        if backing_mem_ptr.is_null() {
            return None;
        }

        Some(LinearAllocator {
            backing_mem_ptr,
            backing_mem_size: capacity,
            platform: Some(platform),
            allocated: Cell::new(0),
            _parent_memory: PhantomData,
        })
    }

    /// Creates a new [`LinearAllocator`] with `capacity` bytes of backing
    /// memory allocated from `parent`. Useful for e.g. a per-scene zone, which
    /// gets reset between scenes, carved out of a persistent zone.
    ///
    /// ### Panics
    ///
    /// If `parent` doesn't have `capacity` bytes left.
    #[track_caller]
    pub fn new_in(parent: &'a LinearAllocator, capacity: usize) -> LinearAllocator<'a> {
        let backing_slice = parent.alloc_uninit_slice::<u8>(capacity);
        LinearAllocator {
            backing_mem_ptr: backing_slice.as_mut_ptr() as *mut c_void,
            backing_mem_size: capacity,
            platform: None,
            allocated: Cell::new(0),
            _parent_memory: PhantomData,
        }
    }
}

impl LinearAllocator<'_> {
    /// Returns the amount of allocated memory currently, in bytes, including
    /// any padding used for alignment.
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Returns the total (free and allocated) amount of memory owned by this
    /// allocator, in bytes.
    pub fn total(&self) -> usize {
        self.backing_mem_size
    }

    /// Allocates memory for a slice of `MaybeUninit<T>`, leaving the contents
    /// of the slice uninitialized, returning None if there's not enough free
    /// memory. A failed allocation doesn't use up any memory.
    pub fn try_alloc_uninit_slice<T>(&self, len: usize) -> Option<&mut [MaybeUninit<T>]> {
        let size = len.checked_mul(size_of::<T>())?;

        // Figure out the properly aligned offset of the new allocation. This
        // is done with addresses instead of offsets, since the backing memory
        // of a nested zone is only byte-aligned.
        let base_address = self.backing_mem_ptr as usize;
        let unaligned_address = base_address.checked_add(self.allocated.get())?;
        let aligned_address = unaligned_address.checked_next_multiple_of(align_of::<T>())?;
        let offset = aligned_address - base_address;
        let end = offset.checked_add(size)?;
        if end > self.backing_mem_size {
            return None;
        }

        // Bump before creating the borrow. `allocated` is a Cell, and `reset`
        // requires a mutable borrow, so no other allocation can be handed out
        // between the `get()` above and this `set()`.
        self.allocated.set(end);

        // Safety: `offset` is at most `self.backing_mem_size`, which is at most
        // `isize::MAX` (checked in `new`, and `new_in` borrows an existing
        // slice), and the resulting pointer is within the backing allocation.
        let uninit_t_ptr = unsafe { self.backing_mem_ptr.byte_add(offset) } as *mut MaybeUninit<T>;

        // Safety:
        // - `uninit_t_ptr` is non-null, aligned for T (see the address
        //   calculation above), and the whole `len * size_of::<T>()` range is
        //   within the single allocated object backing this allocator.
        // - Uninitialized values are valid for `MaybeUninit<T>`, so the slice
        //   does point to `len` properly initialized values.
        // - The memory is not accessed through any other pointer for the
        //   duration of the returned borrow: `self.allocated` has been bumped
        //   past it, and is not reset until self is mutably borrowable again
        //   (i.e. after this slice has been dropped).
        let uninit_t_slice = unsafe { slice::from_raw_parts_mut(uninit_t_ptr, len) };

        Some(uninit_t_slice)
    }

    /// Allocates memory for a slice of `MaybeUninit<T>`, leaving the contents
    /// of the slice uninitialized.
    ///
    /// ### Panics
    ///
    /// If there's not enough free memory. Zones have a fixed budget, and
    /// running out of it is a bug in how the zone was sized.
    #[track_caller]
    pub fn alloc_uninit_slice<T>(&self, len: usize) -> &mut [MaybeUninit<T>] {
        match self.try_alloc_uninit_slice(len) {
            Some(uninit_slice) => uninit_slice,
            None => self.exhausted(len.saturating_mul(size_of::<T>())),
        }
    }

    /// Allocates one `T` and moves `value` there.
    ///
    /// ### Panics
    ///
    /// If there's not enough free memory, like
    /// [`LinearAllocator::alloc_uninit_slice`].
    #[track_caller]
    pub fn alloc<T>(&self, value: T) -> &mut T {
        let uninit = &mut self.alloc_uninit_slice::<T>(1)[0];
        uninit.write(value)
    }

    /// Resets the linear allocator, reclaiming all of the backing memory for
    /// future allocations. The values allocated before this are not dropped.
    pub fn reset(&mut self) {
        // Safety: though this is not an unsafe operation, pretty much all the
        // unsafety in this file relies on `self.backing_mem_ptr +
        // self.allocated` to not point into memory which is already being
        // borrowed. Here's why we're not: We have a mutable borrow of self. =>
        // There's no other borrows of self. => There's no pointers to the
        // backing memory. (All previous allocations have lifetimes that cannot
        // outlive the related immutable borrow of this allocator.)
        trace!(
            "Resetting a memory zone with {} of {} bytes in use.",
            self.allocated.get(),
            self.backing_mem_size,
        );
        self.allocated.set(0);
    }

    #[cold]
    #[track_caller]
    fn exhausted(&self, requested: usize) -> ! {
        error!(
            requested,
            allocated = self.allocated.get(),
            total = self.backing_mem_size,
            "Memory zone exhausted."
        );
        panic!(
            "memory zone exhausted: requested {} bytes with {} of {} bytes in use",
            requested,
            self.allocated.get(),
            self.backing_mem_size,
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::test_platform::TestPlatform;

    use super::LinearAllocator;

    #[test]
    fn allocations_are_disjoint_and_increasing() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1000).unwrap();

        let mut previous_end = 0;
        for size in [1, 7, 64, 3, 200, 13] {
            let start = zone.alloc_uninit_slice::<u8>(size).as_ptr() as usize;
            assert!(start >= previous_end, "allocations should not overlap");
            previous_end = start + size;
        }
        assert_eq!(1 + 7 + 64 + 3 + 200 + 13, zone.allocated());
    }

    #[test]
    fn reset_reuses_the_first_address() {
        let platform = TestPlatform::new();
        let mut zone = LinearAllocator::new(&platform, 256).unwrap();

        let first = zone.alloc_uninit_slice::<u32>(4).as_ptr() as usize;
        let _second = zone.alloc_uninit_slice::<u32>(4);
        zone.reset();
        assert_eq!(0, zone.allocated());
        let after_reset = zone.alloc_uninit_slice::<u32>(4).as_ptr() as usize;

        assert_eq!(first, after_reset);
    }

    #[test]
    fn respects_alignment() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 256).unwrap();

        let _byte = zone.alloc(1u8);
        let word = zone.alloc(0xABCD_u64);
        assert_eq!(0, word as *mut u64 as usize % align_of::<u64>());
        assert_eq!(0xABCD, *word);
        assert_eq!(16, zone.allocated(), "7 bytes of padding are expected");
    }

    #[test]
    fn try_alloc_fails_without_using_memory() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 64).unwrap();

        assert!(zone.try_alloc_uninit_slice::<u8>(60).is_some());
        assert!(zone.try_alloc_uninit_slice::<u8>(5).is_none());
        assert_eq!(60, zone.allocated());
        assert!(zone.try_alloc_uninit_slice::<u8>(4).is_some());
        assert_eq!(64, zone.allocated());
    }

    #[test]
    #[should_panic(expected = "memory zone exhausted")]
    fn exhaustion_is_fatal() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 32).unwrap();
        let _fits = zone.alloc_uninit_slice::<u8>(32);
        let _does_not_fit = zone.alloc_uninit_slice::<u8>(1);
    }

    #[test]
    fn nested_zones_live_inside_the_parent() {
        let platform = TestPlatform::new();
        let parent = LinearAllocator::new(&platform, 1024).unwrap();
        let _before = parent.alloc_uninit_slice::<u8>(10);

        let mut scene = LinearAllocator::new_in(&parent, 512);
        assert_eq!(522, parent.allocated());

        let parent_range = {
            let start = platform.allocation_address(0);
            start..start + 1024
        };
        for _ in 0..2 {
            let a = scene.alloc_uninit_slice::<u16>(100).as_ptr() as usize;
            let b = scene.alloc_uninit_slice::<u16>(100).as_ptr() as usize;
            assert!(parent_range.contains(&a) && parent_range.contains(&(b + 199)));
            scene.reset();
        }
    }
}
