// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    fmt::Debug,
    mem::{needs_drop, transmute, MaybeUninit},
    ops::{Deref, DerefMut},
};

use bytemuck::{fill_zeroes, Zeroable};

use crate::allocators::LinearAllocator;

/// A fixed-capacity contiguous array allocated from a memory zone.
///
/// Named like Vec since it's used similarly, but this type does *not* allocate
/// more memory as needed. The capacity is picked at creation time, and the
/// backing memory is left uninitialized until it's pushed to. Unlike the zone
/// itself, the vec does drop its elements when cleared or dropped.
pub struct FixedVec<'a, T> {
    uninit_slice: &'a mut [MaybeUninit<T>],
    initialized_len: usize,
}

impl<T> FixedVec<'_, T> {
    /// Creates a new [`FixedVec`] with enough space for `capacity` elements of
    /// type `T`.
    ///
    /// ### Panics
    ///
    /// If the zone does not have enough free space.
    #[track_caller]
    pub fn new<'a>(zone: &'a LinearAllocator, capacity: usize) -> FixedVec<'a, T> {
        FixedVec {
            uninit_slice: zone.alloc_uninit_slice::<T>(capacity),
            initialized_len: 0,
        }
    }

    /// Like [`FixedVec::new`], but returns None instead of panicking if the
    /// zone does not have enough free space.
    pub fn try_new<'a>(zone: &'a LinearAllocator, capacity: usize) -> Option<FixedVec<'a, T>> {
        Some(FixedVec {
            uninit_slice: zone.try_alloc_uninit_slice::<T>(capacity)?,
            initialized_len: 0,
        })
    }

    /// Appends the value to the back of the array. If there's no capacity left,
    /// returns the given value back wrapped in a [`Result::Err`].
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let i = self.initialized_len;
        let Some(uninit_at_i) = self.uninit_slice.get_mut(i) else {
            return Err(value);
        };

        // The slot at `i` is uninitialized: either it was never written to, or
        // the value that was there has been dropped or moved out by one of the
        // removing functions. So nothing gets leaked by overwriting it.
        uninit_at_i.write(value);
        self.initialized_len = i + 1;

        Ok(())
    }

    /// If non-empty, returns the final element and shortens the array by one.
    pub fn pop(&mut self) -> Option<T> {
        if self.initialized_len == 0 {
            return None;
        }
        let i = self.initialized_len - 1;

        // Safety: since i < initialized_len, the MaybeUninit at that index is
        // definitely initialized. Double-reads (thus double-drops) are avoided
        // by decrementing initialized_len right after, which means that the
        // previous value in the slice won't be used as if it were initialized.
        let value = unsafe { self.uninit_slice[i].assume_init_read() };
        self.initialized_len -= 1;

        Some(value)
    }

    /// Empties out the array, dropping the currently contained values.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Shortens the array to be the given length if it's currently longer. Any
    /// values past the new length are dropped.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.initialized_len {
            return;
        }

        let old_len = self.initialized_len;
        // Shorten first, so that a panicking drop can't cause a double drop.
        self.initialized_len = new_len;

        if needs_drop::<T>() {
            for initialized_value in &mut self.uninit_slice[new_len..old_len] {
                // Safety: all the values up to the old length were
                // initialized, and they're no longer considered a part of the
                // array, so they won't be dropped again.
                unsafe { initialized_value.assume_init_drop() };
            }
        }
    }

    /// Returns the amount of elements that fit in this array.
    pub fn capacity(&self) -> usize {
        self.uninit_slice.len()
    }
}

impl<T: Clone> FixedVec<'_, T> {
    /// Fills out the rest of the array's capacity with clones of `value`.
    pub fn fill_with(&mut self, value: T) {
        while self.push(value.clone()).is_ok() {}
    }
}

impl<T: Zeroable> FixedVec<'_, T> {
    /// Fills out the rest of the array's capacity with zeroed values.
    pub fn fill_with_zeroes(&mut self) {
        fill_zeroes(&mut self.uninit_slice[self.initialized_len..]);
        // Everything before `initialized_len` was already initialized, and the
        // rest is now zeroed, which is a valid T since it's Zeroable.
        self.initialized_len = self.uninit_slice.len();
    }
}

impl<T> Drop for FixedVec<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Deref for FixedVec<'_, T> {
    type Target = [T];

    fn deref<'a>(&'a self) -> &'a Self::Target {
        let initialized_slice = &self.uninit_slice[..self.initialized_len];
        // Safety: `MaybeUninit<T>` is identical to `T` except that it might be
        // uninitialized, and all values up to `self.initialized_len` are
        // initialized.
        unsafe { transmute::<&'a [MaybeUninit<T>], &'a [T]>(initialized_slice) }
    }
}

impl<T> DerefMut for FixedVec<'_, T> {
    fn deref_mut<'a>(&'a mut self) -> &'a mut Self::Target {
        let initialized_slice = &mut self.uninit_slice[..self.initialized_len];
        // Safety: see the Deref impl.
        unsafe { transmute::<&'a mut [MaybeUninit<T>], &'a mut [T]>(initialized_slice) }
    }
}

impl<T: Debug> Debug for FixedVec<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let slice: &[T] = self;
        f.debug_list().entries(slice).finish()
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicI32, Ordering};

    use crate::{allocators::LinearAllocator, collections::FixedVec, test_platform::TestPlatform};

    #[test]
    fn does_not_leak() {
        const COUNT: usize = 100;
        static ELEMENT_COUNT: AtomicI32 = AtomicI32::new(0);

        #[derive(Debug)]
        struct Element {
            _id: u32,
        }
        impl Element {
            pub fn create_and_count() -> Element {
                let id = ELEMENT_COUNT.fetch_add(1, Ordering::Relaxed);
                Element { _id: id as u32 }
            }
        }
        impl Drop for Element {
            fn drop(&mut self) {
                ELEMENT_COUNT.fetch_add(-1, Ordering::Relaxed);
            }
        }

        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, size_of::<Element>() * COUNT).unwrap();
        let mut vec: FixedVec<Element> = FixedVec::new(&zone, COUNT);

        for _ in 0..COUNT / 2 {
            vec.push(Element::create_and_count()).unwrap();
        }
        assert_eq!(COUNT as i32 / 2, ELEMENT_COUNT.load(Ordering::Relaxed));

        vec.clear();
        assert_eq!(0, ELEMENT_COUNT.load(Ordering::Relaxed));

        for _ in 0..COUNT {
            vec.push(Element::create_and_count()).unwrap();
        }
        assert_eq!(COUNT as i32, ELEMENT_COUNT.load(Ordering::Relaxed));
        assert!(
            vec.push(Element::create_and_count()).is_err(),
            "vec should be full already"
        );
        assert_eq!(COUNT as i32, ELEMENT_COUNT.load(Ordering::Relaxed));

        drop(vec);
        assert_eq!(0, ELEMENT_COUNT.load(Ordering::Relaxed));
    }

    #[test]
    fn fill_and_pop() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 64).unwrap();
        let mut vec: FixedVec<i16> = FixedVec::new(&zone, 4);
        vec.push(7).unwrap();
        vec.fill_with(-1);

        assert_eq!(&[7, -1, -1, -1], &*vec);
        assert_eq!(Err(3), vec.push(3));
        assert_eq!(Some(-1), vec.pop());
        assert_eq!(3, vec.len());
        assert_eq!(4, vec.capacity());
    }

    #[test]
    fn try_new_reports_exhaustion() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 8).unwrap();
        assert!(FixedVec::<u32>::try_new(&zone, 3).is_none());
        assert!(FixedVec::<u32>::try_new(&zone, 2).is_some());
    }
}
