// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Debug;

use crate::allocators::LinearAllocator;

use super::FixedVec;

/// A reference to a value stored in a [`Pool`]. Only valid until the value is
/// released, after which the pool rejects it, even if the slot has been
/// reused by then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// The slot this handle points to. Stable for the lifetime of the value,
    /// so it can be used to index parallel arrays.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// An object pool with a fixed number of slots, allocated up front from a
/// memory zone.
///
/// Freed slots go on a free list and are handed out again by later
/// insertions. Each slot has a generation counter which is bumped on release,
/// so stale handles are detected by value instead of by pointer identity.
pub struct Pool<'a, T> {
    slots: FixedVec<'a, Slot<T>>,
    free_list: FixedVec<'a, u32>,
}

impl<'a, T> Pool<'a, T> {
    /// Creates a pool with room for `capacity` values at the same time.
    ///
    /// ### Panics
    ///
    /// If `zone` does not have space for the slots and the free list, or if
    /// `capacity` doesn't fit in a `u32`.
    #[track_caller]
    pub fn new(zone: &'a LinearAllocator, capacity: usize) -> Pool<'a, T> {
        assert!(
            capacity <= u32::MAX as usize,
            "pools are indexed with u32s, {capacity} slots is too many",
        );

        let mut slots = FixedVec::new(zone, capacity);
        let mut free_list = FixedVec::new(zone, capacity);
        for i in 0..capacity {
            let slot = Slot {
                generation: 0,
                value: None,
            };
            // The capacities were just allocated to fit these.
            let (Ok(()), Ok(())) = (slots.push(slot), free_list.push((capacity - 1 - i) as u32))
            else {
                unreachable!()
            };
        }

        Pool { slots, free_list }
    }

    /// Moves the value into a free slot, returning a handle to it. If all
    /// slots are taken, the value is returned back wrapped in a
    /// [`Result::Err`].
    pub fn insert(&mut self, value: T) -> Result<PoolHandle, T> {
        let Some(index) = self.free_list.pop() else {
            return Err(value);
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        Ok(PoolHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Returns a reference to the value behind the handle, or None if it has
    /// been released already.
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns a mutable reference to the value behind the handle, or None if
    /// it has been released already.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Removes the value from the pool and returns it, freeing up the slot.
    /// Returns None for handles that have already been released, and for
    /// handles from other pools that point outside this one.
    pub fn release(&mut self, handle: PoolHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);

        let Ok(()) = self.free_list.push(handle.index) else {
            panic!("the pool free list should not be able to overflow");
        };

        Some(value)
    }

    /// Returns the handles and values of every occupied slot, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        (self.slots.iter().enumerate()).filter_map(|(index, slot)| {
            let handle = PoolHandle {
                index: index as u32,
                generation: slot.generation,
            };
            Some((handle, slot.value.as_ref()?))
        })
    }

    /// The amount of values currently in the pool.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns true if there are no values in the pool.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum amount of values the pool can hold at the same time.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Default> Pool<'_, T> {
    /// Takes a free slot and fills it with `T::default()`, or returns None if
    /// the pool is full.
    pub fn acquire(&mut self) -> Option<PoolHandle> {
        self.insert(T::default()).ok()
    }
}

impl<T: Debug> Debug for Pool<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{allocators::LinearAllocator, test_platform::TestPlatform};

    use super::Pool;

    #[test]
    fn capacity_bounds_acquisitions() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1024).unwrap();
        let mut pool: Pool<u64> = Pool::new(&zone, 3);

        let handles = [pool.acquire(), pool.acquire(), pool.acquire()];
        assert!(handles.iter().all(Option::is_some));
        assert_eq!(None, pool.acquire());
        assert_eq!(Err(5), pool.insert(5));
        assert_eq!(3, pool.len());
        assert_eq!(3, pool.capacity());
    }

    #[test]
    fn release_makes_the_slot_reusable() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1024).unwrap();
        let mut pool: Pool<u32> = Pool::new(&zone, 2);

        let a = pool.insert(1).unwrap();
        let b = pool.insert(2).unwrap();
        assert_eq!(0, a.index());
        assert_eq!(1, b.index());

        assert_eq!(Some(1), pool.release(a));
        let c = pool.insert(3).unwrap();
        assert_eq!(a.index(), c.index());
        assert_eq!(Some(&3), pool.get(c));
        assert_eq!(Some(&2), pool.get(b));
    }

    #[test]
    fn released_handles_are_rejected() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1024).unwrap();
        let mut pool: Pool<u32> = Pool::new(&zone, 2);

        let stale = pool.insert(10).unwrap();
        pool.release(stale);
        let fresh = pool.insert(20).unwrap();

        assert_eq!(None, pool.get(stale));
        assert_eq!(None, pool.get_mut(stale));
        assert_eq!(None, pool.release(stale));
        assert_eq!(Some(&20), pool.get(fresh));
        assert_eq!(1, pool.len());
    }

    #[test]
    fn foreign_handles_outside_the_pool_are_rejected() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1024).unwrap();
        let mut big: Pool<u8> = Pool::new(&zone, 8);
        let mut small: Pool<u8> = Pool::new(&zone, 1);

        let mut last = None;
        for i in 0..8 {
            last = big.insert(i).ok();
        }
        let foreign = last.unwrap();
        assert_eq!(None, small.get(foreign));
        assert_eq!(None, small.release(foreign));
    }

    #[test]
    fn iterates_occupied_slots() {
        let platform = TestPlatform::new();
        let zone = LinearAllocator::new(&platform, 1024).unwrap();
        let mut pool: Pool<char> = Pool::new(&zone, 4);

        let a = pool.insert('a').unwrap();
        pool.insert('b').unwrap();
        pool.insert('c').unwrap();
        pool.release(a);

        let values = pool.iter().map(|(_, value)| *value);
        assert!(values.eq(['b', 'c']));
        let first = pool.iter().next().map(|(handle, _)| handle).unwrap();
        *pool.get_mut(first).unwrap() = 'x';
        assert_eq!(Some(&'x'), pool.get(first));
    }
}
