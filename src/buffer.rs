//! Raw view of a transform buffer shared by the stage kernels

use std::marker::PhantomData;

/// A copyable, thread-shareable view of a caller's mutable buffer.
///
/// Every task of one stage works on a disjoint set of slots, but those sets
/// interleave (a radix-4 task touches four strided quarter blocks, a
/// bit-reversal task swaps with slots anywhere above it), so the kernels
/// cannot be handed split `&mut` sub-slices. They read and write through this
/// view instead. The stage partitioning is what makes the accesses disjoint.
pub(crate) struct SharedSlice<'a, T> {
    ptr: *mut T,
    len: usize,
    _buffer: PhantomData<&'a mut [T]>,
}

impl<'a, T> Clone for SharedSlice<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for SharedSlice<'a, T> {}

// Safety: the view only hands out element reads/writes; the stage
// partitioning guarantees no slot is touched by two tasks of the same round.
unsafe impl<'a, T: Send> Send for SharedSlice<'a, T> {}
unsafe impl<'a, T: Send> Sync for SharedSlice<'a, T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    pub(crate) fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _buffer: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// `i < len`, and no other task writes slot `i` concurrently.
    #[inline(always)]
    pub(crate) unsafe fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "slot {i} out of {}", self.len);
        *self.ptr.add(i)
    }

    /// # Safety
    /// `i < len`, and no other task accesses slot `i` concurrently.
    #[inline(always)]
    pub(crate) unsafe fn set(&self, i: usize, value: T) {
        debug_assert!(i < self.len, "slot {i} out of {}", self.len);
        *self.ptr.add(i) = value;
    }

    /// # Safety
    /// Both slots in range and owned by the calling task.
    #[inline(always)]
    pub(crate) unsafe fn swap(&self, i: usize, j: usize) {
        debug_assert!(i < self.len && j < self.len);
        std::ptr::swap(self.ptr.add(i), self.ptr.add(j));
    }
}
