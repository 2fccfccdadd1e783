//! Strided one-dimensional views.
//!
//! - [`VectorView`]: immutable strided view
//! - [`VectorViewMut`]: mutable strided view
//!
//! A row of a column-major matrix is not contiguous; these views describe it
//! by a base pointer, a length and a stride, and never copy the data.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::{Result, StorageError};

/// Validate that a view of `len` elements with `stride` starting at `offset`
/// stays within `[0, data_len)`.
pub(crate) fn validate_span(
    data_len: usize,
    len: usize,
    stride: usize,
    offset: usize,
) -> Result<()> {
    if len == 0 {
        if offset > data_len {
            return Err(StorageError::IndexOutOfBounds {
                index: offset,
                bound: data_len,
            });
        }
        return Ok(());
    }
    let last = stride
        .checked_mul(len - 1)
        .and_then(|end| end.checked_add(offset))
        .ok_or(StorageError::OffsetOverflow)?;
    if last >= data_len {
        return Err(StorageError::IndexOutOfBounds {
            index: last,
            bound: data_len,
        });
    }
    Ok(())
}

// ============================================================================
// VectorView
// ============================================================================

/// Immutable strided view over `len` elements.
pub struct VectorView<'a, T> {
    ptr: *const T,
    len: usize,
    stride: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for VectorView<'_, T> {}
unsafe impl<T: Sync> Sync for VectorView<'_, T> {}

impl<T> Clone for VectorView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for VectorView<'_, T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for VectorView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> VectorView<'a, T> {
    /// Create a view over `data[offset + i * stride]` for `i < len`.
    pub fn new(data: &'a [T], len: usize, stride: usize, offset: usize) -> Result<Self> {
        validate_span(data.len(), len, stride, offset)?;
        Ok(Self {
            ptr: data.as_ptr().wrapping_add(offset),
            len,
            stride,
            _marker: PhantomData,
        })
    }

    /// Create a view without bounds checking.
    ///
    /// # Safety
    /// `ptr.add(i * stride)` must be valid for reads for every `i < len`
    /// during `'a`, and no mutable access to those elements may exist.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize, stride: usize) -> Self {
        Self {
            ptr,
            len,
            stride,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether consecutive elements are adjacent in memory.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.stride == 1 || self.len <= 1
    }

    /// Element `i`, or `None` past the end.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&'a T> {
        if i < self.len {
            Some(unsafe { &*self.ptr.add(i * self.stride) })
        } else {
            None
        }
    }

    /// The elements as a slice when the view is contiguous.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.is_empty() {
            Some(&[])
        } else if self.is_contiguous() {
            Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
        } else {
            None
        }
    }

    pub fn iter(&self) -> StridedIter<'a, T> {
        StridedIter {
            ptr: self.ptr,
            front: 0,
            back: self.len,
            stride: self.stride,
            _marker: PhantomData,
        }
    }

    /// Copy the viewed elements into a new `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> Index<usize> for VectorView<'_, T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match self.get(i) {
            Some(value) => value,
            None => panic!("index {} out of bounds for length {}", i, self.len),
        }
    }
}

impl<'a, T> IntoIterator for VectorView<'a, T> {
    type Item = &'a T;
    type IntoIter = StridedIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for VectorView<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq> PartialEq<[T]> for VectorView<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

// ============================================================================
// VectorViewMut
// ============================================================================

/// Mutable strided view over `len` elements.
pub struct VectorViewMut<'a, T> {
    ptr: *mut T,
    len: usize,
    stride: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for VectorViewMut<'_, T> {}
unsafe impl<T: Sync> Sync for VectorViewMut<'_, T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for VectorViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_view().fmt(f)
    }
}

impl<'a, T> VectorViewMut<'a, T> {
    /// Create a mutable view over `data[offset + i * stride]` for `i < len`.
    pub fn new(data: &'a mut [T], len: usize, stride: usize, offset: usize) -> Result<Self> {
        validate_span(data.len(), len, stride, offset)?;
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_add(offset),
            len,
            stride,
            _marker: PhantomData,
        })
    }

    /// Create a mutable view without bounds checking.
    ///
    /// # Safety
    /// `ptr.add(i * stride)` must be valid for reads and writes for every
    /// `i < len` during `'a`, and no other reference to those elements may exist.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize, stride: usize) -> Self {
        Self {
            ptr,
            len,
            stride,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        if i < self.len {
            Some(unsafe { &*self.ptr.add(i * self.stride) })
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        if i < self.len {
            Some(unsafe { &mut *self.ptr.add(i * self.stride) })
        } else {
            None
        }
    }

    /// Set element `i`.
    ///
    /// Panics if `i` is out of bounds.
    pub fn set(&mut self, i: usize, value: T) {
        let len = self.len;
        match self.get_mut(i) {
            Some(slot) => *slot = value,
            None => panic!("index {} out of bounds for length {}", i, len),
        }
    }

    /// Copy `src` into the view element by element.
    pub fn copy_from_slice(&mut self, src: &[T]) -> Result<()>
    where
        T: Clone,
    {
        if src.len() != self.len {
            return Err(StorageError::LengthMismatch {
                expected: self.len,
                found: src.len(),
            });
        }
        for (dst, value) in self.iter_mut().zip(src) {
            dst.clone_from(value);
        }
        Ok(())
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for dst in self.iter_mut() {
            dst.clone_from(&value);
        }
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> VectorView<'_, T> {
        unsafe { VectorView::from_raw_parts(self.ptr, self.len, self.stride) }
    }

    /// Convert into an immutable view with the full lifetime.
    pub fn into_view(self) -> VectorView<'a, T> {
        unsafe { VectorView::from_raw_parts(self.ptr, self.len, self.stride) }
    }

    pub fn iter(&self) -> StridedIter<'_, T> {
        self.as_view().iter()
    }

    pub fn iter_mut(&mut self) -> StridedIterMut<'_, T> {
        StridedIterMut {
            ptr: self.ptr,
            front: 0,
            back: self.len,
            stride: self.stride,
            _marker: PhantomData,
        }
    }
}

impl<T> Index<usize> for VectorViewMut<'_, T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match self.get(i) {
            Some(value) => value,
            None => panic!("index {} out of bounds for length {}", i, self.len),
        }
    }
}

impl<T> IndexMut<usize> for VectorViewMut<'_, T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(i) {
            Some(value) => value,
            None => panic!("index {} out of bounds for length {}", i, len),
        }
    }
}

// ============================================================================
// Element iterators
// ============================================================================

/// Iterator over the elements of a strided view.
pub struct StridedIter<'a, T> {
    ptr: *const T,
    front: usize,
    back: usize,
    stride: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for StridedIter<'_, T> {}
unsafe impl<T: Sync> Sync for StridedIter<'_, T> {}

impl<T> Clone for StridedIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            front: self.front,
            back: self.back,
            stride: self.stride,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for StridedIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front < self.back {
            let item = unsafe { &*self.ptr.add(self.front * self.stride) };
            self.front += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T> DoubleEndedIterator for StridedIter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(unsafe { &*self.ptr.add(self.back * self.stride) })
        } else {
            None
        }
    }
}

impl<T> ExactSizeIterator for StridedIter<'_, T> {}
impl<T> std::iter::FusedIterator for StridedIter<'_, T> {}

/// Mutable iterator over the elements of a strided view.
pub struct StridedIterMut<'a, T> {
    ptr: *mut T,
    front: usize,
    back: usize,
    stride: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for StridedIterMut<'_, T> {}

impl<'a, T> Iterator for StridedIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front < self.back {
            // Each index is yielded once, so the returned borrows never alias.
            let item = unsafe { &mut *self.ptr.add(self.front * self.stride) };
            self.front += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for StridedIterMut<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(unsafe { &mut *self.ptr.add(self.back * self.stride) })
        } else {
            None
        }
    }
}

impl<T> ExactSizeIterator for StridedIterMut<'_, T> {}
impl<T> std::iter::FusedIterator for StridedIterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_span_ok() {
        assert!(validate_span(6, 3, 2, 0).is_ok());
        assert!(validate_span(6, 2, 3, 2).is_ok());
        assert!(validate_span(0, 0, 1, 0).is_ok());
    }

    #[test]
    fn test_validate_span_out_of_range() {
        assert_eq!(
            validate_span(6, 3, 3, 0),
            Err(StorageError::IndexOutOfBounds { index: 6, bound: 6 })
        );
        assert!(validate_span(6, 1, 1, 6).is_err());
    }

    #[test]
    fn test_validate_span_overflow() {
        assert_eq!(
            validate_span(6, 3, usize::MAX, 0),
            Err(StorageError::OffsetOverflow)
        );
    }

    #[test]
    fn test_view_strided_get() {
        // Column 1 of a 2x3 row-major matrix.
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = VectorView::new(&data, 2, 3, 1).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0), Some(&2.0));
        assert_eq!(view[1], 5.0);
        assert_eq!(view.get(2), None);
        assert!(!view.is_contiguous());
        assert_eq!(view.as_slice(), None);
    }

    #[test]
    fn test_view_contiguous_slice() {
        let data = vec![1, 2, 3, 4];
        let view = VectorView::new(&data, 2, 1, 2).unwrap();
        assert_eq!(view.as_slice(), Some(&[3, 4][..]));
        assert_eq!(view.to_vec(), vec![3, 4]);
    }

    #[test]
    fn test_view_iter_double_ended() {
        let data: Vec<i32> = (0..9).collect();
        let view = VectorView::new(&data, 3, 3, 0).unwrap();
        let forward: Vec<i32> = view.iter().copied().collect();
        let backward: Vec<i32> = view.iter().rev().copied().collect();
        assert_eq!(forward, vec![0, 3, 6]);
        assert_eq!(backward, vec![6, 3, 0]);
        assert_eq!(view.iter().nth(2), Some(&6));
        assert_eq!(view.iter().len(), 3);
    }

    #[test]
    fn test_view_mut_set_and_fill() {
        let mut data = vec![0; 6];
        {
            let mut view = VectorViewMut::new(&mut data, 3, 2, 1).unwrap();
            view.set(0, 7);
            view[2] = 9;
        }
        assert_eq!(data, vec![0, 7, 0, 0, 0, 9]);
        {
            let mut view = VectorViewMut::new(&mut data, 3, 2, 0).unwrap();
            view.fill(1);
        }
        assert_eq!(data, vec![1, 7, 1, 0, 1, 9]);
    }

    #[test]
    fn test_view_mut_copy_from_slice() {
        let mut data = vec![0.0; 4];
        let mut view = VectorViewMut::new(&mut data, 2, 2, 0).unwrap();
        view.copy_from_slice(&[1.5, 2.5]).unwrap();
        assert_eq!(
            view.copy_from_slice(&[1.0]),
            Err(StorageError::LengthMismatch {
                expected: 2,
                found: 1
            })
        );
        let view = view.into_view();
        assert_eq!(view, *[1.5, 2.5].as_slice());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_view_index_out_of_bounds() {
        let data = vec![1, 2];
        let view = VectorView::new(&data, 2, 1, 0).unwrap();
        let _ = view[2];
    }
}
