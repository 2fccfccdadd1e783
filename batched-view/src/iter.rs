//! Proxy iterators over matrix rows.
//!
//! Each iterator keeps a `[front, back)` window of row positions and builds
//! the row proxy on demand, so `nth`, `nth_back` and `len` are O(1) and two
//! iterators over the same matrix can be compared by position.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::row::{RowMut, RowRef, SparseRowRef, SparseRowValuesMut};
use crate::sparse::CompressedMatrix;
use crate::view::{VectorView, VectorViewMut};

// ============================================================================
// Dense
// ============================================================================

/// Random-access iterator over the rows of a [`DenseMatrix`](crate::DenseMatrix).
pub struct RowIter<'a, T> {
    base: *const T,
    strides: [usize; 2],
    cols: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for RowIter<'_, T> {}
unsafe impl<T: Sync> Sync for RowIter<'_, T> {}

impl<'a, T> RowIter<'a, T> {
    pub(crate) fn new(base: *const T, strides: [usize; 2], rows: usize, cols: usize) -> Self {
        Self {
            base,
            strides,
            cols,
            front: 0,
            back: rows,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn row_at(&self, i: usize) -> RowRef<'a, T> {
        let [rs, cs] = self.strides;
        let view =
            unsafe { VectorView::from_raw_parts(self.base.wrapping_add(i * rs), self.cols, cs) };
        RowRef::new(i, view)
    }

    /// Row position the next call to `next` yields.
    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }

    /// Row `offset` places ahead without advancing.
    pub fn peek_at(&self, offset: usize) -> Option<RowRef<'a, T>> {
        let i = self.front.checked_add(offset)?;
        (i < self.back).then(|| self.row_at(i))
    }
}

impl<T> Clone for RowIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base,
            strides: self.strides,
            cols: self.cols,
            front: self.front,
            back: self.back,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for RowIter<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.base, other.base) && self.front == other.front && self.back == other.back
    }
}

impl<T> Eq for RowIter<'_, T> {}

impl<T> fmt::Debug for RowIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowIter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("strides", &self.strides)
            .finish()
    }
}

impl<'a, T> Iterator for RowIter<'a, T> {
    type Item = RowRef<'a, T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let row = self.row_at(self.front);
            self.front += 1;
            Some(row)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }

    fn count(self) -> usize {
        self.back - self.front
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T> DoubleEndedIterator for RowIter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.row_at(self.back))
        } else {
            None
        }
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl<T> ExactSizeIterator for RowIter<'_, T> {}
impl<T> FusedIterator for RowIter<'_, T> {}

/// Iterator over mutable row proxies of a [`DenseMatrix`](crate::DenseMatrix).
pub struct RowIterMut<'a, T> {
    base: *mut T,
    strides: [usize; 2],
    cols: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for RowIterMut<'_, T> {}

impl<'a, T> RowIterMut<'a, T> {
    pub(crate) fn new(base: *mut T, strides: [usize; 2], rows: usize, cols: usize) -> Self {
        Self {
            base,
            strides,
            cols,
            front: 0,
            back: rows,
            _marker: PhantomData,
        }
    }

    // Distinct rows of a packed matrix never share an element, and each
    // position is handed out at most once.
    #[inline]
    fn row_at(&mut self, i: usize) -> RowMut<'a, T> {
        let [rs, cs] = self.strides;
        let view =
            unsafe { VectorViewMut::from_raw_parts(self.base.wrapping_add(i * rs), self.cols, cs) };
        RowMut::new(i, view)
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }
}

impl<T> fmt::Debug for RowIterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowIterMut")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}

impl<'a, T> Iterator for RowIterMut<'a, T> {
    type Item = RowMut<'a, T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let row = self.row_at(self.front);
            self.front += 1;
            Some(row)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T> DoubleEndedIterator for RowIterMut<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.row_at(self.back))
        } else {
            None
        }
    }
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl<T> ExactSizeIterator for RowIterMut<'_, T> {}
impl<T> FusedIterator for RowIterMut<'_, T> {}

// ============================================================================
// Sparse
// ============================================================================

/// Random-access iterator over the rows of a [`CompressedMatrix`].
pub struct SparseRowIter<'a, T> {
    matrix: &'a CompressedMatrix<T>,
    front: usize,
    back: usize,
}

impl<'a, T> SparseRowIter<'a, T> {
    pub(crate) fn new(matrix: &'a CompressedMatrix<T>) -> Self {
        Self {
            matrix,
            front: 0,
            back: matrix.rows(),
        }
    }

    #[inline]
    fn row_at(&self, i: usize) -> SparseRowRef<'a, T> {
        let matrix = self.matrix;
        let range = matrix.row_range(i);
        SparseRowRef::new(
            i,
            matrix.cols(),
            &matrix.col_indices()[range.clone()],
            &matrix.values()[range],
        )
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }

    pub fn peek_at(&self, offset: usize) -> Option<SparseRowRef<'a, T>> {
        let i = self.front.checked_add(offset)?;
        (i < self.back).then(|| self.row_at(i))
    }
}

impl<T> Clone for SparseRowIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            matrix: self.matrix,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T> PartialEq for SparseRowIter<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.matrix, other.matrix)
            && self.front == other.front
            && self.back == other.back
    }
}

impl<T> Eq for SparseRowIter<'_, T> {}

impl<T> fmt::Debug for SparseRowIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseRowIter")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}

impl<'a, T> Iterator for SparseRowIter<'a, T> {
    type Item = SparseRowRef<'a, T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let row = self.row_at(self.front);
            self.front += 1;
            Some(row)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }

    fn count(self) -> usize {
        self.back - self.front
    }
}

impl<T> DoubleEndedIterator for SparseRowIter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.row_at(self.back))
        } else {
            None
        }
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl<T> ExactSizeIterator for SparseRowIter<'_, T> {}
impl<T> FusedIterator for SparseRowIter<'_, T> {}

/// Iterator over value-only mutable proxies of a [`CompressedMatrix`].
///
/// `values` always holds exactly the entries of rows `[front, back)`.
pub struct SparseRowIterMut<'a, T> {
    dim: usize,
    row_ptr: &'a [usize],
    indices: &'a [usize],
    values: &'a mut [T],
    front: usize,
    back: usize,
}

impl<'a, T> SparseRowIterMut<'a, T> {
    pub(crate) fn new(
        dim: usize,
        row_ptr: &'a [usize],
        indices: &'a [usize],
        values: &'a mut [T],
    ) -> Self {
        Self {
            dim,
            row_ptr,
            indices,
            values,
            front: 0,
            back: row_ptr.len().saturating_sub(1),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }

    fn take_front(&mut self, n: usize) -> &'a mut [T] {
        let values = std::mem::take(&mut self.values);
        let (head, tail) = values.split_at_mut(n);
        self.values = tail;
        head
    }
}

impl<T> fmt::Debug for SparseRowIterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseRowIterMut")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}

impl<'a, T> Iterator for SparseRowIterMut<'a, T> {
    type Item = SparseRowValuesMut<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let i = self.front;
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        let values = self.take_front(end - start);
        let indices = self.indices;
        self.front += 1;
        Some(SparseRowValuesMut::new(i, self.dim, &indices[start..end], values))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let target = self.front.saturating_add(n).min(self.back);
        let skipped = self.row_ptr[target] - self.row_ptr[self.front];
        self.take_front(skipped);
        self.front = target;
        self.next()
    }
}

impl<T> DoubleEndedIterator for SparseRowIterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let i = self.back - 1;
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        let values = std::mem::take(&mut self.values);
        let split = values.len() - (end - start);
        let (head, tail) = values.split_at_mut(split);
        self.values = head;
        self.back = i;
        let indices = self.indices;
        Some(SparseRowValuesMut::new(i, self.dim, &indices[start..end], tail))
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        let target = self.back.saturating_sub(n).max(self.front);
        let skipped = self.row_ptr[self.back] - self.row_ptr[target];
        let values = std::mem::take(&mut self.values);
        let keep = values.len() - skipped;
        self.values = &mut values[..keep];
        self.back = target;
        self.next_back()
    }
}

impl<T> ExactSizeIterator for SparseRowIterMut<'_, T> {}
impl<T> FusedIterator for SparseRowIterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use crate::{CompressedMatrix, DenseMatrix, MemoryOrder, SparseVector};

    fn dense() -> DenseMatrix<i32> {
        DenseMatrix::from_fn(4, 3, MemoryOrder::ColMajor, |i, j| (10 * i + j) as i32)
    }

    fn sparse() -> CompressedMatrix<f64> {
        let mut m = CompressedMatrix::new(4, 5);
        m.insert(0, 1, 1.0).unwrap();
        m.insert(2, 0, 2.0).unwrap();
        m.insert(2, 4, 3.0).unwrap();
        m.insert(3, 2, 4.0).unwrap();
        m
    }

    #[test]
    fn test_row_iter_random_access() {
        let m = dense();
        let mut it = m.iter_rows();
        assert_eq!(it.len(), 4);
        assert_eq!(it.peek_at(2).unwrap(), vec![20, 21, 22]);
        assert_eq!(it.position(), 0);
        let row = it.nth(1).unwrap();
        assert_eq!(row.index(), 1);
        assert_eq!(it.position(), 2);
        assert_eq!(it.len(), 2);
        assert_eq!(it.nth_back(0).unwrap().index(), 3);
        assert_eq!(it.next().unwrap(), vec![20, 21, 22]);
        assert!(it.next().is_none());
        assert!(it.peek_at(0).is_none());
    }

    #[test]
    fn test_row_iter_nth_past_end() {
        let m = dense();
        let mut it = m.iter_rows();
        assert!(it.nth(10).is_none());
        assert_eq!(it.len(), 0);
    }

    #[test]
    fn test_row_iter_equality_by_position() {
        let m = dense();
        let a = m.iter_rows();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.next();
        assert_ne!(a, b);
        let other = dense();
        assert_ne!(a, other.iter_rows());
    }

    #[test]
    fn test_row_iter_reverse() {
        let m = dense();
        let firsts: Vec<i32> = m.iter_rows().rev().map(|r| r[0]).collect();
        assert_eq!(firsts, vec![30, 20, 10, 0]);
        assert_eq!(m.iter_rows().last().unwrap().index(), 3);
    }

    #[test]
    fn test_row_iter_mut_writes() {
        let mut m = dense();
        for mut row in m.iter_rows_mut() {
            let i = row.index() as i32;
            row.fill(i);
        }
        for (i, row) in (&m).into_iter().enumerate() {
            assert_eq!(row, vec![i as i32; 3]);
        }
        let mut it = m.iter_rows_mut();
        let mut last = it.next_back().unwrap();
        last.set(0, -1);
        assert_eq!(it.len(), 3);
        assert_eq!(m[[3, 0]], -1);
    }

    #[test]
    fn test_sparse_row_iter() {
        let m = sparse();
        let nnz: Vec<usize> = m.iter_rows().map(|r| r.nnz()).collect();
        assert_eq!(nnz, vec![1, 0, 2, 1]);

        let mut it = m.iter_rows();
        let row = it.nth(2).unwrap();
        assert_eq!(
            row,
            SparseVector::from_pairs(5, [(0, 2.0), (4, 3.0)]).unwrap()
        );
        assert_eq!(it.peek_at(0).unwrap().index(), 3);
        assert_eq!(it.clone(), it);
        assert_eq!(m.iter_rows().rev().next().unwrap().get(2), Some(&4.0));
    }

    #[test]
    fn test_sparse_row_iter_mut_splits_values() {
        let mut m = sparse();
        {
            let mut it = m.iter_rows_mut();
            let mut back = it.next_back().unwrap();
            back.set(2, 40.0).unwrap();
            let mut third = it.nth(2).unwrap();
            assert_eq!(third.index(), 2);
            for (_, v) in third.iter_mut() {
                *v += 100.0;
            }
            assert!(it.next().is_none());
        }
        assert_eq!(m.values(), &[1.0, 102.0, 103.0, 40.0]);

        for mut row in &mut m {
            let r = row.index() as f64;
            for v in row.values_mut() {
                *v = r;
            }
        }
        assert_eq!(m.values(), &[0.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mut_iters_skip_from_the_back() {
        let mut m = dense();
        {
            let mut it = m.iter_rows_mut();
            let mut row = it.nth_back(2).unwrap();
            assert_eq!(row.index(), 1);
            row.set(2, -7);
            assert_eq!(it.len(), 1);
            assert_eq!(it.next().unwrap().index(), 0);
            assert!(it.nth_back(0).is_none());
        }
        assert_eq!(m[[1, 2]], -7);
        assert!(m.iter_rows_mut().nth_back(4).is_none());

        let mut s = sparse();
        {
            let mut it = s.iter_rows_mut();
            let mut row = it.nth_back(1).unwrap();
            assert_eq!(row.index(), 2);
            for v in row.values_mut() {
                *v = -1.0;
            }
            let mut first = it.nth_back(1).unwrap();
            assert_eq!(first.index(), 0);
            first.values_mut()[0] = 9.0;
            assert!(it.next().is_none());
        }
        assert_eq!(s.values(), &[9.0, -1.0, -1.0, 4.0]);
        assert!(s.iter_rows_mut().nth_back(4).is_none());
    }
}
