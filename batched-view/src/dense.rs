//! Packed dense storage.

use std::ops::{Index, IndexMut};

use crate::iter::{RowIter, RowIterMut};
use crate::row::{RowMut, RowRef};
use crate::view::{VectorView, VectorViewMut};
use crate::{MemoryOrder, Result, StorageError};

// ============================================================================
// DenseVector
// ============================================================================

/// Owned contiguous vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseVector<T> {
    data: Vec<T>,
}

impl<T> DenseVector<T> {
    /// Vector of `len` default-valued elements.
    pub fn new(len: usize) -> Self
    where
        T: Default + Clone,
    {
        Self {
            data: vec![T::default(); len],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.data.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Resize to `len`, keeping the common prefix and default-filling the rest.
    pub fn resize(&mut self, len: usize)
    where
        T: Default + Clone,
    {
        self.data.resize(len, T::default());
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Unit-stride view over the whole vector.
    pub fn view(&self) -> VectorView<'_, T> {
        unsafe { VectorView::from_raw_parts(self.data.as_ptr(), self.data.len(), 1) }
    }

    pub fn view_mut(&mut self) -> VectorViewMut<'_, T> {
        let len = self.data.len();
        unsafe { VectorViewMut::from_raw_parts(self.data.as_mut_ptr(), len, 1) }
    }
}

impl<T> Index<usize> for DenseVector<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for DenseVector<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T> From<Vec<T>> for DenseVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T> FromIterator<T> for DenseVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a DenseVector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DenseVector<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter_mut()
    }
}

impl<T: PartialEq> PartialEq<[T]> for DenseVector<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.data.as_slice() == other
    }
}

// ============================================================================
// DenseMatrix
// ============================================================================

/// Owned, packed dense matrix in row- or column-major order.
///
/// Row `i` is a [`VectorView`] with stride `strides()[1]`; in column-major
/// storage that stride is the row count, so rows are not contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    order: MemoryOrder,
}

impl<T> DenseMatrix<T> {
    /// Row-major matrix of default-valued elements.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        Self::with_order(rows, cols, MemoryOrder::RowMajor)
    }

    pub fn with_order(rows: usize, cols: usize, order: MemoryOrder) -> Self
    where
        T: Default + Clone,
    {
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
            order,
        }
    }

    /// Build a matrix whose element `(i, j)` is `f(i, j)`.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        order: MemoryOrder,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        match order {
            MemoryOrder::RowMajor => {
                for i in 0..rows {
                    for j in 0..cols {
                        data.push(f(i, j));
                    }
                }
            }
            MemoryOrder::ColMajor => {
                for j in 0..cols {
                    for i in 0..rows {
                        data.push(f(i, j));
                    }
                }
            }
        }
        Self {
            data,
            rows,
            cols,
            order,
        }
    }

    /// Wrap packed data laid out in `order`.
    pub fn from_parts(data: Vec<T>, rows: usize, cols: usize, order: MemoryOrder) -> Result<Self> {
        let expected = rows.checked_mul(cols).ok_or(StorageError::OffsetOverflow)?;
        if data.len() != expected {
            return Err(StorageError::LengthMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            order,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    #[inline]
    pub fn order(&self) -> MemoryOrder {
        self.order
    }

    /// Strides `[row_stride, col_stride]` in elements.
    #[inline]
    pub fn strides(&self) -> [usize; 2] {
        self.order.strides(self.rows, self.cols)
    }

    #[inline]
    pub fn leading_dimension(&self) -> usize {
        self.order.leading_dimension(self.rows, self.cols)
    }

    /// Packed storage in `order()`.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        let [rs, cs] = self.strides();
        i * rs + j * cs
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.rows && j < self.cols {
            Some(&self.data[self.offset(i, j)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i < self.rows && j < self.cols {
            let off = self.offset(i, j);
            Some(&mut self.data[off])
        } else {
            None
        }
    }

    /// Proxy reference to row `i`.
    pub fn row(&self, i: usize) -> Option<RowRef<'_, T>> {
        if i >= self.rows {
            return None;
        }
        let [rs, cs] = self.strides();
        let base = self.data.as_ptr().wrapping_add(i * rs);
        let view = unsafe { VectorView::from_raw_parts(base, self.cols, cs) };
        Some(RowRef::new(i, view))
    }

    /// Mutable proxy reference to row `i`.
    pub fn row_mut(&mut self, i: usize) -> Option<RowMut<'_, T>> {
        if i >= self.rows {
            return None;
        }
        let [rs, cs] = self.strides();
        let base = self.data.as_mut_ptr().wrapping_add(i * rs);
        let view = unsafe { VectorViewMut::from_raw_parts(base, self.cols, cs) };
        Some(RowMut::new(i, view))
    }

    pub fn iter_rows(&self) -> RowIter<'_, T> {
        RowIter::new(self.data.as_ptr(), self.strides(), self.rows, self.cols)
    }

    pub fn iter_rows_mut(&mut self) -> RowIterMut<'_, T> {
        let strides = self.strides();
        RowIterMut::new(self.data.as_mut_ptr(), strides, self.rows, self.cols)
    }

    /// Copy into a new matrix with the given memory order.
    pub fn to_order(&self, order: MemoryOrder) -> Self
    where
        T: Clone,
    {
        if order == self.order {
            return self.clone();
        }
        Self::from_fn(self.rows, self.cols, order, |i, j| self.data[self.offset(i, j)].clone())
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    /// Resize to `rows x cols`.
    ///
    /// The leading `min(rows) x min(cols)` block keeps its values; new
    /// elements are default-valued.
    pub fn resize(&mut self, rows: usize, cols: usize)
    where
        T: Default + Clone,
    {
        if rows == self.rows && cols == self.cols {
            return;
        }
        // Row-major storage with an unchanged column count only grows or
        // shrinks at the tail.
        if self.order == MemoryOrder::RowMajor && cols == self.cols {
            self.data.resize(rows * cols, T::default());
            self.rows = rows;
            return;
        }
        if self.order == MemoryOrder::ColMajor && rows == self.rows {
            self.data.resize(rows * cols, T::default());
            self.cols = cols;
            return;
        }
        let keep_rows = rows.min(self.rows);
        let keep_cols = cols.min(self.cols);
        let mut next = Self::with_order(rows, cols, self.order);
        for i in 0..keep_rows {
            for j in 0..keep_cols {
                let src = self.offset(i, j);
                let dst = next.offset(i, j);
                next.data[dst] = self.data[src].clone();
            }
        }
        *self = next;
    }
}

impl<T> Index<[usize; 2]> for DenseMatrix<T> {
    type Output = T;

    fn index(&self, [i, j]: [usize; 2]) -> &T {
        match self.get(i, j) {
            Some(value) => value,
            None => panic!(
                "index ({}, {}) out of bounds for shape ({}, {})",
                i, j, self.rows, self.cols
            ),
        }
    }
}

impl<T> IndexMut<[usize; 2]> for DenseMatrix<T> {
    fn index_mut(&mut self, [i, j]: [usize; 2]) -> &mut T {
        let (rows, cols) = (self.rows, self.cols);
        match self.get_mut(i, j) {
            Some(value) => value,
            None => panic!(
                "index ({}, {}) out of bounds for shape ({}, {})",
                i, j, rows, cols
            ),
        }
    }
}

impl<'a, T> IntoIterator for &'a DenseMatrix<T> {
    type Item = RowRef<'a, T>;
    type IntoIter = RowIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_rows()
    }
}

impl<'a, T> IntoIterator for &'a mut DenseMatrix<T> {
    type Item = RowMut<'a, T>;
    type IntoIter = RowIterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_rows_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(order: MemoryOrder) -> DenseMatrix<i32> {
        DenseMatrix::from_fn(3, 4, order, |i, j| (10 * i + j) as i32)
    }

    #[test]
    fn test_from_fn_layouts() {
        let r = sample(MemoryOrder::RowMajor);
        let c = sample(MemoryOrder::ColMajor);
        assert_eq!(&r.data()[..4], &[0, 1, 2, 3]);
        assert_eq!(&c.data()[..3], &[0, 10, 20]);
        assert_eq!(r[[2, 3]], 23);
        assert_eq!(c[[2, 3]], 23);
        assert_eq!(r.strides(), [4, 1]);
        assert_eq!(c.strides(), [1, 3]);
        assert_eq!(c.leading_dimension(), 3);
    }

    #[test]
    fn test_from_parts_length_check() {
        assert!(DenseMatrix::from_parts(vec![0; 6], 2, 3, MemoryOrder::RowMajor).is_ok());
        assert_eq!(
            DenseMatrix::from_parts(vec![0; 5], 2, 3, MemoryOrder::RowMajor),
            Err(StorageError::LengthMismatch {
                expected: 6,
                found: 5
            })
        );
    }

    #[test]
    fn test_row_of_col_major_is_strided() {
        let c = sample(MemoryOrder::ColMajor);
        let row = c.row(1).unwrap();
        assert_eq!(row.stride(), 3);
        assert_eq!(row.to_vec(), vec![10, 11, 12, 13]);
        assert!(c.row(3).is_none());
    }

    #[test]
    fn test_row_mut_writes_through() {
        let mut c = sample(MemoryOrder::ColMajor);
        {
            let mut row = c.row_mut(2).unwrap();
            row[0] = -1;
            row.set(3, -4);
        }
        assert_eq!(c[[2, 0]], -1);
        assert_eq!(c[[2, 3]], -4);
        assert_eq!(c[[1, 0]], 10);
    }

    #[test]
    fn test_to_order_preserves_elements() {
        let r = sample(MemoryOrder::RowMajor);
        let c = r.to_order(MemoryOrder::ColMajor);
        assert_eq!(c.order(), MemoryOrder::ColMajor);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(r[[i, j]], c[[i, j]]);
            }
        }
    }

    #[test]
    fn test_resize_preserves_leading_block() {
        for order in [MemoryOrder::RowMajor, MemoryOrder::ColMajor] {
            let mut m = sample(order);
            m.resize(2, 5);
            assert_eq!(m.shape(), [2, 5]);
            assert_eq!(m[[1, 3]], 13);
            assert_eq!(m[[1, 4]], 0);
            m.resize(4, 5);
            assert_eq!(m[[0, 2]], 2);
            assert_eq!(m[[3, 0]], 0);
        }
    }

    #[test]
    fn test_resize_same_shape_is_noop() {
        let mut m = sample(MemoryOrder::RowMajor);
        let before = m.clone();
        m.resize(3, 4);
        assert_eq!(m, before);
    }

    #[test]
    fn test_dense_vector_basics() {
        let mut v: DenseVector<f64> = DenseVector::new(3);
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0]);
        v[1] = 2.0;
        v.resize(4);
        assert_eq!(v.len(), 4);
        assert_eq!(v, *[0.0, 2.0, 0.0, 0.0].as_slice());
        let w: DenseVector<f64> = v.iter().map(|x| x * 2.0).collect();
        assert_eq!(w[1], 4.0);
    }

    #[test]
    fn test_empty_matrix_rows() {
        let m: DenseMatrix<f64> = DenseMatrix::new(0, 3);
        assert_eq!(m.iter_rows().count(), 0);
        let m: DenseMatrix<f64> = DenseMatrix::new(2, 0);
        assert_eq!(m.iter_rows().count(), 2);
        assert!(m.row(1).unwrap().is_empty());
    }
}
