//! Proxy references to one row of a matrix.
//!
//! A proxy stands in for "the i-th element" of a batch without owning it:
//! reads and writes go straight to the parent storage. Dense proxies wrap a
//! strided view; sparse proxies wrap the slice of CSR arrays owned by the row.
//!
//! Mutable proxies convert into immutable ones via `From`, never the other way.

use std::fmt;
use std::ops::{Deref, DerefMut};

use num_traits::Zero;

use crate::dense::DenseVector;
use crate::sparse::{CompressedMatrix, SparseVector};
use crate::view::{VectorView, VectorViewMut};
use crate::{Result, StorageError};

// ============================================================================
// Dense rows
// ============================================================================

/// Immutable proxy to row `index()` of a [`DenseMatrix`](crate::DenseMatrix).
pub struct RowRef<'a, T> {
    row: usize,
    view: VectorView<'a, T>,
}

impl<T> Clone for RowRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RowRef<'_, T> {}

impl<'a, T> RowRef<'a, T> {
    pub(crate) fn new(row: usize, view: VectorView<'a, T>) -> Self {
        Self { row, view }
    }

    /// Row position in the parent matrix.
    #[inline]
    pub fn index(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn as_view(&self) -> VectorView<'a, T> {
        self.view
    }

    /// Copy the row into an owned vector.
    pub fn to_vector(&self) -> DenseVector<T>
    where
        T: Clone,
    {
        DenseVector::from_vec(self.view.to_vec())
    }
}

impl<'a, T> Deref for RowRef<'a, T> {
    type Target = VectorView<'a, T>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T: fmt::Debug> fmt::Debug for RowRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowRef")
            .field("row", &self.row)
            .field("values", &self.view)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for RowRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl<T: PartialEq> PartialEq<[T]> for RowRef<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.view == *other
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for RowRef<'_, T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.view == *other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<DenseVector<T>> for RowRef<'_, T> {
    fn eq(&self, other: &DenseVector<T>) -> bool {
        self.view == *other.as_slice()
    }
}

/// Mutable proxy to one row of a [`DenseMatrix`](crate::DenseMatrix).
pub struct RowMut<'a, T> {
    row: usize,
    view: VectorViewMut<'a, T>,
}

impl<'a, T> RowMut<'a, T> {
    pub(crate) fn new(row: usize, view: VectorViewMut<'a, T>) -> Self {
        Self { row, view }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.row
    }

    /// Reborrow as an immutable proxy.
    pub fn as_row_ref(&self) -> RowRef<'_, T> {
        RowRef::new(self.row, self.view.as_view())
    }

    /// Overwrite the row with `values`.
    pub fn assign(&mut self, values: &[T]) -> Result<()>
    where
        T: Clone,
    {
        self.view.copy_from_slice(values)
    }

    pub fn into_view(self) -> VectorViewMut<'a, T> {
        self.view
    }
}

impl<'a, T> Deref for RowMut<'a, T> {
    type Target = VectorViewMut<'a, T>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T> DerefMut for RowMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}

impl<T: fmt::Debug> fmt::Debug for RowMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_row_ref().fmt(f)
    }
}

impl<'a, T> From<RowMut<'a, T>> for RowRef<'a, T> {
    fn from(row: RowMut<'a, T>) -> Self {
        RowRef::new(row.row, row.view.into_view())
    }
}

// ============================================================================
// Sparse rows
// ============================================================================

/// Immutable proxy to one row of a [`CompressedMatrix`].
pub struct SparseRowRef<'a, T> {
    row: usize,
    dim: usize,
    indices: &'a [usize],
    values: &'a [T],
}

impl<T> Clone for SparseRowRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SparseRowRef<'_, T> {}

impl<'a, T> SparseRowRef<'a, T> {
    pub(crate) fn new(row: usize, dim: usize, indices: &'a [usize], values: &'a [T]) -> Self {
        Self {
            row,
            dim,
            indices,
            values,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.row
    }

    /// Logical length of the row (the matrix column count).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    #[inline]
    pub fn values(&self) -> &'a [T] {
        self.values
    }

    pub fn get(&self, j: usize) -> Option<&'a T> {
        self.indices.binary_search(&j).ok().map(|k| &self.values[k])
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &'a T)> + ExactSizeIterator + 'a {
        self.indices.iter().copied().zip(self.values.iter())
    }

    pub fn to_sparse_vector(&self) -> SparseVector<T>
    where
        T: Clone,
    {
        SparseVector::from_sorted(self.dim, self.indices.to_vec(), self.values.to_vec())
    }

    pub fn to_dense(&self) -> Vec<T>
    where
        T: Zero + Clone,
    {
        let mut out = vec![T::zero(); self.dim];
        for (j, v) in self.iter() {
            out[j] = v.clone();
        }
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseRowRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseRowRef")
            .field("row", &self.row)
            .field("dim", &self.dim)
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: PartialEq> PartialEq for SparseRowRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.indices == other.indices && self.values == other.values
    }
}

impl<T: PartialEq> PartialEq<SparseVector<T>> for SparseRowRef<'_, T> {
    fn eq(&self, other: &SparseVector<T>) -> bool {
        self.dim == other.dim() && self.indices == other.indices() && self.values == other.values()
    }
}

/// Proxy to one sparse row whose stored values are writable.
///
/// The sparsity pattern is fixed: writing to a structural zero is an error.
pub struct SparseRowValuesMut<'a, T> {
    row: usize,
    dim: usize,
    indices: &'a [usize],
    values: &'a mut [T],
}

impl<'a, T> SparseRowValuesMut<'a, T> {
    pub(crate) fn new(row: usize, dim: usize, indices: &'a [usize], values: &'a mut [T]) -> Self {
        Self {
            row,
            dim,
            indices,
            values,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        self.indices
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut *self.values
    }

    pub fn get(&self, j: usize) -> Option<&T> {
        self.indices.binary_search(&j).ok().map(|k| &self.values[k])
    }

    pub fn get_mut(&mut self, j: usize) -> Option<&mut T> {
        match self.indices.binary_search(&j) {
            Ok(k) => Some(&mut self.values[k]),
            Err(_) => None,
        }
    }

    /// Overwrite the stored value at column `j`.
    pub fn set(&mut self, j: usize, value: T) -> Result<()> {
        let row = self.row;
        match self.get_mut(j) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StorageError::StructuralZero { row, col: j }),
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter_mut())
    }

    pub fn as_row_ref(&self) -> SparseRowRef<'_, T> {
        SparseRowRef::new(self.row, self.dim, self.indices, &*self.values)
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseRowValuesMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_row_ref().fmt(f)
    }
}

impl<'a, T> From<SparseRowValuesMut<'a, T>> for SparseRowRef<'a, T> {
    fn from(row: SparseRowValuesMut<'a, T>) -> Self {
        SparseRowRef::new(row.row, row.dim, row.indices, row.values)
    }
}

/// Structural proxy to one row of a [`CompressedMatrix`].
///
/// Holds the whole matrix mutably, since inserting into one row shifts the
/// storage of every row after it.
pub struct SparseRowMut<'a, T> {
    matrix: &'a mut CompressedMatrix<T>,
    row: usize,
}

impl<'a, T> SparseRowMut<'a, T> {
    pub(crate) fn new(matrix: &'a mut CompressedMatrix<T>, row: usize) -> Self {
        Self { matrix, row }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.matrix.cols()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.row_range(self.row).len()
    }

    pub fn get(&self, j: usize) -> Option<&T> {
        self.matrix.get(self.row, j)
    }

    /// Store `value` at column `j`, inserting an entry if needed.
    pub fn set(&mut self, j: usize, value: T) -> Result<()> {
        self.matrix.insert(self.row, j, value)
    }

    pub fn remove(&mut self, j: usize) -> Option<T> {
        self.matrix.remove(self.row, j)
    }

    /// Replace the row's entries with those of `row`.
    pub fn assign(&mut self, row: &SparseVector<T>) -> Result<()>
    where
        T: Clone,
    {
        self.matrix.set_row(self.row, row)
    }

    pub fn clear(&mut self) {
        self.matrix.clear_row(self.row);
    }

    pub fn as_row_ref(&self) -> SparseRowRef<'_, T> {
        let range = self.matrix.row_range(self.row);
        SparseRowRef::new(
            self.row,
            self.matrix.cols(),
            &self.matrix.col_indices()[range.clone()],
            &self.matrix.values()[range],
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseRowMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_row_ref().fmt(f)
    }
}

impl<'a, T> From<SparseRowMut<'a, T>> for SparseRowRef<'a, T> {
    fn from(row: SparseRowMut<'a, T>) -> Self {
        let matrix: &'a CompressedMatrix<T> = row.matrix;
        let range = matrix.row_range(row.row);
        SparseRowRef::new(
            row.row,
            matrix.cols(),
            &matrix.col_indices()[range.clone()],
            &matrix.values()[range],
        )
    }
}
