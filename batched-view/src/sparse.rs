//! Compressed sparse storage.

use num_traits::Zero;

use crate::dense::DenseMatrix;
use crate::iter::{SparseRowIter, SparseRowIterMut};
use crate::row::{SparseRowMut, SparseRowRef, SparseRowValuesMut};
use crate::{MemoryOrder, Result, StorageError};

/// Check that `indices` is strictly increasing and below `dim`.
pub(crate) fn validate_indices(indices: &[usize], dim: usize) -> Result<()> {
    for (k, &idx) in indices.iter().enumerate() {
        if idx >= dim {
            return Err(StorageError::IndexOutOfBounds { index: idx, bound: dim });
        }
        if k > 0 {
            let prev = indices[k - 1];
            if prev == idx {
                return Err(StorageError::DuplicateIndex(idx));
            }
            if prev > idx {
                return Err(StorageError::UnsortedIndices);
            }
        }
    }
    Ok(())
}

// ============================================================================
// SparseVector
// ============================================================================

/// Sparse vector of logical length `dim`, entries sorted by index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector<T> {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> SparseVector<T> {
    /// Empty (all-zero) vector of length `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order.
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (usize, T)>) -> Result<Self> {
        let mut pairs: Vec<(usize, T)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(idx, _)| idx);
        let (indices, values): (Vec<usize>, Vec<T>) = pairs.into_iter().unzip();
        validate_indices(&indices, dim)?;
        Ok(Self { dim, indices, values })
    }

    /// Build from already sorted parallel arrays.
    pub fn from_parts(dim: usize, indices: Vec<usize>, values: Vec<T>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(StorageError::LengthMismatch {
                expected: indices.len(),
                found: values.len(),
            });
        }
        validate_indices(&indices, dim)?;
        Ok(Self { dim, indices, values })
    }

    /// Indices must already be strictly increasing and below `dim`.
    pub(crate) fn from_sorted(dim: usize, indices: Vec<usize>, values: Vec<T>) -> Self {
        debug_assert!(validate_indices(&indices, dim).is_ok());
        Self { dim, indices, values }
    }

    /// Keep the nonzero entries of a dense slice.
    pub fn from_dense(dense: &[T]) -> Self
    where
        T: Zero + Clone,
    {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (i, v) in dense.iter().enumerate() {
            if !v.is_zero() {
                indices.push(i);
                values.push(v.clone());
            }
        }
        Self {
            dim: dense.len(),
            indices,
            values,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Stored entry at `i`, `None` for a structural zero.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.indices.binary_search(&i).ok().map(|k| &self.values[k])
    }

    /// Stored entries as `(index, &value)`.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> + ExactSizeIterator + '_ {
        self.indices.iter().copied().zip(self.values.iter())
    }

    /// Store `value` at `i`, inserting an entry if needed.
    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        if i >= self.dim {
            return Err(StorageError::IndexOutOfBounds { index: i, bound: self.dim });
        }
        match self.indices.binary_search(&i) {
            Ok(k) => self.values[k] = value,
            Err(k) => {
                self.indices.insert(k, i);
                self.values.insert(k, value);
            }
        }
        Ok(())
    }

    /// Change the logical length, dropping entries at or past `dim`.
    pub fn resize(&mut self, dim: usize) {
        let keep = self.indices.partition_point(|&idx| idx < dim);
        self.indices.truncate(keep);
        self.values.truncate(keep);
        self.dim = dim;
    }

    pub fn to_dense(&self) -> Vec<T>
    where
        T: Zero + Clone,
    {
        let mut out = vec![T::zero(); self.dim];
        for (i, v) in self.iter() {
            out[i] = v.clone();
        }
        out
    }
}

// ============================================================================
// CompressedMatrix
// ============================================================================

/// Compressed sparse row (CSR) matrix.
///
/// Row `i` owns entries `row_ptr[i]..row_ptr[i + 1]` of `indices` and
/// `values`; column indices within a row are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMatrix<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> CompressedMatrix<T> {
    /// All-zero `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_capacity(rows, cols, 0)
    }

    /// All-zero matrix with room for `nnz` entries.
    pub fn with_capacity(rows: usize, cols: usize, nnz: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            indices: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    /// Build from raw CSR arrays.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        row_ptr: Vec<usize>,
        indices: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        if row_ptr.len() != rows + 1 {
            return Err(StorageError::LengthMismatch {
                expected: rows + 1,
                found: row_ptr.len(),
            });
        }
        if indices.len() != values.len() {
            return Err(StorageError::LengthMismatch {
                expected: indices.len(),
                found: values.len(),
            });
        }
        if row_ptr[0] != 0 || row_ptr[rows] != indices.len() {
            return Err(StorageError::ShapeMismatch(
                vec![row_ptr[0], row_ptr[rows]],
                vec![0, indices.len()],
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(StorageError::UnsortedIndices);
        }
        for w in row_ptr.windows(2) {
            validate_indices(&indices[w[0]..w[1]], cols)?;
        }
        Ok(Self {
            rows,
            cols,
            row_ptr,
            indices,
            values,
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

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Entries that fit without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.indices.capacity().min(self.values.capacity())
    }

    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve(additional);
        self.values.reserve(additional);
    }

    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    #[inline]
    pub fn col_indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Stored values; the sparsity pattern stays fixed.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    #[inline]
    pub(crate) fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.row_ptr[i]..self.row_ptr[i + 1]
    }

    /// Stored entry `(i, j)`, `None` for a structural zero or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i >= self.rows {
            return None;
        }
        let range = self.row_range(i);
        let start = range.start;
        self.indices[range]
            .binary_search(&j)
            .ok()
            .map(|k| &self.values[start + k])
    }

    /// Proxy reference to row `i`.
    pub fn row(&self, i: usize) -> Option<SparseRowRef<'_, T>> {
        if i >= self.rows {
            return None;
        }
        let range = self.row_range(i);
        Some(SparseRowRef::new(
            i,
            self.cols,
            &self.indices[range.clone()],
            &self.values[range],
        ))
    }

    /// Structural proxy to row `i`: may insert and remove entries.
    pub fn row_mut(&mut self, i: usize) -> Option<SparseRowMut<'_, T>> {
        if i >= self.rows {
            return None;
        }
        Some(SparseRowMut::new(self, i))
    }

    /// Value-only proxy to row `i`: stored values are writable, the pattern is fixed.
    pub fn row_values_mut(&mut self, i: usize) -> Option<SparseRowValuesMut<'_, T>> {
        if i >= self.rows {
            return None;
        }
        let range = self.row_range(i);
        Some(SparseRowValuesMut::new(
            i,
            self.cols,
            &self.indices[range.clone()],
            &mut self.values[range],
        ))
    }

    pub fn iter_rows(&self) -> SparseRowIter<'_, T> {
        SparseRowIter::new(self)
    }

    pub fn iter_rows_mut(&mut self) -> SparseRowIterMut<'_, T> {
        SparseRowIterMut::new(self.cols, &self.row_ptr, &self.indices, &mut self.values)
    }

    /// Replace the entries of row `i` with sorted `(indices, values)`.
    pub(crate) fn replace_row(&mut self, i: usize, indices: &[usize], values: &[T]) -> Result<()>
    where
        T: Clone,
    {
        if i >= self.rows {
            return Err(StorageError::IndexOutOfBounds { index: i, bound: self.rows });
        }
        if indices.len() != values.len() {
            return Err(StorageError::LengthMismatch {
                expected: indices.len(),
                found: values.len(),
            });
        }
        validate_indices(indices, self.cols)?;

        let range = self.row_range(i);
        let old = range.len();
        self.indices.splice(range.clone(), indices.iter().copied());
        self.values.splice(range, values.iter().cloned());
        let new = indices.len();
        if new != old {
            for p in &mut self.row_ptr[i + 1..] {
                *p = *p + new - old;
            }
        }
        Ok(())
    }

    /// Assign a sparse vector to row `i`; its dimension must equal `cols()`.
    pub fn set_row(&mut self, i: usize, row: &SparseVector<T>) -> Result<()>
    where
        T: Clone,
    {
        if row.dim() != self.cols {
            return Err(StorageError::LengthMismatch {
                expected: self.cols,
                found: row.dim(),
            });
        }
        self.replace_row(i, row.indices(), row.values())
    }

    /// Store `value` at `(i, j)`, inserting an entry if needed.
    pub fn insert(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        if i >= self.rows {
            return Err(StorageError::IndexOutOfBounds { index: i, bound: self.rows });
        }
        if j >= self.cols {
            return Err(StorageError::IndexOutOfBounds { index: j, bound: self.cols });
        }
        let range = self.row_range(i);
        let start = range.start;
        match self.indices[range].binary_search(&j) {
            Ok(k) => self.values[start + k] = value,
            Err(k) => {
                self.indices.insert(start + k, j);
                self.values.insert(start + k, value);
                for p in &mut self.row_ptr[i + 1..] {
                    *p += 1;
                }
            }
        }
        Ok(())
    }

    /// Remove the stored entry at `(i, j)`, returning it.
    pub fn remove(&mut self, i: usize, j: usize) -> Option<T> {
        if i >= self.rows {
            return None;
        }
        let range = self.row_range(i);
        let start = range.start;
        let k = self.indices[range].binary_search(&j).ok()?;
        self.indices.remove(start + k);
        let value = self.values.remove(start + k);
        for p in &mut self.row_ptr[i + 1..] {
            *p -= 1;
        }
        Some(value)
    }

    /// Drop every stored entry of row `i`.
    pub fn clear_row(&mut self, i: usize) {
        if i >= self.rows {
            return;
        }
        let range = self.row_range(i);
        let removed = range.len();
        self.indices.drain(range.clone());
        self.values.drain(range);
        for p in &mut self.row_ptr[i + 1..] {
            *p -= removed;
        }
    }

    /// Resize to `rows x cols`.
    ///
    /// Entries inside the new bounds are kept; entries in dropped rows or at
    /// columns `>= cols` are discarded.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows < self.rows {
            let end = self.row_ptr[rows];
            self.row_ptr.truncate(rows + 1);
            self.indices.truncate(end);
            self.values.truncate(end);
        } else if rows > self.rows {
            let end = self.row_ptr[self.rows];
            self.row_ptr.resize(rows + 1, end);
        }
        self.rows = rows;

        if cols < self.cols {
            let mut write = 0;
            let mut start = 0;
            for i in 0..rows {
                let end = self.row_ptr[i + 1];
                for read in start..end {
                    if self.indices[read] < cols {
                        self.indices.swap(write, read);
                        self.values.swap(write, read);
                        write += 1;
                    }
                }
                start = end;
                self.row_ptr[i + 1] = write;
            }
            self.indices.truncate(write);
            self.values.truncate(write);
        }
        self.cols = cols;
    }

    /// Dense copy with explicit zeros.
    pub fn to_dense(&self, order: MemoryOrder) -> DenseMatrix<T>
    where
        T: Zero + Clone,
    {
        DenseMatrix::from_fn(self.rows, self.cols, order, |i, j| {
            self.get(i, j).cloned().unwrap_or_else(T::zero)
        })
    }
}

impl<'a, T> IntoIterator for &'a CompressedMatrix<T> {
    type Item = SparseRowRef<'a, T>;
    type IntoIter = SparseRowIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_rows()
    }
}

impl<'a, T> IntoIterator for &'a mut CompressedMatrix<T> {
    type Item = SparseRowValuesMut<'a, T>;
    type IntoIter = SparseRowIterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_rows_mut()
    }
}
