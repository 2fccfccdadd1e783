//! Uniform element access over the physical batch layouts.

use batched_traits::Scalar;
use batched_view::{
    CompressedMatrix, DenseMatrix, DenseVector, RowIter, RowIterMut, RowMut, RowRef,
    SparseRowIter, SparseRowIterMut, SparseRowMut, SparseRowRef, SparseVector, StorageError,
};

use crate::{BatchError, Result};

/// A bulk container seen as a sequence of logical elements.
///
/// `Ref` and `Mut` may be proxies: a dense vector stored as a matrix row is
/// handed out as a [`RowRef`] / [`RowMut`], never as `&DenseVector`.
/// Items of `IterMut` may be narrower than `Mut` (sparse rows only allow value
/// writes while the whole batch is being iterated).
pub trait BatchContainer {
    /// Owned form of one logical element.
    type Element;

    type Ref<'a>
    where
        Self: 'a;

    type Mut<'a>
    where
        Self: 'a;

    type Iter<'a>: DoubleEndedIterator<Item = Self::Ref<'a>> + ExactSizeIterator
    where
        Self: 'a;

    type IterMut<'a>: DoubleEndedIterator + ExactSizeIterator
    where
        Self: 'a;

    /// Number of logical elements.
    fn batch_len(&self) -> usize;

    /// Shared per-element dimensionality; `1` for scalar and opaque elements.
    fn element_dim(&self) -> usize;

    fn element(&self, i: usize) -> Option<Self::Ref<'_>>;

    fn element_mut(&mut self, i: usize) -> Option<Self::Mut<'_>>;

    /// Copy element `i` out of the container.
    fn element_owned(&self, i: usize) -> Option<Self::Element>;

    /// Overwrite element `i` with `value`.
    fn set_element(&mut self, i: usize, value: &Self::Element) -> Result<()>;

    fn elements(&self) -> Self::Iter<'_>;

    fn elements_mut(&mut self) -> Self::IterMut<'_>;
}

fn out_of_bounds(index: usize, bound: usize) -> BatchError {
    StorageError::IndexOutOfBounds { index, bound }.into()
}

// Opaque elements: one slot per element.
impl<T: Clone> BatchContainer for Vec<T> {
    type Element = T;
    type Ref<'a> = &'a T where Self: 'a;
    type Mut<'a> = &'a mut T where Self: 'a;
    type Iter<'a> = std::slice::Iter<'a, T> where Self: 'a;
    type IterMut<'a> = std::slice::IterMut<'a, T> where Self: 'a;

    fn batch_len(&self) -> usize {
        self.len()
    }

    fn element_dim(&self) -> usize {
        1
    }

    fn element(&self, i: usize) -> Option<&T> {
        self.get(i)
    }

    fn element_mut(&mut self, i: usize) -> Option<&mut T> {
        self.get_mut(i)
    }

    fn element_owned(&self, i: usize) -> Option<T> {
        self.get(i).cloned()
    }

    fn set_element(&mut self, i: usize, value: &T) -> Result<()> {
        let bound = self.len();
        let slot = self.get_mut(i).ok_or_else(|| out_of_bounds(i, bound))?;
        *slot = value.clone();
        Ok(())
    }

    fn elements(&self) -> std::slice::Iter<'_, T> {
        self.iter()
    }

    fn elements_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.iter_mut()
    }
}

// Scalars: a numeric vector.
impl<T: Scalar> BatchContainer for DenseVector<T> {
    type Element = T;
    type Ref<'a> = &'a T;
    type Mut<'a> = &'a mut T;
    type Iter<'a> = std::slice::Iter<'a, T>;
    type IterMut<'a> = std::slice::IterMut<'a, T>;

    fn batch_len(&self) -> usize {
        self.len()
    }

    fn element_dim(&self) -> usize {
        1
    }

    fn element(&self, i: usize) -> Option<&T> {
        self.get(i)
    }

    fn element_mut(&mut self, i: usize) -> Option<&mut T> {
        self.get_mut(i)
    }

    fn element_owned(&self, i: usize) -> Option<T> {
        self.get(i).copied()
    }

    fn set_element(&mut self, i: usize, value: &T) -> Result<()> {
        let bound = self.len();
        let slot = self.get_mut(i).ok_or_else(|| out_of_bounds(i, bound))?;
        *slot = *value;
        Ok(())
    }

    fn elements(&self) -> std::slice::Iter<'_, T> {
        self.iter()
    }

    fn elements_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.iter_mut()
    }
}

// Dense vectors: matrix rows.
impl<T: Scalar> BatchContainer for DenseMatrix<T> {
    type Element = DenseVector<T>;
    type Ref<'a> = RowRef<'a, T>;
    type Mut<'a> = RowMut<'a, T>;
    type Iter<'a> = RowIter<'a, T>;
    type IterMut<'a> = RowIterMut<'a, T>;

    fn batch_len(&self) -> usize {
        self.rows()
    }

    fn element_dim(&self) -> usize {
        self.cols()
    }

    fn element(&self, i: usize) -> Option<RowRef<'_, T>> {
        self.row(i)
    }

    fn element_mut(&mut self, i: usize) -> Option<RowMut<'_, T>> {
        self.row_mut(i)
    }

    fn element_owned(&self, i: usize) -> Option<DenseVector<T>> {
        self.row(i).map(|r| r.to_vector())
    }

    fn set_element(&mut self, i: usize, value: &DenseVector<T>) -> Result<()> {
        let cols = self.cols();
        if value.len() != cols {
            return Err(BatchError::ShapeMismatch {
                expected: cols,
                found: value.len(),
                index: i,
            });
        }
        let bound = self.rows();
        let mut row = self.row_mut(i).ok_or_else(|| out_of_bounds(i, bound))?;
        row.assign(value.as_slice())?;
        Ok(())
    }

    fn elements(&self) -> RowIter<'_, T> {
        self.iter_rows()
    }

    fn elements_mut(&mut self) -> RowIterMut<'_, T> {
        self.iter_rows_mut()
    }
}

// Sparse vectors: compressed matrix rows.
impl<T: Scalar> BatchContainer for CompressedMatrix<T> {
    type Element = SparseVector<T>;
    type Ref<'a> = SparseRowRef<'a, T>;
    type Mut<'a> = SparseRowMut<'a, T>;
    type Iter<'a> = SparseRowIter<'a, T>;
    type IterMut<'a> = SparseRowIterMut<'a, T>;

    fn batch_len(&self) -> usize {
        self.rows()
    }

    fn element_dim(&self) -> usize {
        self.cols()
    }

    fn element(&self, i: usize) -> Option<SparseRowRef<'_, T>> {
        self.row(i)
    }

    fn element_mut(&mut self, i: usize) -> Option<SparseRowMut<'_, T>> {
        self.row_mut(i)
    }

    fn element_owned(&self, i: usize) -> Option<SparseVector<T>> {
        self.row(i).map(|r| r.to_sparse_vector())
    }

    fn set_element(&mut self, i: usize, value: &SparseVector<T>) -> Result<()> {
        let cols = self.cols();
        if value.dim() != cols {
            return Err(BatchError::ShapeMismatch {
                expected: cols,
                found: value.dim(),
                index: i,
            });
        }
        self.set_row(i, value)?;
        Ok(())
    }

    fn elements(&self) -> SparseRowIter<'_, T> {
        self.iter_rows()
    }

    fn elements_mut(&mut self) -> SparseRowIterMut<'_, T> {
        self.iter_rows_mut()
    }
}
