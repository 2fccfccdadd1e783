//! Dense and sparse storage with zero-copy row proxies.
//!
//! The containers in this crate are the storage collaborators of the batch
//! registry: they hold many logical elements in one allocation and hand out
//! proxy references to individual rows.
//!
//! # Core Types
//!
//! - [`DenseVector`] / [`DenseMatrix`]: packed dense storage (row- or column-major)
//! - [`SparseVector`] / [`CompressedMatrix`]: compressed sparse storage (CSR)
//! - [`VectorView`] / [`VectorViewMut`]: strided 1D views over existing data
//! - [`RowRef`] / [`RowMut`], [`SparseRowRef`] / [`SparseRowMut`] /
//!   [`SparseRowValuesMut`]: proxy references to one matrix row
//! - [`RowIter`] / [`RowIterMut`], [`SparseRowIter`] / [`SparseRowIterMut`]:
//!   proxy iterators producing row references on demand
//!
//! # Example
//!
//! ```rust
//! use batched_view::{DenseMatrix, MemoryOrder};
//!
//! let m = DenseMatrix::from_fn(3, 4, MemoryOrder::ColMajor, |i, j| (i * 4 + j) as f64);
//!
//! // A column-major matrix still iterates as a sequence of row vectors.
//! let rows: Vec<Vec<f64>> = m.iter_rows().map(|r| r.to_vec()).collect();
//! assert_eq!(rows[1], vec![4.0, 5.0, 6.0, 7.0]);
//! ```

mod dense;
mod iter;
mod row;
mod sparse;
pub mod view;

pub use batched_traits::MemoryOrder;

pub use dense::{DenseMatrix, DenseVector};
pub use iter::{RowIter, RowIterMut, SparseRowIter, SparseRowIterMut};
pub use row::{RowMut, RowRef, SparseRowMut, SparseRowRef, SparseRowValuesMut};
pub use sparse::{CompressedMatrix, SparseVector};
pub use view::{StridedIter, StridedIterMut, VectorView, VectorViewMut};

/// Errors that can occur while building or editing storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A vector or row has the wrong number of elements.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// An index lies outside `[0, bound)`.
    #[error("index {index} out of bounds for size {bound}")]
    IndexOutOfBounds { index: usize, bound: usize },

    /// Integer overflow while computing a storage offset.
    #[error("offset overflow while computing storage span")]
    OffsetOverflow,

    /// A sparse index appears more than once.
    #[error("duplicate sparse index {0}")]
    DuplicateIndex(usize),

    /// Sparse indices are not strictly increasing.
    #[error("sparse indices are not sorted")]
    UnsortedIndices,

    /// A value-only sparse reference was asked to write a structural zero.
    #[error("entry ({row}, {col}) is not stored")]
    StructuralZero { row: usize, col: usize },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
