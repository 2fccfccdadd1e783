//! Batch containers and tag-dispatched kernels.
//!
//! This crate picks, for an element type, the container that stores many of
//! them efficiently, and exposes the kernels that operate on those containers.
//!
//! # Batch registry
//!
//! | Element type | Container | Element access |
//! |---|---|---|
//! | [`SparseVector<T>`] | [`CompressedMatrix<T>`] (one row per element) | [`SparseRowRef`] / [`SparseRowMut`] |
//! | [`DenseVector<T>`] | [`DenseMatrix<T>`] (one row per element) | [`RowRef`] / [`RowMut`] |
//! | arithmetic scalar | [`DenseVector<T>`] | `&T` / `&mut T` |
//! | anything else | `Vec<T>` | `&T` / `&mut T` |
//!
//! Every container implements [`BatchContainer`], so generic code can walk a
//! batch of vectors without caring whether the rows live in a dense or a
//! compressed matrix.
//!
//! # Example
//!
//! ```rust
//! use batched_rs::{create_batch, Batch, BatchContainer};
//! use batched_rs::view::DenseVector;
//!
//! let xs = vec![
//!     DenseVector::from_vec(vec![1.0, 0.0, 2.0]),
//!     DenseVector::from_vec(vec![0.0, 3.0, 1.0]),
//! ];
//! let mut batch = create_batch(&xs).unwrap();
//! for (row, x) in batch.elements().zip(&xs) {
//!     assert_eq!(row, *x);
//! }
//!
//! <DenseVector<f64> as Batch>::resize(&mut batch, 4, 3);
//! assert_eq!(batch.batch_len(), 4);
//! ```
//!
//! # Kernels
//!
//! [`kernel::syrk`] and [`kernel::dot`] accept local and accelerator operands;
//! the implementation is chosen from the operands' domain and layout tags.

mod batch;
mod container;

pub use batched_device as device;
pub use batched_kernel as kernel;
pub use batched_traits::{
    Accelerator, Dense, ExecutionDomain, Local, MemoryOrder, Scalar, Sparse, StorageLayout,
};
pub use batched_view as view;
pub use batched_view::{
    CompressedMatrix, DenseMatrix, DenseVector, RowMut, RowRef, SparseRowMut, SparseRowRef,
    SparseVector,
};

pub use batch::{create_batch, Batch, ElementKind};
pub use container::BatchContainer;

/// Errors raised while building or editing batches.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("cannot infer the element shape of an empty range")]
    EmptyRange,

    #[error("element {index} has dimension {found}, expected {expected}")]
    ShapeMismatch {
        expected: usize,
        found: usize,
        index: usize,
    },

    #[error(transparent)]
    Storage(#[from] batched_view::StorageError),
}

/// Convenience alias for `Result<T, BatchError>`.
pub type Result<T> = std::result::Result<T, BatchError>;
