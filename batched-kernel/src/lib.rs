//! Tag-dispatched linear-algebra kernels.
//!
//! Operands are [`MatrixExpression`]s and [`VectorExpression`]s carrying
//! two compile-time tags: the execution domain (`Local` or `Accelerator`)
//! and the storage layout (`Dense` or `Sparse`). Each supported tag
//! combination implements [`SyrkKernel`] or [`DotKernel`]; unsupported or
//! mixed-domain combinations fail to compile.
//!
//! Shape and queue preconditions are checked at run time before anything is
//! handed to a backend.
//!
//! # Example
//!
//! ```
//! use batched_kernel::{dot, syrk, Triangle};
//! use batched_view::{DenseMatrix, DenseVector, MemoryOrder};
//!
//! let a = DenseMatrix::from_fn(2, 3, MemoryOrder::RowMajor, |i, j| (i + j) as f64);
//! let mut c = DenseMatrix::<f64>::new(2, 2);
//! syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
//! assert_eq!(c[[0, 1]], 8.0);
//!
//! let x = DenseVector::from_vec(vec![1.0, 2.0, 3.0]);
//! assert_eq!(dot(&x, &x).unwrap(), 14.0);
//! ```

mod backend;
mod dot;
mod expr;
mod local;
mod pending;
mod syrk;

pub use batched_device::{StatusCode, Transpose, Triangle};

pub use backend::{AcceleratorBlas, ActiveAccelerator, HostBlas};
pub use dot::{dot, dot_with_backend, DotKernel};
pub use expr::{
    DeviceAccess, DenseAccess, Evaluate, MatrixExpression, Scaled, SparseAccess, VectorExpression,
};
pub use pending::Pending;
pub use syrk::{syrk, syrk_with_backend, SyrkKernel};

/// Errors raised by kernel dispatch.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("row count mismatch: A has {a_rows} rows, C has {c_rows}")]
    RowMismatch { a_rows: usize, c_rows: usize },

    #[error("output must be square, got {rows}x{cols}")]
    NonSquare { rows: usize, cols: usize },

    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("operands live on different command queues")]
    QueueMismatch,

    #[error("backend call failed: {0}")]
    Backend(StatusCode),

    #[error(transparent)]
    Storage(#[from] batched_view::StorageError),

    #[error(transparent)]
    Device(#[from] batched_device::DeviceError),
}

/// Convenience alias for `Result<T, KernelError>`.
pub type Result<T> = std::result::Result<T, KernelError>;
