//! Compile-time tags describing where an expression executes and how it is stored.
//!
//! Kernels are selected by implementing dispatch traits for tuples of these
//! tags, e.g. `(Local, Dense)` or `(Accelerator, Dense)`. A combination
//! without an implementation is rejected by the compiler, so mixing a local
//! operand with an accelerator operand never reaches run time.

use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Local {}
    impl Sealed for super::Accelerator {}
    impl Sealed for super::Dense {}
    impl Sealed for super::Sparse {}
}

/// Execution venue of an expression.
pub trait ExecutionDomain: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    /// Name used in diagnostics and log records.
    const NAME: &'static str;
}

/// Storage layout (evaluation category) of an expression.
pub trait StorageLayout: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    /// Name used in diagnostics and log records.
    const NAME: &'static str;
}

/// Host processor, data lives in host memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Local;

/// Accelerator device, data lives in device buffers owned by a command queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Accelerator;

/// Every element is stored explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dense;

/// Only nonzero elements are stored, in compressed form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sparse;

impl ExecutionDomain for Local {
    const NAME: &'static str = "local";
}

impl ExecutionDomain for Accelerator {
    const NAME: &'static str = "accelerator";
}

impl StorageLayout for Dense {
    const NAME: &'static str = "dense";
}

impl StorageLayout for Sparse {
    const NAME: &'static str = "sparse";
}

/// Memory orientation of dense matrix storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryOrder {
    /// Row-major (C-style): rows are contiguous.
    #[default]
    RowMajor,
    /// Column-major (Fortran-style): columns are contiguous.
    ColMajor,
}

impl MemoryOrder {
    /// The opposite orientation.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            MemoryOrder::RowMajor => MemoryOrder::ColMajor,
            MemoryOrder::ColMajor => MemoryOrder::RowMajor,
        }
    }

    /// Strides `[row_stride, col_stride]` of a packed `rows x cols` matrix.
    #[inline]
    pub fn strides(self, rows: usize, cols: usize) -> [usize; 2] {
        match self {
            MemoryOrder::RowMajor => [cols, 1],
            MemoryOrder::ColMajor => [1, rows],
        }
    }

    /// Leading dimension of a packed `rows x cols` matrix, never below 1.
    #[inline]
    pub fn leading_dimension(self, rows: usize, cols: usize) -> usize {
        match self {
            MemoryOrder::RowMajor => cols.max(1),
            MemoryOrder::ColMajor => rows.max(1),
        }
    }
}
