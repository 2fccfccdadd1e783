//! Emulated accelerator runtime.
//!
//! A stand-in for a GPU compute runtime that keeps the same contract:
//! device tensors live in buffers owned by a [`CommandQueue`], work is
//! submitted as commands that execute asynchronously and in order, and every
//! command completes an [`Event`] with a [`StatusCode`].
//!
//! # Example
//!
//! ```rust
//! use batched_device::{inner_product, CommandQueue, DeviceVector};
//!
//! let queue = CommandQueue::new().unwrap();
//! let x = DeviceVector::from_host(&queue, &[1.0, 2.0, 3.0]);
//! let y = DeviceVector::from_host(&queue, &[1.0, 1.0, 1.0]);
//! let dot = inner_product(x.len(), &x.raw(), &y.raw(), 0.0, &queue).unwrap();
//! assert_eq!(dot, 6.0);
//! ```

mod blas;
mod buffer;
mod queue;
mod status;

pub use batched_traits::MemoryOrder;

pub use blas::{inner_product, syrk, Transpose, Triangle};
pub use buffer::{DeviceBuffer, DeviceMatrix, DeviceVector, RawStorage, RawVector};
pub use queue::{CommandQueue, DeviceConfig, Event};
pub use status::StatusCode;

/// Errors raised by device-side operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to start queue worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("device command failed: {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Storage(#[from] batched_view::StorageError),
}

/// Convenience alias for `Result<T, DeviceError>`.
pub type Result<T> = std::result::Result<T, DeviceError>;
