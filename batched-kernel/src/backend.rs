//! Accelerator backend abstraction.
//!
//! This module defines the [`AcceleratorBlas`] trait, a marker struct for each
//! backend, and the [`ActiveAccelerator`] type alias that is the single point
//! of backend selection for accelerator-domain kernels.

use batched_device::{
    CommandQueue, Event, MemoryOrder, RawStorage, RawVector, StatusCode, Transpose, Triangle,
};
use batched_traits::Scalar;

/// BLAS entry points of an accelerator runtime.
///
/// Implementations receive raw storage descriptors and report failures as a
/// [`StatusCode`]. Test doubles implement this trait and are passed to
/// [`syrk_with_backend`](crate::syrk_with_backend) /
/// [`dot_with_backend`](crate::dot_with_backend).
pub trait AcceleratorBlas<T: Scalar> {
    /// Backend name used in log records.
    const NAME: &'static str;

    /// `C <- alpha * op(A) * op(A)^T + beta * C` on the given triangle, enqueued on `queue`.
    fn syrk(
        layout: MemoryOrder,
        triangle: Triangle,
        transpose: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &RawStorage<T>,
        beta: T,
        c: &RawStorage<T>,
        queue: &CommandQueue,
        event: Option<&mut Event>,
    ) -> StatusCode;

    /// `init + sum_i x[i] * y[i]`, returned once the queue has executed it.
    fn inner_product(
        n: usize,
        x: &RawVector<T>,
        y: &RawVector<T>,
        init: T,
        queue: &CommandQueue,
    ) -> Result<T, StatusCode>;
}

/// The emulated device runtime in `batched-device`.
pub struct HostBlas;

impl<T: Scalar> AcceleratorBlas<T> for HostBlas {
    const NAME: &'static str = "host";

    fn syrk(
        layout: MemoryOrder,
        triangle: Triangle,
        transpose: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &RawStorage<T>,
        beta: T,
        c: &RawStorage<T>,
        queue: &CommandQueue,
        event: Option<&mut Event>,
    ) -> StatusCode {
        batched_device::syrk(layout, triangle, transpose, n, k, alpha, a, beta, c, queue, event)
    }

    fn inner_product(
        n: usize,
        x: &RawVector<T>,
        y: &RawVector<T>,
        init: T,
        queue: &CommandQueue,
    ) -> Result<T, StatusCode> {
        batched_device::inner_product(n, x, y, init, queue)
    }
}

/// The accelerator backend used by [`syrk`](crate::syrk) and [`dot`](crate::dot).
pub type ActiveAccelerator = HostBlas;
