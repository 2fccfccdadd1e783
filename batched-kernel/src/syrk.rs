//! Symmetric rank-k update `C <- C + alpha * A * A^T`.

use batched_device::{DeviceMatrix, Event, Transpose, Triangle};
use batched_traits::{Accelerator, Dense, ExecutionDomain, Local, Scalar, Sparse, StorageLayout};
use batched_view::{CompressedMatrix, DenseMatrix};
use log::debug;

use crate::backend::{AcceleratorBlas, ActiveAccelerator};
use crate::expr::{Evaluate, MatrixExpression};
use crate::{local, KernelError, Pending, Result};

/// One rank-k update implementation, selected by the `(Domain, Category)`
/// tags of the left operand.
///
/// Implementations may assume that the shape preconditions checked by
/// [`syrk_with_backend`] hold.
pub trait SyrkKernel<A: MatrixExpression, C> {
    fn syrk<B: AcceleratorBlas<A::Elem>>(
        a: &A,
        c: &mut C,
        alpha: A::Elem,
        triangle: Triangle,
    ) -> Result<Pending>;
}

impl<A, T> SyrkKernel<A, DenseMatrix<T>> for (Local, Dense)
where
    T: Scalar,
    A: Evaluate<Elem = T, Domain = Local, Category = Dense, Evaluated = DenseMatrix<T>>,
{
    fn syrk<B: AcceleratorBlas<T>>(
        a: &A,
        c: &mut DenseMatrix<T>,
        alpha: T,
        triangle: Triangle,
    ) -> Result<Pending> {
        let a = a.evaluate();
        local::syrk_dense(&a, c, alpha, triangle);
        Ok(Pending::ready())
    }
}

impl<A, T> SyrkKernel<A, DenseMatrix<T>> for (Local, Sparse)
where
    T: Scalar,
    A: Evaluate<Elem = T, Domain = Local, Category = Sparse, Evaluated = CompressedMatrix<T>>,
{
    fn syrk<B: AcceleratorBlas<T>>(
        a: &A,
        c: &mut DenseMatrix<T>,
        alpha: T,
        triangle: Triangle,
    ) -> Result<Pending> {
        let a = a.evaluate();
        local::syrk_sparse(&a, c, alpha, triangle);
        Ok(Pending::ready())
    }
}

impl<A, T> SyrkKernel<A, DeviceMatrix<T>> for (Accelerator, Dense)
where
    T: Scalar,
    A: Evaluate<Elem = T, Domain = Accelerator, Category = Dense, Evaluated = DeviceMatrix<T>>,
{
    fn syrk<B: AcceleratorBlas<T>>(
        a: &A,
        c: &mut DeviceMatrix<T>,
        alpha: T,
        triangle: Triangle,
    ) -> Result<Pending> {
        let a = a.evaluate();
        let n = c.rows();
        let k = a.cols();
        if n == 0 || k == 0 {
            return Ok(Pending::ready());
        }

        // A stored in the other orientation reads as A^T in C's layout.
        let transpose = if a.order() == c.order() {
            Transpose::No
        } else {
            Transpose::Yes
        };
        let layout = c.order();
        debug!(
            "syrk[{}]: layout={:?} transpose={:?} n={} k={}",
            B::NAME,
            layout,
            transpose,
            n,
            k
        );

        // TODO: keep events per queue once out-of-order queues are supported.
        let mut event = Event::default();
        let status = B::syrk(
            layout,
            triangle,
            transpose,
            n,
            k,
            alpha,
            &a.raw_storage(),
            T::one(),
            &c.raw_storage(),
            c.queue(),
            Some(&mut event),
        );
        if !status.is_success() {
            return Err(KernelError::Backend(status));
        }
        Ok(Pending::new(event))
    }
}

/// Rank-k update `C <- C + alpha * A * A^T` on the active backend.
///
/// Only the `triangle` part of `C` is written. `C` must be dense, square and
/// have as many rows as `A`; accelerator operands must share a command queue.
/// Accelerator updates are asynchronous: wait on the returned [`Pending`]
/// before reading `C`.
pub fn syrk<A, C>(a: &A, c: &mut C, alpha: A::Elem, triangle: Triangle) -> Result<Pending>
where
    A: MatrixExpression,
    C: MatrixExpression<Elem = A::Elem, Domain = A::Domain, Category = Dense>,
    (A::Domain, A::Category): SyrkKernel<A, C>,
    ActiveAccelerator: AcceleratorBlas<A::Elem>,
{
    syrk_with_backend::<ActiveAccelerator, A, C>(a, c, alpha, triangle)
}

/// [`syrk`] with an explicit accelerator backend.
pub fn syrk_with_backend<B, A, C>(
    a: &A,
    c: &mut C,
    alpha: A::Elem,
    triangle: Triangle,
) -> Result<Pending>
where
    B: AcceleratorBlas<A::Elem>,
    A: MatrixExpression,
    C: MatrixExpression<Elem = A::Elem, Domain = A::Domain, Category = Dense>,
    (A::Domain, A::Category): SyrkKernel<A, C>,
{
    if a.rows() != c.rows() {
        return Err(KernelError::RowMismatch {
            a_rows: a.rows(),
            c_rows: c.rows(),
        });
    }
    if c.rows() != c.cols() {
        return Err(KernelError::NonSquare {
            rows: c.rows(),
            cols: c.cols(),
        });
    }
    if let (Some(qa), Some(qc)) = (a.queue(), c.queue()) {
        if !qa.same_queue(qc) {
            return Err(KernelError::QueueMismatch);
        }
    }

    debug!(
        "syrk: {} {} A={}x{} triangle={:?}",
        <A::Domain as ExecutionDomain>::NAME,
        <A::Category as StorageLayout>::NAME,
        a.rows(),
        a.cols(),
        triangle
    );
    <(A::Domain, A::Category) as SyrkKernel<A, C>>::syrk::<B>(a, c, alpha, triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scaled;
    use batched_device::CommandQueue;
    use batched_traits::MemoryOrder;

    fn a_2x3(order: MemoryOrder) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(2, 3, order, |i, j| (i * 3 + j + 1) as f64)
    }

    // A A^T for a_2x3 = [[14, 32], [32, 77]]

    #[test]
    fn test_local_dense_upper() {
        let a = a_2x3(MemoryOrder::RowMajor);
        let mut c = DenseMatrix::<f64>::new(2, 2);
        syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
        assert_eq!(c[[0, 0]], 14.0);
        assert_eq!(c[[0, 1]], 32.0);
        assert_eq!(c[[1, 1]], 77.0);
        assert_eq!(c[[1, 0]], 0.0);
    }

    #[test]
    fn test_local_accumulates() {
        let a = a_2x3(MemoryOrder::ColMajor);
        let mut c = DenseMatrix::from_fn(2, 2, MemoryOrder::RowMajor, |_, _| 1.0);
        syrk(&a, &mut c, 2.0, Triangle::Lower).unwrap().wait().unwrap();
        assert_eq!(c[[0, 0]], 29.0);
        assert_eq!(c[[1, 0]], 65.0);
        assert_eq!(c[[1, 1]], 155.0);
        assert_eq!(c[[0, 1]], 1.0);
    }

    #[test]
    fn test_local_scaled_operand() {
        let a = a_2x3(MemoryOrder::RowMajor);
        let mut c = DenseMatrix::<f64>::new(2, 2);
        syrk(&Scaled::new(&a, 2.0), &mut c, 1.0, Triangle::Upper)
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(c[[0, 1]], 128.0);
    }

    #[test]
    fn test_local_sparse() {
        let mut a = CompressedMatrix::new(2, 3);
        a.insert(0, 0, 1.0).unwrap();
        a.insert(0, 2, 3.0).unwrap();
        a.insert(1, 2, 6.0).unwrap();
        let mut c = DenseMatrix::<f64>::new(2, 2);
        syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
        assert_eq!(c[[0, 0]], 10.0);
        assert_eq!(c[[0, 1]], 18.0);
        assert_eq!(c[[1, 1]], 36.0);
    }

    #[test]
    fn test_shape_errors() {
        let a = a_2x3(MemoryOrder::RowMajor);
        let mut tall: DenseMatrix<f64> = DenseMatrix::new(3, 3);
        assert!(matches!(
            syrk(&a, &mut tall, 1.0, Triangle::Upper),
            Err(KernelError::RowMismatch { a_rows: 2, c_rows: 3 })
        ));
        let mut wide: DenseMatrix<f64> = DenseMatrix::new(2, 3);
        assert!(matches!(
            syrk(&a, &mut wide, 1.0, Triangle::Upper),
            Err(KernelError::NonSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_device_transposed_orientation() {
        let queue = CommandQueue::new().unwrap();
        let a = DeviceMatrix::from_host(&queue, &a_2x3(MemoryOrder::ColMajor));
        let mut c = DeviceMatrix::zeros(&queue, 2, 2, MemoryOrder::RowMajor);
        syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
        let host = c.to_host().unwrap();
        assert_eq!(host[[0, 0]], 14.0);
        assert_eq!(host[[0, 1]], 32.0);
        assert_eq!(host[[1, 1]], 77.0);
    }

    #[test]
    fn test_device_queue_mismatch() {
        let q1 = CommandQueue::new().unwrap();
        let q2 = CommandQueue::new().unwrap();
        let a = DeviceMatrix::from_host(&q1, &a_2x3(MemoryOrder::RowMajor));
        let mut c = DeviceMatrix::zeros(&q2, 2, 2, MemoryOrder::RowMajor);
        assert!(matches!(
            syrk(&a, &mut c, 1.0, Triangle::Upper),
            Err(KernelError::QueueMismatch)
        ));
    }

    #[test]
    fn test_device_empty_inner_dimension_is_noop() {
        let queue = CommandQueue::new().unwrap();
        let a = DeviceMatrix::<f64>::zeros(&queue, 2, 0, MemoryOrder::RowMajor);
        let mut c = DeviceMatrix::zeros(&queue, 2, 2, MemoryOrder::RowMajor);
        let pending = syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap();
        assert!(pending.is_complete());
    }
}
