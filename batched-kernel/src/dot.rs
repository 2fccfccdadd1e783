//! Dot product `x . y`.

use batched_traits::{Accelerator, Dense, ExecutionDomain, Local, Scalar, Sparse, StorageLayout};
use log::debug;

use crate::backend::{AcceleratorBlas, ActiveAccelerator};
use crate::expr::{DenseAccess, DeviceAccess, SparseAccess, VectorExpression};
use crate::{local, KernelError, Result};

/// One dot product implementation, selected by
/// `(Domain, X::Category, Y::Category)`.
pub trait DotKernel<X: VectorExpression, Y> {
    fn dot<B: AcceleratorBlas<X::Elem>>(x: &X, y: &Y) -> Result<X::Elem>;
}

impl<X, Y, T> DotKernel<X, Y> for (Local, Dense, Dense)
where
    T: Scalar,
    X: DenseAccess<Elem = T>,
    Y: DenseAccess<Elem = T>,
{
    fn dot<B: AcceleratorBlas<T>>(x: &X, y: &Y) -> Result<T> {
        Ok(local::dense_dot(x.dense_view(), y.dense_view()))
    }
}

impl<X, Y, T> DotKernel<X, Y> for (Local, Dense, Sparse)
where
    T: Scalar,
    X: DenseAccess<Elem = T>,
    Y: SparseAccess<Elem = T>,
{
    fn dot<B: AcceleratorBlas<T>>(x: &X, y: &Y) -> Result<T> {
        let (yi, yv) = y.sparse_parts();
        Ok(local::dense_sparse_dot(x.dense_view(), yi, yv))
    }
}

impl<X, Y, T> DotKernel<X, Y> for (Local, Sparse, Dense)
where
    T: Scalar,
    X: SparseAccess<Elem = T>,
    Y: DenseAccess<Elem = T>,
{
    fn dot<B: AcceleratorBlas<T>>(x: &X, y: &Y) -> Result<T> {
        let (xi, xv) = x.sparse_parts();
        Ok(local::sparse_dense_dot(xi, xv, y.dense_view()))
    }
}

impl<X, Y, T> DotKernel<X, Y> for (Local, Sparse, Sparse)
where
    T: Scalar,
    X: SparseAccess<Elem = T>,
    Y: SparseAccess<Elem = T>,
{
    fn dot<B: AcceleratorBlas<T>>(x: &X, y: &Y) -> Result<T> {
        let (xi, xv) = x.sparse_parts();
        let (yi, yv) = y.sparse_parts();
        Ok(local::sparse_dot(xi, xv, yi, yv))
    }
}

impl<X, Y, T> DotKernel<X, Y> for (Accelerator, Dense, Dense)
where
    T: Scalar,
    X: DeviceAccess<Elem = T>,
    Y: DeviceAccess<Elem = T>,
{
    fn dot<B: AcceleratorBlas<T>>(x: &X, y: &Y) -> Result<T> {
        debug!("dot[{}]: n={}", B::NAME, x.len());
        B::inner_product(
            x.len(),
            &x.raw_vector(),
            &y.raw_vector(),
            T::zero(),
            x.device_queue(),
        )
        .map_err(KernelError::Backend)
    }
}

/// Dot product on the active backend.
///
/// Both operands must have the same length and execution domain; accelerator
/// operands must share a command queue. Accelerator dots block until the
/// value has been read back.
pub fn dot<X, Y>(x: &X, y: &Y) -> Result<X::Elem>
where
    X: VectorExpression,
    Y: VectorExpression<Elem = X::Elem, Domain = X::Domain>,
    (X::Domain, X::Category, Y::Category): DotKernel<X, Y>,
    ActiveAccelerator: AcceleratorBlas<X::Elem>,
{
    dot_with_backend::<ActiveAccelerator, X, Y>(x, y)
}

/// [`dot`] with an explicit accelerator backend.
pub fn dot_with_backend<B, X, Y>(x: &X, y: &Y) -> Result<X::Elem>
where
    B: AcceleratorBlas<X::Elem>,
    X: VectorExpression,
    Y: VectorExpression<Elem = X::Elem, Domain = X::Domain>,
    (X::Domain, X::Category, Y::Category): DotKernel<X, Y>,
{
    if x.len() != y.len() {
        return Err(KernelError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if let (Some(qx), Some(qy)) = (x.queue(), y.queue()) {
        if !qx.same_queue(qy) {
            return Err(KernelError::QueueMismatch);
        }
    }

    debug!(
        "dot: {} {}x{} n={}",
        <X::Domain as ExecutionDomain>::NAME,
        <X::Category as StorageLayout>::NAME,
        <Y::Category as StorageLayout>::NAME,
        x.len()
    );
    <(X::Domain, X::Category, Y::Category) as DotKernel<X, Y>>::dot::<B>(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batched_device::{CommandQueue, DeviceMatrix, DeviceVector};
    use batched_traits::MemoryOrder;
    use batched_view::{DenseMatrix, DenseVector, SparseVector};

    #[test]
    fn test_all_local_layouts_agree() {
        let xd = DenseVector::from_vec(vec![1.0, 0.0, 2.0, 0.0, 3.0]);
        let yd = DenseVector::from_vec(vec![0.5, 4.0, 1.0, 0.0, -1.0]);
        let xs = SparseVector::from_dense(xd.as_slice());
        let ys = SparseVector::from_dense(yd.as_slice());
        let expected = 0.5 + 2.0 - 3.0;
        assert_eq!(dot(&xd, &yd).unwrap(), expected);
        assert_eq!(dot(&xd, &ys).unwrap(), expected);
        assert_eq!(dot(&xs, &yd).unwrap(), expected);
        assert_eq!(dot(&xs, &ys).unwrap(), expected);
    }

    #[test]
    fn test_matrix_rows_as_operands() {
        let m = DenseMatrix::from_fn(2, 3, MemoryOrder::ColMajor, |i, j| (i + j) as f64);
        let r0 = m.row(0).unwrap();
        let r1 = m.row(1).unwrap();
        assert_eq!(dot(&r0, &r1).unwrap(), 0.0 * 1.0 + 1.0 * 2.0 + 2.0 * 3.0);
    }

    #[test]
    fn test_length_mismatch() {
        let x = DenseVector::from_vec(vec![1.0, 2.0]);
        let y = SparseVector::<f64>::new(3);
        assert!(matches!(
            dot(&x, &y),
            Err(KernelError::LengthMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn test_device_dot_over_strided_rows() {
        let queue = CommandQueue::new().unwrap();
        let host = DenseMatrix::from_fn(2, 3, MemoryOrder::ColMajor, |i, j| (i * 3 + j) as f64);
        let m = DeviceMatrix::from_host(&queue, &host);
        let r0 = m.row(0).unwrap();
        let r1 = m.row(1).unwrap();
        assert_eq!(r0.stride(), 2);
        assert_eq!(dot(&r0, &r1).unwrap(), 0.0 * 3.0 + 1.0 * 4.0 + 2.0 * 5.0);
    }

    #[test]
    fn test_device_queue_mismatch() {
        let q1 = CommandQueue::new().unwrap();
        let q2 = CommandQueue::new().unwrap();
        let x = DeviceVector::from_host(&q1, &[1.0, 2.0]);
        let y = DeviceVector::from_host(&q2, &[1.0, 2.0]);
        assert!(matches!(dot(&x, &y), Err(KernelError::QueueMismatch)));
    }
}
