//! Tagged expressions: operands annotated with where they execute and how
//! they are stored.

use std::borrow::Cow;

use batched_device::{CommandQueue, DeviceMatrix, DeviceVector, RawVector};
use batched_traits::{Accelerator, Dense, ExecutionDomain, Local, Scalar, Sparse, StorageLayout};
use batched_view::{
    CompressedMatrix, DenseMatrix, DenseVector, RowRef, SparseRowRef, SparseVector, VectorView,
};
use log::debug;

/// A matrix operand of a kernel.
pub trait MatrixExpression {
    type Elem: Scalar;
    type Domain: ExecutionDomain;
    type Category: StorageLayout;

    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Command queue owning the operand's device storage.
    fn queue(&self) -> Option<&CommandQueue> {
        None
    }
}

/// Expressions that can be brought into directly addressable storage.
///
/// Concrete storage evaluates to itself (`Cow::Borrowed`); lazy expressions
/// build a temporary (`Cow::Owned`).
pub trait Evaluate: MatrixExpression {
    type Evaluated: Clone
        + MatrixExpression<Elem = Self::Elem, Domain = Self::Domain, Category = Self::Category>;

    fn evaluate(&self) -> Cow<'_, Self::Evaluated>;
}

/// A vector operand of a kernel.
pub trait VectorExpression {
    type Elem: Scalar;
    type Domain: ExecutionDomain;
    type Category: StorageLayout;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn queue(&self) -> Option<&CommandQueue> {
        None
    }
}

/// Local dense vectors readable as a strided view.
pub trait DenseAccess: VectorExpression<Domain = Local, Category = Dense> {
    fn dense_view(&self) -> VectorView<'_, Self::Elem>;
}

/// Local sparse vectors readable as sorted `(indices, values)`.
pub trait SparseAccess: VectorExpression<Domain = Local, Category = Sparse> {
    fn sparse_parts(&self) -> (&[usize], &[Self::Elem]);
}

/// Device vectors exposing a raw descriptor.
pub trait DeviceAccess: VectorExpression<Domain = Accelerator, Category = Dense> {
    fn raw_vector(&self) -> RawVector<Self::Elem>;
    fn device_queue(&self) -> &CommandQueue;
}

// ============================================================================
// Matrices
// ============================================================================

impl<T: Scalar> MatrixExpression for DenseMatrix<T> {
    type Elem = T;
    type Domain = Local;
    type Category = Dense;

    fn rows(&self) -> usize {
        DenseMatrix::rows(self)
    }

    fn cols(&self) -> usize {
        DenseMatrix::cols(self)
    }
}

impl<T: Scalar> Evaluate for DenseMatrix<T> {
    type Evaluated = Self;

    fn evaluate(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }
}

impl<T: Scalar> MatrixExpression for CompressedMatrix<T> {
    type Elem = T;
    type Domain = Local;
    type Category = Sparse;

    fn rows(&self) -> usize {
        CompressedMatrix::rows(self)
    }

    fn cols(&self) -> usize {
        CompressedMatrix::cols(self)
    }
}

impl<T: Scalar> Evaluate for CompressedMatrix<T> {
    type Evaluated = Self;

    fn evaluate(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }
}

impl<T: Scalar> MatrixExpression for DeviceMatrix<T> {
    type Elem = T;
    type Domain = Accelerator;
    type Category = Dense;

    fn rows(&self) -> usize {
        DeviceMatrix::rows(self)
    }

    fn cols(&self) -> usize {
        DeviceMatrix::cols(self)
    }

    fn queue(&self) -> Option<&CommandQueue> {
        Some(DeviceMatrix::queue(self))
    }
}

impl<T: Scalar> Evaluate for DeviceMatrix<T> {
    type Evaluated = Self;

    fn evaluate(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }
}

// ============================================================================
// Scaled
// ============================================================================

/// Lazy `factor * inner`.
///
/// Not directly addressable: kernels evaluate it into a temporary first.
#[derive(Debug)]
pub struct Scaled<'a, M: MatrixExpression> {
    inner: &'a M,
    factor: M::Elem,
}

impl<'a, M: MatrixExpression> Scaled<'a, M> {
    pub fn new(inner: &'a M, factor: M::Elem) -> Self {
        Self { inner, factor }
    }

    pub fn inner(&self) -> &'a M {
        self.inner
    }

    pub fn factor(&self) -> M::Elem {
        self.factor
    }
}

impl<M: MatrixExpression> MatrixExpression for Scaled<'_, M> {
    type Elem = M::Elem;
    type Domain = M::Domain;
    type Category = M::Category;

    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn cols(&self) -> usize {
        self.inner.cols()
    }

    fn queue(&self) -> Option<&CommandQueue> {
        self.inner.queue()
    }
}

fn log_materialize<M: MatrixExpression>(m: &M) {
    debug!(
        "materializing scaled {}x{} {} {} operand",
        m.rows(),
        m.cols(),
        <M::Domain as ExecutionDomain>::NAME,
        <M::Category as StorageLayout>::NAME
    );
}

impl<T: Scalar> Evaluate for Scaled<'_, DenseMatrix<T>> {
    type Evaluated = DenseMatrix<T>;

    fn evaluate(&self) -> Cow<'_, DenseMatrix<T>> {
        log_materialize(self.inner);
        let mut out = self.inner.clone();
        for v in out.data_mut() {
            *v = self.factor * *v;
        }
        Cow::Owned(out)
    }
}

impl<T: Scalar> Evaluate for Scaled<'_, CompressedMatrix<T>> {
    type Evaluated = CompressedMatrix<T>;

    fn evaluate(&self) -> Cow<'_, CompressedMatrix<T>> {
        log_materialize(self.inner);
        let mut out = self.inner.clone();
        for v in out.values_mut() {
            *v = self.factor * *v;
        }
        Cow::Owned(out)
    }
}

impl<T: Scalar> Evaluate for Scaled<'_, DeviceMatrix<T>> {
    type Evaluated = DeviceMatrix<T>;

    fn evaluate(&self) -> Cow<'_, DeviceMatrix<T>> {
        log_materialize(self.inner);
        Cow::Owned(self.inner.scaled(self.factor))
    }
}

// ============================================================================
// Vectors
// ============================================================================

impl<T: Scalar> VectorExpression for DenseVector<T> {
    type Elem = T;
    type Domain = Local;
    type Category = Dense;

    fn len(&self) -> usize {
        DenseVector::len(self)
    }
}

impl<T: Scalar> DenseAccess for DenseVector<T> {
    fn dense_view(&self) -> VectorView<'_, T> {
        self.view()
    }
}

impl<T: Scalar> VectorExpression for VectorView<'_, T> {
    type Elem = T;
    type Domain = Local;
    type Category = Dense;

    fn len(&self) -> usize {
        VectorView::len(self)
    }
}

impl<T: Scalar> DenseAccess for VectorView<'_, T> {
    fn dense_view(&self) -> VectorView<'_, T> {
        *self
    }
}

impl<T: Scalar> VectorExpression for RowRef<'_, T> {
    type Elem = T;
    type Domain = Local;
    type Category = Dense;

    fn len(&self) -> usize {
        self.as_view().len()
    }
}

impl<T: Scalar> DenseAccess for RowRef<'_, T> {
    fn dense_view(&self) -> VectorView<'_, T> {
        self.as_view()
    }
}

impl<T: Scalar> VectorExpression for SparseVector<T> {
    type Elem = T;
    type Domain = Local;
    type Category = Sparse;

    fn len(&self) -> usize {
        self.dim()
    }
}

impl<T: Scalar> SparseAccess for SparseVector<T> {
    fn sparse_parts(&self) -> (&[usize], &[T]) {
        (self.indices(), self.values())
    }
}

impl<T: Scalar> VectorExpression for SparseRowRef<'_, T> {
    type Elem = T;
    type Domain = Local;
    type Category = Sparse;

    fn len(&self) -> usize {
        self.dim()
    }
}

impl<T: Scalar> SparseAccess for SparseRowRef<'_, T> {
    fn sparse_parts(&self) -> (&[usize], &[T]) {
        (self.indices(), self.values())
    }
}

impl<T: Scalar> VectorExpression for DeviceVector<T> {
    type Elem = T;
    type Domain = Accelerator;
    type Category = Dense;

    fn len(&self) -> usize {
        DeviceVector::len(self)
    }

    fn queue(&self) -> Option<&CommandQueue> {
        Some(DeviceVector::queue(self))
    }
}

impl<T: Scalar> DeviceAccess for DeviceVector<T> {
    fn raw_vector(&self) -> RawVector<T> {
        self.raw()
    }

    fn device_queue(&self) -> &CommandQueue {
        DeviceVector::queue(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batched_traits::MemoryOrder;

    #[test]
    fn test_concrete_storage_evaluates_borrowed() {
        let m: DenseMatrix<f64> = DenseMatrix::new(2, 3);
        assert!(matches!(m.evaluate(), Cow::Borrowed(_)));
        let s: CompressedMatrix<f64> = CompressedMatrix::new(2, 3);
        assert!(matches!(s.evaluate(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_scaled_dense_evaluates_owned() {
        let m = DenseMatrix::from_fn(2, 2, MemoryOrder::ColMajor, |i, j| (i + 2 * j) as f64);
        let s = Scaled::new(&m, 3.0);
        assert_eq!(MatrixExpression::rows(&s), 2);
        let out = s.evaluate();
        assert!(matches!(out, Cow::Owned(_)));
        assert_eq!(out[[1, 1]], 9.0);
        assert_eq!(out.order(), MemoryOrder::ColMajor);
    }

    #[test]
    fn test_scaled_sparse_keeps_pattern() {
        let mut m = CompressedMatrix::new(2, 3);
        m.insert(1, 2, 2.0).unwrap();
        let out = Scaled::new(&m, -1.0).evaluate().into_owned();
        assert_eq!(out.nnz(), 1);
        assert_eq!(out.get(1, 2), Some(&-2.0));
    }

    #[test]
    fn test_vector_lengths() {
        let v = DenseVector::from_vec(vec![1.0, 2.0]);
        let s: SparseVector<f64> = SparseVector::new(7);
        assert_eq!(VectorExpression::len(&v), 2);
        assert_eq!(VectorExpression::len(&s), 7);
        assert!(VectorExpression::queue(&v).is_none());
    }
}
