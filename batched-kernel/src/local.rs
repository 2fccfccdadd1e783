//! Local-domain loops.
//!
//! Accumulation always starts from zero and runs in index order, the same
//! order the device kernels use, so both venues agree to rounding.

use batched_device::Triangle;
use batched_traits::Scalar;
use batched_view::{CompressedMatrix, DenseMatrix, VectorView};

#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

/// Problem size above which the parallel path is used: vector length for a
/// dot product, output entries (`n * n`) for a rank-k update.
#[cfg(feature = "parallel")]
const PAR_THRESHOLD: usize = 1 << 15;

pub(crate) fn dense_dot<T: Scalar>(x: VectorView<'_, T>, y: VectorView<'_, T>) -> T {
    #[cfg(feature = "parallel")]
    {
        let n = x.len().min(y.len());
        if n > PAR_THRESHOLD {
            return (0..n)
                .into_par_iter()
                .with_min_len(PAR_THRESHOLD / 4)
                .map(|i| x[i] * y[i])
                .reduce(T::zero, |a, b| a + b);
        }
    }

    let mut acc = T::zero();
    for (&a, &b) in x.iter().zip(y.iter()) {
        acc = acc + a * b;
    }
    acc
}

/// Dot product of two sorted sparse index sets.
pub(crate) fn sparse_dot<T: Scalar>(xi: &[usize], xv: &[T], yi: &[usize], yv: &[T]) -> T {
    let mut acc = T::zero();
    let (mut p, mut q) = (0, 0);
    while p < xi.len() && q < yi.len() {
        match xi[p].cmp(&yi[q]) {
            std::cmp::Ordering::Less => p += 1,
            std::cmp::Ordering::Greater => q += 1,
            std::cmp::Ordering::Equal => {
                acc = acc + xv[p] * yv[q];
                p += 1;
                q += 1;
            }
        }
    }
    acc
}

/// `x . y` with `x` dense and `y` sparse.
pub(crate) fn dense_sparse_dot<T: Scalar>(x: VectorView<'_, T>, yi: &[usize], yv: &[T]) -> T {
    let mut acc = T::zero();
    for (&j, &v) in yi.iter().zip(yv) {
        acc = acc + x[j] * v;
    }
    acc
}

/// `x . y` with `x` sparse and `y` dense.
pub(crate) fn sparse_dense_dot<T: Scalar>(xi: &[usize], xv: &[T], y: VectorView<'_, T>) -> T {
    let mut acc = T::zero();
    for (&j, &v) in xi.iter().zip(xv) {
        acc = acc + v * y[j];
    }
    acc
}

/// Apply `c[i, j] = alpha * dot(i, j) + c[i, j]` over the triangle.
fn accumulate_triangle<T: Scalar>(
    c: &mut DenseMatrix<T>,
    alpha: T,
    triangle: Triangle,
    dot: impl Fn(usize, usize) -> T + Sync,
) {
    let n = c.rows();

    #[cfg(feature = "parallel")]
    {
        let work = n.saturating_mul(n);
        if work > PAR_THRESHOLD {
            let updates: Vec<Vec<T>> = (0..n)
                .into_par_iter()
                .map(|i| triangle.columns(i, n).map(|j| dot(i, j)).collect())
                .collect();
            for (i, row) in updates.into_iter().enumerate() {
                for (j, acc) in triangle.columns(i, n).zip(row) {
                    c[[i, j]] = alpha * acc + c[[i, j]];
                }
            }
            return;
        }
    }

    for i in 0..n {
        for j in triangle.columns(i, n) {
            let acc = dot(i, j);
            c[[i, j]] = alpha * acc + c[[i, j]];
        }
    }
}

pub(crate) fn syrk_dense<T: Scalar>(
    a: &DenseMatrix<T>,
    c: &mut DenseMatrix<T>,
    alpha: T,
    triangle: Triangle,
) {
    let rows: Vec<VectorView<'_, T>> = a.iter_rows().map(|r| r.as_view()).collect();
    accumulate_triangle(c, alpha, triangle, |i, j| dense_dot(rows[i], rows[j]));
}

pub(crate) fn syrk_sparse<T: Scalar>(
    a: &CompressedMatrix<T>,
    c: &mut DenseMatrix<T>,
    alpha: T,
    triangle: Triangle,
) {
    let rows: Vec<_> = a.iter_rows().collect();
    accumulate_triangle(c, alpha, triangle, |i, j| {
        sparse_dot(rows[i].indices(), rows[i].values(), rows[j].indices(), rows[j].values())
    });
}
