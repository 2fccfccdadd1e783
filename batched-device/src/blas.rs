//! Device BLAS entry points.
//!
//! Arguments are validated synchronously and reported as a [`StatusCode`];
//! the numeric work is enqueued on the given queue. Matrix descriptors use
//! the usual BLAS conventions: in row-major layout element `(i, j)` lives at
//! `offset + i * ld + j`, in column-major layout at `offset + i + j * ld`.

use batched_traits::{MemoryOrder, Scalar};
use log::trace;

use crate::{CommandQueue, Event, RawStorage, RawVector, StatusCode};

/// Whether an operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    No,
    Yes,
}

/// Triangle of a symmetric matrix that an update reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Triangle {
    #[default]
    Upper,
    Lower,
}

impl Triangle {
    /// Columns of row `i` (of an `n x n` matrix) inside the triangle.
    #[inline]
    pub fn columns(self, i: usize, n: usize) -> std::ops::Range<usize> {
        match self {
            Triangle::Upper => i..n,
            Triangle::Lower => 0..i + 1,
        }
    }
}

#[inline]
pub(crate) fn element_offset(
    order: MemoryOrder,
    offset: usize,
    ld: usize,
    i: usize,
    j: usize,
) -> usize {
    match order {
        MemoryOrder::RowMajor => offset + i * ld + j,
        MemoryOrder::ColMajor => offset + i + j * ld,
    }
}

/// Check a `rows x cols` descriptor against its buffer length.
fn check_matrix(
    order: MemoryOrder,
    rows: usize,
    cols: usize,
    ld: usize,
    offset: usize,
    buffer_len: usize,
    insufficient: StatusCode,
) -> StatusCode {
    let (outer, inner) = match order {
        MemoryOrder::RowMajor => (rows, cols),
        MemoryOrder::ColMajor => (cols, rows),
    };
    if ld < inner.max(1) {
        return StatusCode::InvalidLeadingDimension;
    }
    let required = (outer - 1)
        .checked_mul(ld)
        .and_then(|v| v.checked_add(inner))
        .and_then(|v| v.checked_add(offset));
    match required {
        Some(required) if required <= buffer_len => StatusCode::Success,
        _ => insufficient,
    }
}

fn check_vector(n: usize, v: &RawVector<impl Sized>, insufficient: StatusCode) -> StatusCode {
    if n > 1 && v.stride == 0 {
        return StatusCode::InvalidLeadingDimension;
    }
    let required = (n - 1)
        .checked_mul(v.stride)
        .and_then(|last| last.checked_add(v.offset))
        .and_then(|last| last.checked_add(1));
    match required {
        Some(required) if required <= v.buffer.len() => StatusCode::Success,
        _ => insufficient,
    }
}

/// Symmetric rank-k update `C <- alpha * op(A) * op(A)^T + beta * C`.
///
/// `C` is `n x n`. With `Transpose::No` the stored `A` is `n x k`, with
/// `Transpose::Yes` it is `k x n`; both operands are interpreted in `layout`.
/// Only the `triangle` part of `C` is written. On success the completion
/// event of the enqueued command is stored into `event` when given.
pub fn syrk<T: Scalar>(
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
    if n == 0 || k == 0 {
        return StatusCode::InvalidDimension;
    }
    let (a_rows, a_cols) = match transpose {
        Transpose::No => (n, k),
        Transpose::Yes => (k, n),
    };
    let status = check_matrix(
        layout,
        a_rows,
        a_cols,
        a.leading_dimension,
        a.offset,
        a.buffer.len(),
        StatusCode::InsufficientMemoryA,
    );
    if !status.is_success() {
        return status;
    }
    let status = check_matrix(
        layout,
        n,
        n,
        c.leading_dimension,
        c.offset,
        c.buffer.len(),
        StatusCode::InsufficientMemoryC,
    );
    if !status.is_success() {
        return status;
    }

    trace!(
        "syrk: layout={:?} triangle={:?} transpose={:?} n={} k={}",
        layout,
        triangle,
        transpose,
        n,
        k
    );
    let a = a.clone();
    let c = c.clone();
    let done = queue.enqueue(move || {
        // op(A) packed row-major, copied out before C is locked so that A and
        // C may share a buffer.
        let op_a: Vec<T> = {
            let data = a.buffer.read();
            let mut packed = Vec::with_capacity(n * k);
            for i in 0..n {
                for p in 0..k {
                    let (r, s) = match transpose {
                        Transpose::No => (i, p),
                        Transpose::Yes => (p, i),
                    };
                    packed.push(data[element_offset(layout, a.offset, a.leading_dimension, r, s)]);
                }
            }
            packed
        };
        let mut data = c.buffer.write();
        for i in 0..n {
            let row_i = &op_a[i * k..(i + 1) * k];
            for j in triangle.columns(i, n) {
                let row_j = &op_a[j * k..(j + 1) * k];
                let mut acc = T::zero();
                for (&x, &y) in row_i.iter().zip(row_j) {
                    acc = acc + x * y;
                }
                let idx = element_offset(layout, c.offset, c.leading_dimension, i, j);
                data[idx] = alpha * acc + beta * data[idx];
            }
        }
        StatusCode::Success
    });
    if let Some(slot) = event {
        *slot = done;
    }
    StatusCode::Success
}

/// Reduction `init + sum_i x[i] * y[i]` over `n` elements.
///
/// Blocks until the queue has executed every earlier command and the
/// reduction itself.
pub fn inner_product<T: Scalar>(
    n: usize,
    x: &RawVector<T>,
    y: &RawVector<T>,
    init: T,
    queue: &CommandQueue,
) -> Result<T, StatusCode> {
    if n > 0 {
        let status = check_vector(n, x, StatusCode::InsufficientMemoryA);
        if !status.is_success() {
            return Err(status);
        }
        let status = check_vector(n, y, StatusCode::InsufficientMemoryB);
        if !status.is_success() {
            return Err(status);
        }
    }

    trace!("inner_product: n={}", n);
    let (tx, rx) = crossbeam_channel::bounded(1);
    let x = x.clone();
    let y = y.clone();
    let event = queue.enqueue(move || {
        let xs = x.buffer.read();
        // A vector dotted with itself shares one lock.
        let same = x.buffer.ptr_eq(&y.buffer);
        let ys_guard = if same { None } else { Some(y.buffer.read()) };
        let ys: &[T] = match &ys_guard {
            Some(guard) => guard.as_slice(),
            None => xs.as_slice(),
        };
        let mut acc = init;
        for i in 0..n {
            acc = acc + xs[x.offset + i * x.stride] * ys[y.offset + i * y.stride];
        }
        match tx.send(acc) {
            Ok(()) => StatusCode::Success,
            Err(_) => StatusCode::ExecutionFailed,
        }
    });
    let status = event.wait();
    if !status.is_success() {
        return Err(status);
    }
    rx.recv().map_err(|_| StatusCode::ExecutionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceMatrix, DeviceVector};
    use approx::assert_abs_diff_eq;
    use batched_view::DenseMatrix;

    fn reference_syrk(
        a: &DenseMatrix<f64>,
        c: &DenseMatrix<f64>,
        alpha: f64,
        triangle: Triangle,
    ) -> DenseMatrix<f64> {
        let n = c.rows();
        let mut out = c.clone();
        for i in 0..n {
            for j in triangle.columns(i, n) {
                let mut acc = 0.0;
                for p in 0..a.cols() {
                    acc += a[[i, p]] * a[[j, p]];
                }
                out[[i, j]] += alpha * acc;
            }
        }
        out
    }

    fn operand(order: MemoryOrder) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(3, 2, order, |i, j| 1.0 + i as f64 - 0.5 * j as f64)
    }

    fn run(
        a: &DeviceMatrix<f64>,
        c: &DeviceMatrix<f64>,
        transpose: Transpose,
        triangle: Triangle,
    ) -> StatusCode {
        let mut event = Event::default();
        let status = syrk(
            c.order(),
            triangle,
            transpose,
            c.rows(),
            a.cols(),
            2.0,
            &a.raw_storage(),
            1.0,
            &c.raw_storage(),
            c.queue(),
            Some(&mut event),
        );
        if status.is_success() {
            event.wait()
        } else {
            status
        }
    }

    #[test]
    fn test_syrk_same_layout() {
        let queue = CommandQueue::new().unwrap();
        for order in [MemoryOrder::RowMajor, MemoryOrder::ColMajor] {
            for triangle in [Triangle::Upper, Triangle::Lower] {
                let host_a = operand(order);
                let host_c = DenseMatrix::from_fn(3, 3, order, |i, j| (i + j) as f64);
                let a = DeviceMatrix::from_host(&queue, &host_a);
                let c = DeviceMatrix::from_host(&queue, &host_c);
                assert_eq!(run(&a, &c, Transpose::No, triangle), StatusCode::Success);
                let expected = reference_syrk(&host_a, &host_c, 2.0, triangle);
                let got = c.to_host().unwrap();
                for i in 0..3 {
                    for j in 0..3 {
                        assert_abs_diff_eq!(got[[i, j]], expected[[i, j]], epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_syrk_transposed_reinterprets_storage() {
        // A column-major 3x2 operand read as row-major is its 2x3 transpose.
        let queue = CommandQueue::new().unwrap();
        let host_a = operand(MemoryOrder::ColMajor);
        let host_c: DenseMatrix<f64> = DenseMatrix::new(3, 3);
        let a = DeviceMatrix::from_host(&queue, &host_a);
        let c = DeviceMatrix::from_host(&queue, &host_c);
        assert_eq!(run(&a, &c, Transpose::Yes, Triangle::Upper), StatusCode::Success);
        let expected = reference_syrk(&host_a, &host_c, 2.0, Triangle::Upper);
        let got = c.to_host().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(got[[i, j]], expected[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_syrk_argument_errors() {
        let queue = CommandQueue::new().unwrap();
        let a = DeviceMatrix::from_host(&queue, &operand(MemoryOrder::RowMajor));
        let c: DeviceMatrix<f64> = DeviceMatrix::zeros(&queue, 3, 3, MemoryOrder::RowMajor);
        let small: DeviceMatrix<f64> = DeviceMatrix::zeros(&queue, 2, 2, MemoryOrder::RowMajor);

        let status = syrk(
            MemoryOrder::RowMajor,
            Triangle::Upper,
            Transpose::No,
            0,
            2,
            1.0,
            &a.raw_storage(),
            1.0,
            &c.raw_storage(),
            &queue,
            None,
        );
        assert_eq!(status, StatusCode::InvalidDimension);

        let status = syrk(
            MemoryOrder::RowMajor,
            Triangle::Upper,
            Transpose::No,
            3,
            4,
            1.0,
            &a.raw_storage(),
            1.0,
            &c.raw_storage(),
            &queue,
            None,
        );
        assert_eq!(status, StatusCode::InvalidLeadingDimension);

        let status = syrk(
            MemoryOrder::RowMajor,
            Triangle::Upper,
            Transpose::No,
            3,
            2,
            1.0,
            &a.raw_storage(),
            1.0,
            &small.raw_storage(),
            &queue,
            None,
        );
        assert_eq!(status, StatusCode::InvalidLeadingDimension);

        let mut short = c.raw_storage();
        short.offset = 2;
        let status = syrk(
            MemoryOrder::RowMajor,
            Triangle::Upper,
            Transpose::No,
            3,
            2,
            1.0,
            &a.raw_storage(),
            1.0,
            &short,
            &queue,
            None,
        );
        assert_eq!(status, StatusCode::InsufficientMemoryC);
    }

    #[test]
    fn test_syrk_operands_sharing_a_buffer() {
        // C and A alias: A is the first two columns of a 3x5 row-major block.
        let queue = CommandQueue::new().unwrap();
        let host = DenseMatrix::from_fn(3, 5, MemoryOrder::RowMajor, |i, j| {
            if j < 2 {
                (i + j) as f64
            } else {
                0.0
            }
        });
        let block = DeviceMatrix::from_host(&queue, &host);
        let raw = block.raw_storage();
        let a = RawStorage {
            buffer: raw.buffer.clone(),
            offset: 0,
            leading_dimension: 5,
        };
        let c = RawStorage {
            buffer: raw.buffer.clone(),
            offset: 2,
            leading_dimension: 5,
        };
        let mut event = Event::default();
        let status = syrk(
            MemoryOrder::RowMajor,
            Triangle::Lower,
            Transpose::No,
            3,
            2,
            1.0,
            &a,
            1.0,
            &c,
            &queue,
            Some(&mut event),
        );
        assert_eq!(status, StatusCode::Success);
        assert_eq!(event.wait(), StatusCode::Success);
        let got = block.to_host().unwrap();
        // rows of A: [0,1], [1,2], [2,3]
        assert_eq!(got[[2, 2]], 0.0 * 2.0 + 1.0 * 3.0);
        assert_eq!(got[[2, 4]], 13.0);
        assert_eq!(got[[0, 3]], 0.0);
        assert_eq!(got[[1, 0]], 1.0);
    }

    #[test]
    fn test_inner_product() {
        let queue = CommandQueue::new().unwrap();
        let x = DeviceVector::from_host(&queue, &[1.0, 2.0, 3.0]);
        let y = DeviceVector::from_host(&queue, &[4.0, -5.0, 6.0]);
        let got = inner_product(3, &x.raw(), &y.raw(), 0.0, &queue).unwrap();
        assert_abs_diff_eq!(got, 12.0, epsilon = 1e-12);
        let seeded = inner_product(3, &x.raw(), &x.raw(), 1.0, &queue).unwrap();
        assert_abs_diff_eq!(seeded, 15.0, epsilon = 1e-12);
        assert_eq!(inner_product(0, &x.raw(), &y.raw(), 7.0, &queue), Ok(7.0));
    }

    #[test]
    fn test_inner_product_bounds() {
        let queue = CommandQueue::new().unwrap();
        let x = DeviceVector::from_host(&queue, &[1.0, 2.0, 3.0]);
        let y = DeviceVector::from_host(&queue, &[1.0, 2.0]);
        assert_eq!(
            inner_product(3, &x.raw(), &y.raw(), 0.0, &queue),
            Err(StatusCode::InsufficientMemoryB)
        );
        let mut strided = x.raw();
        strided.stride = 2;
        assert_eq!(
            inner_product(2, &strided, &x.raw(), 0.0, &queue),
            Ok(1.0 * 1.0 + 3.0 * 2.0)
        );
    }
}
