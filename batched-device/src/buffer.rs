//! Device memory and the tensors that live in it.
//!
//! Host code never touches a [`DeviceBuffer`] directly: uploads happen when a
//! buffer is created, and every later read or write is a queue command, so
//! it observes all commands enqueued before it.

use std::fmt;
use std::sync::Arc;

use batched_traits::{MemoryOrder, Scalar};
use batched_view::{DenseMatrix, DenseVector, StorageError};
use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::blas::element_offset;
use crate::{CommandQueue, DeviceError, Result, StatusCode};

/// Shared device allocation.
///
/// The allocation never changes size, so its length is kept outside the lock.
pub struct DeviceBuffer<T> {
    data: Arc<RwLock<Vec<T>>>,
    len: usize,
}

impl<T> Clone for DeviceBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            len: self.len,
        }
    }
}

impl<T> DeviceBuffer<T> {
    pub(crate) fn from_vec(data: Vec<T>) -> Self {
        Self {
            len: data.len(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Allocated length in elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.data.write()
    }
}

impl<T> fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer").field("len", &self.len()).finish()
    }
}

/// Raw storage descriptor of a device matrix: buffer, offset and leading dimension.
#[derive(Debug, Clone)]
pub struct RawStorage<T> {
    pub buffer: DeviceBuffer<T>,
    pub offset: usize,
    pub leading_dimension: usize,
}

/// Raw storage descriptor of a device vector: buffer, offset and stride.
#[derive(Debug, Clone)]
pub struct RawVector<T> {
    pub buffer: DeviceBuffer<T>,
    pub offset: usize,
    pub stride: usize,
}

// ============================================================================
// DeviceMatrix
// ============================================================================

/// Matrix resident in device memory, bound to the queue that owns its work.
#[derive(Debug, Clone)]
pub struct DeviceMatrix<T> {
    buffer: DeviceBuffer<T>,
    rows: usize,
    cols: usize,
    order: MemoryOrder,
    offset: usize,
    leading_dimension: usize,
    queue: CommandQueue,
}

impl<T: Scalar> DeviceMatrix<T> {
    /// Packed zero matrix.
    pub fn zeros(queue: &CommandQueue, rows: usize, cols: usize, order: MemoryOrder) -> Self {
        Self {
            buffer: DeviceBuffer::from_vec(vec![T::zero(); rows * cols]),
            rows,
            cols,
            order,
            offset: 0,
            leading_dimension: order.leading_dimension(rows, cols),
            queue: queue.clone(),
        }
    }

    /// Upload a host matrix, keeping its memory order.
    pub fn from_host(queue: &CommandQueue, host: &DenseMatrix<T>) -> Self {
        debug!(
            "upload {}x{} {:?} matrix to queue {}",
            host.rows(),
            host.cols(),
            host.order(),
            queue.id()
        );
        Self {
            buffer: DeviceBuffer::from_vec(host.data().to_vec()),
            rows: host.rows(),
            cols: host.cols(),
            order: host.order(),
            offset: 0,
            leading_dimension: host.leading_dimension(),
            queue: queue.clone(),
        }
    }

    /// Read the matrix back after every previously enqueued command.
    pub fn to_host(&self) -> Result<DenseMatrix<T>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let raw = self.raw_storage();
        let (rows, cols, order) = (self.rows, self.cols, self.order);
        let event = self.queue.enqueue(move || {
            let data = raw.buffer.read();
            let packed = pack(&data, order, raw.offset, raw.leading_dimension, rows, cols);
            match tx.send(packed) {
                Ok(()) => StatusCode::Success,
                Err(_) => StatusCode::ExecutionFailed,
            }
        });
        let status = event.wait();
        if !status.is_success() {
            return Err(DeviceError::Status(status));
        }
        let data = rx.recv().map_err(|_| DeviceError::Status(StatusCode::ExecutionFailed))?;
        Ok(DenseMatrix::from_parts(data, rows, cols, order)?)
    }

    /// Enqueue `factor * self` into a new packed matrix on the same queue.
    pub fn scaled(&self, factor: T) -> Self {
        let out = Self::zeros(&self.queue, self.rows, self.cols, self.order);
        let src = self.raw_storage();
        let dst = out.buffer.clone();
        let (rows, cols, order) = (self.rows, self.cols, self.order);
        self.queue.enqueue(move || {
            let data = src.buffer.read();
            let values = pack(&data, order, src.offset, src.leading_dimension, rows, cols);
            drop(data);
            let mut dst = dst.write();
            for (d, v) in dst.iter_mut().zip(values) {
                *d = factor * v;
            }
            StatusCode::Success
        });
        out
    }

    /// Row `i` as a strided device vector sharing this matrix's buffer.
    pub fn row(&self, i: usize) -> Option<DeviceVector<T>> {
        if i >= self.rows {
            return None;
        }
        let (offset, stride) = match self.order {
            MemoryOrder::RowMajor => (self.offset + i * self.leading_dimension, 1),
            MemoryOrder::ColMajor => (self.offset + i, self.leading_dimension),
        };
        Some(DeviceVector {
            buffer: self.buffer.clone(),
            len: self.cols,
            offset,
            stride,
            queue: self.queue.clone(),
        })
    }

    /// Rows `start..start + count` as a matrix sharing this buffer.
    pub fn rows_range(&self, start: usize, count: usize) -> Result<Self> {
        let end = start.checked_add(count).ok_or(StorageError::OffsetOverflow)?;
        if end > self.rows {
            return Err(StorageError::IndexOutOfBounds {
                index: end,
                bound: self.rows,
            }
            .into());
        }
        let offset = match self.order {
            MemoryOrder::RowMajor => self.offset + start * self.leading_dimension,
            MemoryOrder::ColMajor => self.offset + start,
        };
        Ok(Self {
            buffer: self.buffer.clone(),
            rows: count,
            cols: self.cols,
            order: self.order,
            offset,
            leading_dimension: self.leading_dimension,
            queue: self.queue.clone(),
        })
    }
}

impl<T> DeviceMatrix<T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    #[inline]
    pub fn order(&self) -> MemoryOrder {
        self.order
    }

    #[inline]
    pub fn leading_dimension(&self) -> usize {
        self.leading_dimension
    }

    #[inline]
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn raw_storage(&self) -> RawStorage<T> {
        RawStorage {
            buffer: self.buffer.clone(),
            offset: self.offset,
            leading_dimension: self.leading_dimension,
        }
    }
}

fn pack<T: Copy>(
    data: &[T],
    order: MemoryOrder,
    offset: usize,
    ld: usize,
    rows: usize,
    cols: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(rows * cols);
    match order {
        MemoryOrder::RowMajor => {
            for i in 0..rows {
                for j in 0..cols {
                    out.push(data[element_offset(order, offset, ld, i, j)]);
                }
            }
        }
        MemoryOrder::ColMajor => {
            for j in 0..cols {
                for i in 0..rows {
                    out.push(data[element_offset(order, offset, ld, i, j)]);
                }
            }
        }
    }
    out
}

// ============================================================================
// DeviceVector
// ============================================================================

/// Strided vector resident in device memory.
#[derive(Debug, Clone)]
pub struct DeviceVector<T> {
    buffer: DeviceBuffer<T>,
    len: usize,
    offset: usize,
    stride: usize,
    queue: CommandQueue,
}

impl<T: Scalar> DeviceVector<T> {
    pub fn zeros(queue: &CommandQueue, len: usize) -> Self {
        Self::from_host(queue, &vec![T::zero(); len])
    }

    pub fn from_host(queue: &CommandQueue, host: &[T]) -> Self {
        Self {
            buffer: DeviceBuffer::from_vec(host.to_vec()),
            len: host.len(),
            offset: 0,
            stride: 1,
            queue: queue.clone(),
        }
    }

    pub fn to_host(&self) -> Result<DenseVector<T>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let raw = self.raw();
        let len = self.len;
        let event = self.queue.enqueue(move || {
            let data = raw.buffer.read();
            let values: Vec<T> = (0..len).map(|i| data[raw.offset + i * raw.stride]).collect();
            match tx.send(values) {
                Ok(()) => StatusCode::Success,
                Err(_) => StatusCode::ExecutionFailed,
            }
        });
        let status = event.wait();
        if !status.is_success() {
            return Err(DeviceError::Status(status));
        }
        rx.recv()
            .map(DenseVector::from_vec)
            .map_err(|_| DeviceError::Status(StatusCode::ExecutionFailed))
    }
}

impl<T> DeviceVector<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn raw(&self) -> RawVector<T> {
        RawVector {
            buffer: self.buffer.clone(),
            offset: self.offset,
            stride: self.stride,
        }
    }
}
