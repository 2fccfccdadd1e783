//! The batch registry: which container holds many elements of a type.

use batched_traits::Scalar;
use batched_view::{CompressedMatrix, DenseMatrix, DenseVector, SparseVector};
use log::debug;
use num_complex::{Complex32, Complex64};

use crate::container::BatchContainer;
use crate::{BatchError, Result};

/// Class of an element type, in decreasing order of specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Stored as rows of a [`CompressedMatrix`].
    SparseVector,
    /// Stored as rows of a [`DenseMatrix`].
    DenseVector,
    /// Stored in a [`DenseVector`].
    Arithmetic,
    /// Stored in a `Vec`.
    Opaque,
}

/// Element types that know their batch container.
///
/// Implemented for sparse and dense numeric vectors, arithmetic scalars and a
/// set of opaque types; other types opt in through [`opaque_batch!`].
pub trait Batch: Sized {
    type Container: BatchContainer<Element = Self>;

    const KIND: ElementKind;

    /// A container of `size` elements shaped like `blueprint`.
    ///
    /// Only the blueprint's shape is used for numeric elements, whose slots
    /// start at zero; opaque slots are clones of the blueprint.
    fn create_batch(blueprint: &Self, size: usize) -> Self::Container;

    /// A container holding copies of `range`, in order.
    fn create_batch_from_range<'a, I>(range: I) -> Result<Self::Container>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: Clone;

    /// Resize to `len` elements of dimension `dim`, keeping the overlap.
    ///
    /// `dim` is ignored for scalar and opaque elements.
    fn resize(container: &mut Self::Container, len: usize, dim: usize);
}

/// Build the batch container for a non-empty range of `T`.
///
/// ```
/// use batched_rs::{create_batch, BatchContainer};
/// use batched_view::DenseVector;
///
/// let rows = vec![
///     DenseVector::from_vec(vec![1.0, 2.0]),
///     DenseVector::from_vec(vec![3.0, 4.0]),
/// ];
/// let batch = create_batch(&rows).unwrap();
/// assert_eq!(batch.shape(), [2, 2]);
/// assert_eq!(batch.element(1).unwrap(), rows[1]);
/// ```
pub fn create_batch<'a, T, I>(range: I) -> Result<T::Container>
where
    T: Batch + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: Clone,
{
    T::create_batch_from_range(range)
}

/// Dimension shared by every element of `range`.
fn common_dim<'a, T: 'a>(
    range: impl Iterator<Item = &'a T>,
    dim: impl Fn(&T) -> usize,
) -> Result<(usize, usize)> {
    let mut shape = None;
    let mut count = 0;
    for (index, element) in range.enumerate() {
        let found = dim(element);
        let expected = *shape.get_or_insert(found);
        if expected != found {
            return Err(BatchError::ShapeMismatch {
                expected,
                found,
                index,
            });
        }
        count += 1;
    }
    shape.map(|d| (count, d)).ok_or(BatchError::EmptyRange)
}

impl<T: Scalar> Batch for SparseVector<T> {
    type Container = CompressedMatrix<T>;

    const KIND: ElementKind = ElementKind::SparseVector;

    fn create_batch(blueprint: &Self, size: usize) -> CompressedMatrix<T> {
        CompressedMatrix::new(size, blueprint.dim())
    }

    fn create_batch_from_range<'a, I>(range: I) -> Result<CompressedMatrix<T>>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: Clone,
    {
        let iter = range.into_iter();
        let (rows, cols) = common_dim(iter.clone(), SparseVector::dim)?;
        let nnz: usize = iter.clone().map(SparseVector::nnz).sum();
        debug!("sparse batch: {} rows, {} cols, {} nonzeros", rows, cols, nnz);

        let mut batch = CompressedMatrix::with_capacity(rows, cols, nnz);
        for (i, v) in iter.enumerate() {
            batch.set_row(i, v)?;
        }
        Ok(batch)
    }

    fn resize(container: &mut CompressedMatrix<T>, len: usize, dim: usize) {
        container.resize(len, dim);
    }
}

impl<T: Scalar> Batch for DenseVector<T> {
    type Container = DenseMatrix<T>;

    const KIND: ElementKind = ElementKind::DenseVector;

    fn create_batch(blueprint: &Self, size: usize) -> DenseMatrix<T> {
        DenseMatrix::new(size, blueprint.len())
    }

    fn create_batch_from_range<'a, I>(range: I) -> Result<DenseMatrix<T>>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: Clone,
    {
        let iter = range.into_iter();
        let (rows, cols) = common_dim(iter.clone(), DenseVector::len)?;
        debug!("dense batch: {} rows, {} cols", rows, cols);

        let mut data = Vec::with_capacity(rows * cols);
        for v in iter {
            data.extend_from_slice(v.as_slice());
        }
        Ok(DenseMatrix::from_parts(data, rows, cols, Default::default())?)
    }

    fn resize(container: &mut DenseMatrix<T>, len: usize, dim: usize) {
        container.resize(len, dim);
    }
}

/// Register arithmetic scalars: batched into a [`DenseVector`].
macro_rules! arithmetic_batch {
    ($($t:ty),* $(,)?) => {
        $(
            impl Batch for $t {
                type Container = DenseVector<$t>;

                const KIND: ElementKind = ElementKind::Arithmetic;

                fn create_batch(_blueprint: &Self, size: usize) -> DenseVector<$t> {
                    DenseVector::new(size)
                }

                fn create_batch_from_range<'a, I>(range: I) -> Result<DenseVector<$t>>
                where
                    Self: 'a,
                    I: IntoIterator<Item = &'a Self>,
                    I::IntoIter: Clone,
                {
                    Ok(range.into_iter().copied().collect())
                }

                fn resize(container: &mut DenseVector<$t>, len: usize, _dim: usize) {
                    container.resize(len);
                }
            }
        )*
    };
}

arithmetic_batch!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, Complex32, Complex64,
);

/// Register types that are batched into a plain `Vec`.
///
/// The type must be `Clone + Default`: `create_batch` clones the blueprint
/// and `resize` fills new slots with `Default::default()`.
///
/// ```
/// use batched_rs::{opaque_batch, Batch, ElementKind};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Label(String);
///
/// opaque_batch!(Label);
///
/// assert_eq!(Label::KIND, ElementKind::Opaque);
/// let batch = Label::create_batch(&Label("x".into()), 3);
/// assert_eq!(batch, vec![Label("x".into()); 3]);
/// ```
#[macro_export]
macro_rules! opaque_batch {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::Batch for $t {
                type Container = ::std::vec::Vec<$t>;

                const KIND: $crate::ElementKind = $crate::ElementKind::Opaque;

                fn create_batch(blueprint: &Self, size: usize) -> ::std::vec::Vec<$t> {
                    ::std::vec![::std::clone::Clone::clone(blueprint); size]
                }

                fn create_batch_from_range<'a, I>(range: I) -> $crate::Result<::std::vec::Vec<$t>>
                where
                    Self: 'a,
                    I: ::std::iter::IntoIterator<Item = &'a Self>,
                    I::IntoIter: ::std::clone::Clone,
                {
                    ::std::result::Result::Ok(range.into_iter().cloned().collect())
                }

                fn resize(container: &mut ::std::vec::Vec<$t>, len: usize, _dim: usize) {
                    container.resize_with(len, ::std::default::Default::default);
                }
            }
        )*
    };
}

opaque_batch!(String, bool, char);

impl<T: Clone> Batch for Vec<T> {
    type Container = Vec<Vec<T>>;

    const KIND: ElementKind = ElementKind::Opaque;

    fn create_batch(blueprint: &Self, size: usize) -> Vec<Vec<T>> {
        vec![blueprint.clone(); size]
    }

    fn create_batch_from_range<'a, I>(range: I) -> Result<Vec<Vec<T>>>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: Clone,
    {
        Ok(range.into_iter().cloned().collect())
    }

    fn resize(container: &mut Vec<Vec<T>>, len: usize, _dim: usize) {
        container.resize_with(len, Vec::new);
    }
}

impl<T: Clone> Batch for Option<T> {
    type Container = Vec<Option<T>>;

    const KIND: ElementKind = ElementKind::Opaque;

    fn create_batch(blueprint: &Self, size: usize) -> Vec<Option<T>> {
        vec![blueprint.clone(); size]
    }

    fn create_batch_from_range<'a, I>(range: I) -> Result<Vec<Option<T>>>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: Clone,
    {
        Ok(range.into_iter().cloned().collect())
    }

    fn resize(container: &mut Vec<Option<T>>, len: usize, _dim: usize) {
        container.resize(len, None);
    }
}
