//! Scalar type bounds for numeric batches and kernels.

/// Arithmetic bounds shared by every numeric element type.
///
/// Mirrors what a BLAS-like kernel needs from an element: copy semantics,
/// a ring structure (`+`, `*`, `0`, `1`) and equality.
pub trait ScalarBase:
    Copy
    + Send
    + Sync
    + std::ops::Mul<Output = Self>
    + std::ops::Add<Output = Self>
    + num_traits::Zero
    + num_traits::One
    + PartialEq
{
}

impl<T> ScalarBase for T where
    T: Copy
        + Send
        + Sync
        + std::ops::Mul<Output = T>
        + std::ops::Add<Output = T>
        + num_traits::Zero
        + num_traits::One
        + PartialEq
{
}

/// Element types that can live in numeric containers and be shipped to an
/// accelerator queue.
///
/// The `'static` bound is what lets device commands capture buffers of `T`.
pub trait Scalar: ScalarBase + Default + std::fmt::Debug + 'static {}

impl<T> Scalar for T where T: ScalarBase + Default + std::fmt::Debug + 'static {}
