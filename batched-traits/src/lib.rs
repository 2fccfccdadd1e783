//! Shared traits for the batched-rs crates.
//!
//! This crate provides the definitions that are shared across
//! `batched-view`, `batched-device`, `batched-kernel` and the root
//! `batched-rs` crate:
//!
//! - [`ScalarBase`] / [`Scalar`]: element bounds for numeric containers and kernels
//! - [`ExecutionDomain`] tags ([`Local`], [`Accelerator`])
//! - [`StorageLayout`] tags ([`Dense`], [`Sparse`])
//! - [`MemoryOrder`]: runtime orientation of dense matrix storage
//!
//! External crates can depend on `batched-traits` to implement the kernel
//! traits for their own types without orphan rule violations.

pub mod scalar;
pub mod tags;

pub use scalar::{Scalar, ScalarBase};
pub use tags::{Accelerator, Dense, ExecutionDomain, Local, MemoryOrder, Sparse, StorageLayout};
