//! Heterogeneous vectors and flux-divergence kernels for cell-centred finite volume methods.
//!
//! Data lives in [`Vector`](vector::Vector)s bound to an [`Executor`](executor::Executor), and
//! all kernels dispatch their loops on the executor of the data they touch through the
//! primitives in [`parallel`].
pub mod executor;
pub mod field;
pub mod interpolation;
pub mod linear_system;
pub mod mesh;
pub mod operators;
pub mod parallel;
pub mod sparsity;
pub mod vector;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use fvcore_traits::{one, Element, FieldValue, Vec3};

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
