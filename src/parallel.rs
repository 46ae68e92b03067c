//! Data-parallel loops over index ranges.
//!
//! All primitives block until every index has been processed. On the serial executor, indices
//! are visited in ascending order. On the parallel executors, there is no ordering between
//! indices and no mutual exclusion: a body that updates a location shared between indices must
//! go through an [`AtomicScatter`].
use crate::executor::Executor;
use fvcore_traits::{Element, FieldValue};
use log::trace;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::ops::{Add, Range};

/// Invokes `body` once for every index in `range`.
pub fn parallel_for<F>(exec: &Executor, range: Range<usize>, body: F, label: &str)
where
    F: Fn(usize) + Sync + Send,
{
    trace!("parallel_for '{}': {} indices on {}", label, range.len(), exec.name());
    match exec {
        Executor::Serial(_) => range.for_each(body),
        _ => exec.install(|| range.into_par_iter().for_each(body)),
    }
}

/// Invokes `body` once for every element of `data`, with exclusive access to that element.
///
/// This is the primitive for elementwise kernels, where index `i` only ever writes `data[i]`.
pub fn parallel_for_each_mut<T, F>(exec: &Executor, data: &mut [T], body: F, label: &str)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    trace!("parallel_for_each_mut '{}': {} indices on {}", label, data.len(), exec.name());
    match exec {
        Executor::Serial(_) => data
            .iter_mut()
            .enumerate()
            .for_each(|(i, x)| body(i, x)),
        _ => exec.install(|| {
            data.par_iter_mut()
                .enumerate()
                .for_each(|(i, x)| body(i, x))
        }),
    }
}

/// Sums `body(i)` over all indices in `range`.
///
/// The serial executor sums in ascending index order. The parallel executors combine partial
/// sums in an unspecified order, so floating point results may differ in the last bits.
pub fn parallel_reduce<T, F>(exec: &Executor, range: Range<usize>, body: F, label: &str) -> T
where
    T: Element + Add<Output = T>,
    F: Fn(usize) -> T + Sync + Send,
{
    trace!("parallel_reduce '{}': {} indices on {}", label, range.len(), exec.name());
    match exec {
        Executor::Serial(_) => range.map(body).fold(T::zero(), |acc, x| acc + x),
        _ => exec.install(|| {
            range
                .into_par_iter()
                .map(body)
                .reduce(T::zero, |a, b| a + b)
        }),
    }
}

/// Shared, race-free accumulation into a mutable slice.
///
/// Every update is an atomic read-modify-write, so many loop bodies may add to the same
/// location concurrently. The view holds the exclusive borrow of the slice for its lifetime,
/// which guarantees that no plain access can race with the atomic updates.
#[derive(Debug)]
pub struct AtomicScatter<'a, T> {
    ptr: *mut T,
    len: usize,
    marker: PhantomData<&'a mut [T]>,
}

unsafe impl<'a, T: Send> Sync for AtomicScatter<'a, T> {}
unsafe impl<'a, T: Send> Send for AtomicScatter<'a, T> {}

impl<'a, T: FieldValue> AtomicScatter<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Atomically adds `value` to the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn add(&self, index: usize, value: T) {
        assert!(index < self.len, "Scatter index {} out of bounds for length {}", index, self.len);
        unsafe { T::atomic_add(self.ptr.add(index), value) }
    }

    /// Atomically subtracts `value` from the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn sub(&self, index: usize, value: T) {
        self.add(index, -value)
    }
}
