use nalgebra::Vector3;
use num::Zero;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

pub use nalgebra;

pub mod atomic;

/// A small, fixed-size vector of three components, e.g. a velocity.
pub type Vec3 = Vector3<f64>;

/// A value that can be stored in an executor-bound vector.
///
/// This covers both topology data (cell indices) and field data.
pub trait Element: Copy + Send + Sync + Debug + PartialEq + Zero + 'static {}

impl<T> Element for T where T: Copy + Send + Sync + Debug + PartialEq + Zero + 'static {}

/// A value transported by the finite volume operators.
///
/// Field values behave like vectors over `f64`: they can be added, subtracted and scaled by
/// per-cell or per-face scalars.
pub trait FieldValue:
    Element
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f64>
{
    /// Number of `f64` components stored in a single value.
    const NUM_COMPONENTS: usize;

    /// A value with every component set to `value`.
    ///
    /// `splat(1.0)` plays the role of "one" for the type.
    fn splat(value: f64) -> Self;

    /// The largest absolute value of any component.
    fn max_abs(&self) -> f64;

    /// Atomically adds `value` to the value stored at `target`.
    ///
    /// Each component is updated atomically on its own, so concurrent readers may observe a
    /// value in which only some of the components have been updated.
    ///
    /// # Safety
    ///
    /// `target` must be valid for reads and writes, suitably aligned, and every concurrent
    /// access to the same location must also go through this function.
    unsafe fn atomic_add(target: *mut Self, value: Self);
}

impl FieldValue for f64 {
    const NUM_COMPONENTS: usize = 1;

    fn splat(value: f64) -> Self {
        value
    }

    fn max_abs(&self) -> f64 {
        self.abs()
    }

    unsafe fn atomic_add(target: *mut Self, value: Self) {
        atomic::atomic_add_f64(target, value)
    }
}

impl FieldValue for Vec3 {
    const NUM_COMPONENTS: usize = 3;

    fn splat(value: f64) -> Self {
        Vector3::repeat(value)
    }

    fn max_abs(&self) -> f64 {
        self.amax()
    }

    unsafe fn atomic_add(target: *mut Self, value: Self) {
        // Matrix is repr(C) around a repr(transparent) array storage,
        // so the components are three contiguous f64
        let components = target.cast::<f64>();
        for (k, &v) in value.iter().enumerate() {
            atomic::atomic_add_f64(components.add(k), v);
        }
    }
}

/// The "one" of a field value type, i.e. a value with all components equal to 1.
pub fn one<T: FieldValue>() -> T {
    T::splat(1.0)
}
