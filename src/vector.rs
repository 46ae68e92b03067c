//! An owning, executor-bound array and the elementwise operations on it.
use crate::executor::{deep_copy, Executor};
use crate::parallel::{parallel_for_each_mut, parallel_reduce};
use fvcore_traits::{Element, FieldValue};
use std::mem;
use std::ops::{Add, AddAssign, Mul, MulAssign, Range, Sub, SubAssign};

/// A resizable array whose buffer is owned by exactly one [`Executor`].
///
/// The buffer is allocated, reallocated and freed through the executor the vector was created
/// with, and the executor never changes. Moving data to another executor always goes through
/// [`copy_to_executor`](Self::copy_to_executor), which produces a new vector.
///
/// `Vector` does not implement `Index`: element access goes through
/// [`view`](Self::view) and [`view_mut`](Self::view_mut), whose borrows cannot outlive the
/// vector or survive a resize. Cloning always allocates a fresh buffer and copies the content.
#[derive(Debug)]
pub struct Vector<T: Element> {
    data: Vec<T>,
    exec: Executor,
}

impl<T: Element> Vector<T> {
    /// An empty vector, holding no buffer.
    pub fn empty(exec: &Executor) -> Self {
        Self {
            data: Vec::new(),
            exec: exec.clone(),
        }
    }

    /// A zero-initialized vector of the given size.
    pub fn new(exec: &Executor, size: usize) -> Self {
        Self {
            data: exec.alloc(size),
            exec: exec.clone(),
        }
    }

    /// A vector of the given size with every entry set to `value`.
    pub fn with_value(exec: &Executor, size: usize, value: T) -> Self {
        let mut vector = Self::new(exec, size);
        fill(&mut vector, value);
        vector
    }

    /// A vector on `exec` holding a copy of `values`, which reside on `src_exec`.
    pub fn from_slice(exec: &Executor, values: &[T], src_exec: &Executor) -> Self {
        let mut vector = Self::new(exec, values.len());
        deep_copy(values, &mut vector.data, src_exec, exec);
        vector
    }

    /// A vector on `exec` holding a copy of host data.
    pub fn from_vec(exec: &Executor, values: Vec<T>) -> Self {
        Self::from_slice(exec, &values, &Executor::serial())
    }

    pub fn exec(&self) -> &Executor {
        &self.exec
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The index range `0 .. len()`.
    pub fn range(&self) -> Range<usize> {
        0..self.len()
    }

    pub fn view(&self) -> &[T] {
        &self.data
    }

    pub fn view_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// A window over the entries in `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn view_range(&self, range: Range<usize>) -> &[T] {
        &self.data[range]
    }

    /// A mutable window over the entries in `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn view_range_mut(&mut self, range: Range<usize>) -> &mut [T] {
        &mut self.data[range]
    }

    /// Moves the buffer out into a new vector, leaving `self` empty on the same executor.
    pub fn take(&mut self) -> Self {
        let exec = self.exec.clone();
        mem::replace(self, Self::empty(&exec))
    }

    /// Resizes the vector, preserving the first `min(len, size)` entries.
    ///
    /// New entries are zero.
    pub fn resize(&mut self, size: usize) {
        let buffer = mem::take(&mut self.data);
        self.data = self.exec.realloc(buffer, size);
    }

    /// A copy of this vector on `dst_exec`.
    ///
    /// If the vector already resides on an executor of the same kind, this is a plain copy.
    pub fn copy_to_executor(&self, dst_exec: &Executor) -> Self {
        if dst_exec == &self.exec {
            return self.clone();
        }
        let mut result = Self::new(dst_exec, self.len());
        deep_copy(&self.data, &mut result.data, &self.exec, dst_exec);
        result
    }

    /// A copy of this vector on the serial executor.
    pub fn copy_to_host(&self) -> Self {
        self.copy_to_executor(&Executor::serial())
    }

    /// Copies the content into `result`, which resides on the host.
    pub fn copy_to_host_into(&self, result: &mut Vector<T>) {
        debug_assert_eq!(
            result.len(),
            self.len(),
            "Result vector size not the same as current vector size"
        );
        *result = self.copy_to_host();
    }

    /// The content as a host `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.copy_to_host().view().to_vec()
    }

    /// Sets every entry to `value`.
    pub fn assign_value(&mut self, value: T) {
        fill(self, value);
    }

    /// Copies the content of `rhs`, resizing `self` if the sizes differ.
    ///
    /// # Panics
    ///
    /// Panics if the vectors reside on different executors.
    pub fn assign(&mut self, rhs: &Vector<T>) {
        assert!(self.exec == rhs.exec, "Executors are not the same");
        if self.len() != rhs.len() {
            self.resize(rhs.len());
        }
        set_vector(self, rhs.view());
    }

    /// Overwrites entry `i` with `f(i)`.
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(usize) -> T + Sync + Send,
    {
        map(self, f);
    }

    fn validate_other<U: Element>(&self, rhs: &Vector<U>) {
        debug_assert_eq!(self.len(), rhs.len(), "Vectors are not the same size.");
        debug_assert!(self.exec == rhs.exec, "Executors are not the same.");
    }
}

impl<T: Element> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Self::from_slice(&self.exec, &self.data, &self.exec)
    }
}

impl<T: Element> Drop for Vector<T> {
    fn drop(&mut self) {
        self.exec.free(mem::take(&mut self.data));
    }
}

/// Sets every entry of `vector` to `value`.
pub fn fill<T: Element>(vector: &mut Vector<T>, value: T) {
    let exec = vector.exec.clone();
    parallel_for_each_mut(&exec, vector.view_mut(), |_, x| *x = value, "fill");
}

/// Overwrites entry `i` of `vector` with `f(i)`.
pub fn map<T, F>(vector: &mut Vector<T>, f: F)
where
    T: Element,
    F: Fn(usize) -> T + Sync + Send,
{
    let exec = vector.exec.clone();
    parallel_for_each_mut(&exec, vector.view_mut(), |i, x| *x = f(i), "map");
}

/// Copies `values` into `vector`. Both must reside on the vector's executor.
pub fn set_vector<T: Element>(vector: &mut Vector<T>, values: &[T]) {
    debug_assert_eq!(vector.len(), values.len());
    let exec = vector.exec.clone();
    parallel_for_each_mut(&exec, vector.view_mut(), |i, x| *x = values[i], "setVector");
}

/// `a += b`, elementwise.
pub fn add<T: FieldValue>(a: &mut Vector<T>, b: &Vector<T>) {
    a.validate_other(b);
    let exec = a.exec.clone();
    let b = b.view();
    parallel_for_each_mut(&exec, a.view_mut(), |i, x| *x += b[i], "add");
}

/// `a -= b`, elementwise.
pub fn sub<T: FieldValue>(a: &mut Vector<T>, b: &Vector<T>) {
    a.validate_other(b);
    let exec = a.exec.clone();
    let b = b.view();
    parallel_for_each_mut(&exec, a.view_mut(), |i, x| *x -= b[i], "sub");
}

/// `a *= b`, elementwise, with a scalar per entry.
pub fn mul<T: FieldValue>(a: &mut Vector<T>, b: &Vector<f64>) {
    a.validate_other(b);
    let exec = a.exec.clone();
    let b = b.view();
    parallel_for_each_mut(&exec, a.view_mut(), |i, x| *x *= b[i], "mul");
}

/// `a *= s` for a single scalar.
pub fn scalar_mul<T: FieldValue>(a: &mut Vector<T>, s: f64) {
    let exec = a.exec.clone();
    parallel_for_each_mut(&exec, a.view_mut(), |_, x| *x *= s, "scalarMul");
}

/// The sum of all entries.
pub fn sum<T: FieldValue>(vector: &Vector<T>) -> T {
    let data = vector.view();
    parallel_reduce(vector.exec(), vector.range(), |i| data[i], "sum")
}

impl<T: FieldValue> AddAssign<&Vector<T>> for Vector<T> {
    fn add_assign(&mut self, rhs: &Vector<T>) {
        add(self, rhs);
    }
}

impl<T: FieldValue> SubAssign<&Vector<T>> for Vector<T> {
    fn sub_assign(&mut self, rhs: &Vector<T>) {
        sub(self, rhs);
    }
}

impl<T: FieldValue> MulAssign<&Vector<f64>> for Vector<T> {
    fn mul_assign(&mut self, rhs: &Vector<f64>) {
        mul(self, rhs);
    }
}

impl<T: FieldValue> MulAssign<f64> for Vector<T> {
    fn mul_assign(&mut self, rhs: f64) {
        scalar_mul(self, rhs);
    }
}

impl<T: FieldValue> Add<&Vector<T>> for Vector<T> {
    type Output = Vector<T>;

    fn add(mut self, rhs: &Vector<T>) -> Self::Output {
        self += rhs;
        self
    }
}

impl<T: FieldValue> Sub<&Vector<T>> for Vector<T> {
    type Output = Vector<T>;

    fn sub(mut self, rhs: &Vector<T>) -> Self::Output {
        self -= rhs;
        self
    }
}

impl<T: FieldValue> Mul<&Vector<f64>> for &Vector<T> {
    type Output = Vector<T>;

    fn mul(self, rhs: &Vector<f64>) -> Self::Output {
        let mut result = self.clone();
        result *= rhs;
        result
    }
}

impl<T: FieldValue> Mul<f64> for &Vector<T> {
    type Output = Vector<T>;

    fn mul(self, rhs: f64) -> Self::Output {
        let mut result = self.clone();
        result *= rhs;
        result
    }
}
