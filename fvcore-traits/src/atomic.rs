//! Lock-free floating point accumulation.
use std::mem::align_of;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomically adds `value` to the `f64` stored at `target`.
///
/// Uses a compare-exchange loop on the bit pattern of the value.
///
/// # Safety
///
/// `target` must be valid for reads and writes and aligned to `align_of::<AtomicU64>()`.
/// All concurrent accesses to the location must be atomic.
#[inline]
pub unsafe fn atomic_add_f64(target: *mut f64, value: f64) {
    debug_assert_eq!(
        target as usize % align_of::<AtomicU64>(),
        0,
        "f64 location is not aligned for atomic access"
    );
    let atomic = AtomicU64::from_ptr(target.cast::<u64>());
    let mut current = atomic.load(Ordering::Relaxed);
    loop {
        let updated = (f64::from_bits(current) + value).to_bits();
        match atomic.compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}
