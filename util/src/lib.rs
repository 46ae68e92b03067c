use fvcore::executor::Executor;
use fvcore::FieldValue;

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Poor man's approx assertion for slices of field values
#[macro_export]
macro_rules! assert_approx_slice_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let (x, y) = (&$x, &$y);
        let (x, y) = (&x[..], &y[..]);
        assert_eq!(x.len(), y.len(), "Slices have different lengths");
        let max_absdiff = $crate::max_abs_diff(x, y);
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {:?}", x);
            println!("right: {:?}", y);
            println!("max absdiff: {:e}", max_absdiff);
        }
        assert!(approx_eq);
    }};
}

/// Every executor available in this build, with a name for test output.
pub fn all_available_executors() -> Vec<(String, Executor)> {
    [Executor::serial(), Executor::host_parallel(), Executor::device()]
        .into_iter()
        .map(|exec| (exec.name().to_string(), exec))
        .collect()
}

/// Largest componentwise absolute difference between two equally long slices.
pub fn max_abs_diff<T: FieldValue>(x: &[T], y: &[T]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&a, &b)| (a - b).max_abs())
        .fold(0.0, f64::max)
}
