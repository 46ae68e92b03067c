use fvcore::executor::Executor;
use fvcore::proptest::{executor, vec3};
use fvcore::vector::{fill, map, scalar_mul, sum, Vector};
use fvcore::{one, FieldValue, Vec3};
use paste::paste;
use proptest::collection::vec;
use proptest::prelude::*;
use util::all_available_executors;

fn value<T: FieldValue>(x: f64) -> T {
    T::splat(x)
}

macro_rules! vector_tests {
    ($t:ident) => {
        paste! {
            #[test]
            fn [<vector_construction_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let zeros = Vector::<$t>::new(&exec, 5);
                    assert_eq!(zeros.len(), 5, "{name}");
                    assert_eq!(zeros.exec(), &exec);
                    assert!(zeros.copy_to_host().view().iter().all(|x| *x == value::<$t>(0.0)));

                    let ones = Vector::<$t>::with_value(&exec, 5, one::<$t>());
                    assert_eq!(ones.to_vec(), vec![one::<$t>(); 5], "{name}");

                    let host_values = vec![value::<$t>(1.0), value::<$t>(2.0), value::<$t>(3.0)];
                    let from_host = Vector::from_vec(&exec, host_values.clone());
                    assert_eq!(from_host.to_vec(), host_values, "{name}");

                    let empty = Vector::<$t>::empty(&exec);
                    assert!(empty.is_empty());
                    assert_eq!(empty.range(), 0..0);
                }
            }

            #[test]
            fn [<vector_arithmetic_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let a = Vector::<$t>::with_value(&exec, 10, value::<$t>(5.0));
                    let b = Vector::<$t>::with_value(&exec, 10, value::<$t>(2.0));
                    let scale = Vector::<f64>::with_value(&exec, 10, 3.0);

                    let c = a.clone() + &b;
                    assert_eq!(c.to_vec(), vec![value::<$t>(7.0); 10], "{name}");
                    let c = c - &b;
                    assert_eq!(c.to_vec(), vec![value::<$t>(5.0); 10], "{name}");

                    let d = &a * &scale;
                    assert_eq!(d.to_vec(), vec![value::<$t>(15.0); 10], "{name}");
                    let d = &a * 0.5;
                    assert_eq!(d.to_vec(), vec![value::<$t>(2.5); 10], "{name}");

                    let mut e = a.clone();
                    e += &b;
                    e -= &a;
                    e *= &scale;
                    e *= 2.0;
                    assert_eq!(e.to_vec(), vec![value::<$t>(12.0); 10], "{name}");

                    // Binary operators never modify their inputs
                    assert_eq!(a.to_vec(), vec![value::<$t>(5.0); 10], "{name}");
                    assert_eq!(b.to_vec(), vec![value::<$t>(2.0); 10], "{name}");
                }
            }

            #[test]
            fn [<vector_free_functions_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let mut v = Vector::<$t>::new(&exec, 100);
                    fill(&mut v, value::<$t>(2.0));
                    assert_eq!(sum(&v), value::<$t>(200.0), "{name}");

                    map(&mut v, |i| value::<$t>(i as f64));
                    assert_eq!(sum(&v), value::<$t>(4950.0), "{name}");

                    scalar_mul(&mut v, 2.0);
                    assert_eq!(sum(&v), value::<$t>(9900.0), "{name}");

                    v.apply(|_| one::<$t>());
                    assert_eq!(v.to_vec(), vec![one::<$t>(); 100], "{name}");

                    v.assign_value(value::<$t>(-1.0));
                    assert_eq!(v.to_vec(), vec![value::<$t>(-1.0); 100], "{name}");
                }
            }

            #[test]
            fn [<vector_assign_resizes_destination_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let src = Vector::<$t>::from_vec(&exec, vec![value::<$t>(1.0), value::<$t>(2.0), value::<$t>(3.0)]);
                    let mut dst = Vector::<$t>::new(&exec, 1);
                    dst.assign(&src);
                    assert_eq!(dst.to_vec(), src.to_vec(), "{name}");
                }
            }

            #[test]
            fn [<vector_copy_to_host_into_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let src = Vector::<$t>::with_value(&exec, 4, value::<$t>(3.0));
                    let mut host = Vector::<$t>::new(&Executor::serial(), 4);
                    src.copy_to_host_into(&mut host);
                    assert_eq!(host.exec(), &Executor::serial());
                    assert_eq!(host.to_vec(), vec![value::<$t>(3.0); 4], "{name}");
                }
            }

            #[test]
            fn [<vector_views_ $t:snake>]() {
                for (name, exec) in all_available_executors() {
                    let mut v = Vector::<$t>::new(&exec, 6);
                    v.view_range_mut(2..4).fill(one::<$t>());
                    assert_eq!(v.view_range(1..5), &[value::<$t>(0.0), one::<$t>(), one::<$t>(), value::<$t>(0.0)], "{name}");
                }
            }
        }
    };
}

vector_tests!(f64);
vector_tests!(Vec3);

#[test]
#[should_panic]
fn assign_across_executors_panics() {
    let src = Vector::with_value(&Executor::host_parallel(), 3, 1.0);
    let mut dst = Vector::new(&Executor::serial(), 3);
    dst.assign(&src);
}

#[test]
fn move_transfers_buffer() {
    let exec = Executor::device();
    let a = Vector::with_value(&exec, 4, 2.0);
    let ptr = a.view().as_ptr();
    let b = a;
    assert_eq!(b.view().as_ptr(), ptr);
}

#[test]
fn copy_to_same_executor_is_a_plain_copy() {
    let exec = Executor::host_parallel();
    let a = Vector::with_value(&exec, 4, 2.0);
    let b = a.copy_to_executor(&Executor::host_parallel());
    assert_eq!(b.exec(), &exec);
    assert_ne!(a.view().as_ptr(), b.view().as_ptr());
    assert_eq!(a.to_vec(), b.to_vec());
}

#[test]
fn resize_to_zero_empties_vector() {
    let mut v = Vector::with_value(&Executor::serial(), 4, 2.0);
    v.resize(0);
    assert!(v.is_empty());
}

proptest! {
    #[test]
    fn copy_to_executor_and_back_preserves_content(
        values in vec(-1e6..1e6f64, 0..200),
        a in executor(),
        b in executor()
    ) {
        let original = Vector::from_vec(&a, values.clone());
        let round_trip = original.copy_to_executor(&b).copy_to_executor(&a);
        prop_assert_eq!(round_trip.exec(), &a);
        prop_assert_eq!(round_trip.to_vec(), values);
    }

    #[test]
    fn vec3_copy_to_executor_and_back_preserves_content(
        values in vec(vec3(), 0..50),
        a in executor(),
        b in executor()
    ) {
        let original = Vector::from_vec(&a, values.clone());
        prop_assert_eq!(original.copy_to_executor(&b).copy_to_executor(&a).to_vec(), values);
    }

    #[test]
    fn resize_preserves_prefix(
        values in vec(-1e6..1e6f64, 0..100),
        new_size in 0..200usize,
        exec in executor()
    ) {
        let mut v = Vector::from_vec(&exec, values.clone());
        v.resize(new_size);
        prop_assert_eq!(v.len(), new_size);

        let kept = new_size.min(values.len());
        let content = v.to_vec();
        prop_assert_eq!(&content[..kept], &values[..kept]);
        prop_assert!(content[kept..].iter().all(|&x| x == 0.0));
    }
}
