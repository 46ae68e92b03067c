use fvcore::executor::Executor;
use fvcore::parallel::{parallel_for, parallel_for_each_mut, parallel_reduce, AtomicScatter};
use fvcore::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use util::all_available_executors;

#[test]
fn parallel_for_visits_every_index_exactly_once() {
    for (name, exec) in all_available_executors() {
        let counts: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
        parallel_for(
            &exec,
            100..900,
            |i| {
                counts[i].fetch_add(1, Ordering::Relaxed);
            },
            "count",
        );
        for (i, count) in counts.iter().enumerate() {
            let expected = if (100..900).contains(&i) { 1 } else { 0 };
            assert_eq!(count.load(Ordering::Relaxed), expected, "{name}, index {i}");
        }
    }
}

#[test]
fn serial_parallel_for_runs_in_ascending_order() {
    let visited = Mutex::new(Vec::new());
    parallel_for(&Executor::serial(), 3..10, |i| visited.lock().unwrap().push(i), "order");
    assert_eq!(visited.into_inner().unwrap(), (3..10).collect::<Vec<_>>());
}

#[test]
fn parallel_for_each_mut_passes_matching_index() {
    for (name, exec) in all_available_executors() {
        let mut data = vec![0; 500];
        parallel_for_each_mut(&exec, &mut data, |i, x| *x = 2 * i, "double");
        assert!(data.iter().enumerate().all(|(i, &x)| x == 2 * i), "{name}");
    }
}

#[test]
fn parallel_reduce_sums_all_indices() {
    for (name, exec) in all_available_executors() {
        let total: f64 = parallel_reduce(&exec, 0..1001, |i| i as f64, "sum");
        assert_eq!(total, 500_500.0, "{name}");
        let empty: f64 = parallel_reduce(&exec, 0..0, |i| i as f64, "empty");
        assert_eq!(empty, 0.0, "{name}");
    }
}

#[test]
fn atomic_scatter_is_race_free_on_all_executors() {
    for (name, exec) in all_available_executors() {
        let mut cells = vec![Vec3::zeros(); 3];
        {
            let scatter = AtomicScatter::new(&mut cells);
            assert_eq!(scatter.len(), 3);
            parallel_for(
                &exec,
                0..3000,
                |i| {
                    scatter.add(i % 3, Vec3::new(1.0, 2.0, 0.0));
                    scatter.sub(i % 3, Vec3::new(0.0, 1.0, 1.0));
                },
                "scatter",
            );
        }
        assert_eq!(cells, vec![Vec3::new(1000.0, 1000.0, -1000.0); 3], "{name}");
    }
}
