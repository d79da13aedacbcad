extern crate pretty_env_logger as pel;

use crate::leo_orbit;
use starmap::dynamics::{DragConfig, RelativeDynamics};
use starmap::linalg::Vector6;
use starmap::md::sweep::{Component, Sweep, SweepAxis};
use starmap::propagators::*;

#[test]
fn grid_sweep() {
    let _ = pel::try_init();
    let orbit = leo_orbit();
    let sweep = Sweep::new(
        orbit,
        Vector6::new(0.0, 0.0, 0.01, 0.0, 0.0, 0.01),
        0.0,
        50.0,
    )
    .unwrap();

    let points = sweep
        .grid_points(
            SweepAxis::new(Component::X, 10.0),
            SweepAxis::new(Component::Vx, 0.05),
            3,
        )
        .unwrap();

    let prop = Propagator::default(RelativeDynamics::around(&orbit, DragConfig::none()));
    let grid = TimeGrid::spanning(0.0, 5_000.0, 100).unwrap();
    let results = sweep.run(&prop, &grid, &points);

    assert_eq!(results.len(), 9);
    for (idx, point) in results.iter().enumerate() {
        println!("{point}");
        assert_eq!(point.index, idx);
        assert_eq!(point.initial, points[idx]);
        assert!(point.stable);
        assert!(point.failure.is_none());
        assert!(point.min_range_m <= point.max_range_m);
        assert_eq!(
            point.within_bounds,
            point.min_range_m >= 0.0 && point.max_range_m <= 50.0
        );
    }
    // No along-track velocity offset: bounded and no drift
    assert!(results[4].within_bounds);
    // A 5 cm/s along-track offset drifts by hundreds of meters over the horizon
    assert!(!results[8].within_bounds);
}

#[test]
fn dispersed_sweep() {
    let orbit = leo_orbit();
    let sweep = Sweep::new(orbit, Vector6::new(0.0, 0.0, 0.01, 0.0, 0.0, 0.01), 0.0, 1e4).unwrap();
    let points = sweep
        .dispersed_points(&Vector6::new(1.0, 1.0, 1.0, 1e-3, 1e-3, 1e-3), 8, Some(2024))
        .unwrap();

    let prop = Propagator::default(RelativeDynamics::earth_j2());
    let grid = TimeGrid::spanning(0.0, 1_000.0, 10).unwrap();
    let results = sweep.run(&prop, &grid, &points);
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|p| p.stable && p.within_bounds));
}
