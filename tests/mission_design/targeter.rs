extern crate pretty_env_logger as pel;

use crate::leo_orbit;
use rstest::*;
use starmap::cosmic::RelativeState;
use starmap::dynamics::{DragConfig, RelativeDynamics};
use starmap::linalg::{Vector3, Vector6};
use starmap::md::{target, Targeter, TargetingError};
use starmap::propagators::*;

const HORIZON_S: f64 = 10_000.0;

#[fixture]
fn scenario_b() -> RelativeState {
    RelativeState::from_cartesian(
        &leo_orbit(),
        &Vector6::new(0.1, 0.1, 0.01, -0.02, 0.0, 0.01),
    )
}

#[fixture]
fn grid() -> TimeGrid {
    TimeGrid::spanning(0.0, HORIZON_S, 1000).unwrap()
}

#[rstest]
#[case(Vector3::new(10.0, 0.0, 0.0))]
#[case(Vector3::new(0.0, 5.0, 0.0))]
#[case(Vector3::new(0.0, 0.0, -2.0))]
fn scenario_b_targeting(scenario_b: RelativeState, grid: TimeGrid, #[case] desired: Vector3<f64>) {
    let _ = pel::try_init();

    let dynamics = RelativeDynamics::around(&leo_orbit(), DragConfig::none());
    let result = target(scenario_b, &grid, desired, dynamics);
    println!("{result}");

    assert!(result.stable());
    assert!(result.success(), "{:?}", result.error);
    let delta_v = result.delta_v.unwrap();
    assert!(delta_v.iter().all(|v| v.is_finite()));

    // Order of magnitude of the position change over the horizon
    let achieved = result.achieved_position().unwrap();
    let position_change = (desired - achieved).norm();
    let ratio = delta_v.norm() * HORIZON_S / position_change;
    println!("|Δv| = {:.3e} m/s, |Δr| = {position_change:.3} m, ratio = {ratio:.3}", delta_v.norm());
    assert!(delta_v.norm() < 1.0);
    assert!(ratio > 1e-2 && ratio < 1e2);

    // The linear model reproduces the desired position
    let predicted = result.linear_prediction().unwrap();
    assert!((predicted - desired).norm() < 1e-6 * position_change.max(desired.norm()));

    // And the nonlinear propagation of the corrected state gets much closer than without correction
    let prop = Propagator::default(dynamics);
    let (corrected, miss_m) = Targeter::default()
        .apply(&prop, scenario_b, &grid, &delta_v, &desired)
        .unwrap();
    println!("miss without correction: {position_change:.6} m, with correction: {miss_m:.6} m");
    assert!(corrected.stable());
    assert!(miss_m < 0.1 * position_change);
    assert!(miss_m < 1.0);
}

#[rstest]
fn targeting_with_drag(scenario_b: RelativeState, grid: TimeGrid) {
    let drag = DragConfig::builder()
        .area_to_mass_reference_m2_kg(0.01)
        .area_to_mass_chaser_m2_kg(0.01)
        .build();
    let dynamics = RelativeDynamics::around(&leo_orbit(), drag);
    let result = target(scenario_b, &grid, Vector3::new(10.0, 0.0, 0.0), dynamics);
    assert!(result.stable());
    assert!(result.success(), "{:?}", result.error);
}

#[rstest]
fn unstable_targeting(mut scenario_b: RelativeState, grid: TimeGrid) {
    scenario_b.relative[3] = f64::INFINITY;
    let result = target(
        scenario_b,
        &grid,
        Vector3::new(10.0, 0.0, 0.0),
        RelativeDynamics::earth_j2(),
    );
    println!("{result}");
    assert!(!result.stable());
    assert!(!result.success());
    assert!(result.delta_v.is_none());
    assert!(matches!(result.error, Some(TargetingError::Unstable { .. })));
}

#[rstest]
fn insensitive_horizon(scenario_b: RelativeState) {
    // Over a single output time the position does not depend on the initial velocity
    let grid = TimeGrid::new(vec![0.0]).unwrap();
    let result = target(
        scenario_b,
        &grid,
        Vector3::new(10.0, 0.0, 0.0),
        RelativeDynamics::earth_j2(),
    );
    assert!(result.stable());
    assert!(!result.success());
    assert!(matches!(
        result.error,
        Some(TargetingError::SingularSensitivity { .. })
    ));
}
