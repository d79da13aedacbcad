extern crate pretty_env_logger as pel;

use crate::leo_orbit;
use approx::assert_abs_diff_eq;
use rstest::*;
use starmap::cosmic::{CentralBody, ReferenceOrbit, RelativeState, INTEGRATION_STATE_LEN};
use starmap::dynamics::{DragConfig, Dynamics, DynamicsError, RelativeDynamics};
use starmap::linalg::{Const, Matrix6, OVector, Vector6};
use starmap::md::{propagate, propagate_with};
use starmap::propagators::*;
use starmap::time::Unit;

#[fixture]
fn scenario_a() -> RelativeState {
    RelativeState::from_cartesian(&leo_orbit(), &Vector6::new(0.0, 0.0, 0.01, 0.0, 0.0, 0.01))
}

#[rstest]
fn scenario_a_is_stable_and_bounded(scenario_a: RelativeState) {
    let _ = pel::try_init();

    let grid = TimeGrid::spanning(0.0, 10_000.0, 999).unwrap();
    let traj = propagate(
        scenario_a,
        &grid,
        RelativeDynamics::around(&leo_orbit(), DragConfig::none()),
    );

    println!("{traj}");
    assert!(traj.stable(), "{:?}", traj.failure);
    assert_eq!(traj.len(), 1000);
    // Timestamps match the requested grid exactly
    assert_eq!(traj.times_s(), grid.times_s().to_vec());

    let max_range = traj.max_range_m();
    println!("max range = {max_range} m");
    assert!(max_range.is_finite());
    assert!(max_range < 100.0);
    // Starts at the initial offset
    assert_abs_diff_eq!(traj.ranges_m()[0], 0.01, epsilon = 1e-12);
}

#[rstest]
fn initial_stm_is_identity(mut scenario_a: RelativeState) {
    // Whatever STM the initial state carries, the propagation starts from the identity
    scenario_a.stm = Matrix6::identity() * 2.0;
    let grid = TimeGrid::uniform(0.0, 60.0, 11).unwrap();
    let traj = propagate(scenario_a, &grid, RelativeDynamics::earth_j2());

    assert!(traj.stable());
    assert_eq!(traj.first().unwrap().stm, Matrix6::identity());
    assert_ne!(traj.last().unwrap().stm, Matrix6::identity());
    assert!(traj.final_stm().unwrap().unwrap().iter().all(|v| v.is_finite()));
}

#[test]
fn two_body_degeneration() {
    let _ = pel::try_init();
    // Circular orbit without J2 nor drag: constant angular momentum and radius
    let orbit = ReferenceOrbit::try_keplerian_around(
        6_778_136.3,
        0.0,
        0.9,
        0.3,
        0.0,
        0.5,
        CentralBody::earth_two_body(),
    )
    .unwrap();
    let init = RelativeState::from_cartesian(&orbit, &Vector6::new(5.0, -2.0, 1.0, 0.0, 0.01, 0.0));
    let grid = TimeGrid::spanning(0.0, 3.0 * orbit.period_s(), 300).unwrap();
    let traj = propagate(init, &grid, RelativeDynamics::around(&orbit, DragConfig::none()));

    assert!(traj.stable());
    let h0 = orbit.h_m2_s();
    for state in &traj.states {
        assert_abs_diff_eq!(state.reference.h_m2_s, h0, epsilon = 1e-12 * h0);
        assert_abs_diff_eq!(state.reference.radius_m, orbit.sma_m(), epsilon = 1e-3);
        assert_abs_diff_eq!(state.reference.inc_rad, 0.9, epsilon = 1e-14);
    }
}

#[test]
fn drag_lowers_the_reference() {
    let orbit = leo_orbit();
    let init = RelativeState::from_cartesian(&orbit, &Vector6::zeros());
    let grid = TimeGrid::spanning(0.0, 10_000.0, 100).unwrap();

    let drag = DragConfig::builder()
        .area_to_mass_reference_m2_kg(0.05)
        .area_to_mass_chaser_m2_kg(0.01)
        .build();
    let dragged = propagate(init, &grid, RelativeDynamics::around(&orbit, drag));
    let no_drag = propagate(init, &grid, RelativeDynamics::around(&orbit, DragConfig::none()));

    assert!(dragged.stable() && no_drag.stable());
    let last_drag = dragged.last().unwrap();
    let last_free = no_drag.last().unwrap();
    // The drag of the reference only acts on its radial velocity
    assert_ne!(last_drag.reference.radius_m, last_free.reference.radius_m);
    // The chaser has no offset without drag, but decays with respect to the reference with drag
    assert!(last_free.range_m() < 1e-3);
    println!("range with drag: {} m", last_drag.range_m());
    assert!(last_drag.range_m() > 1.0);
}

#[test]
fn non_finite_initial_state() {
    let _ = pel::try_init();
    let mut init = RelativeState::from_cartesian(&leo_orbit(), &Vector6::zeros());
    init.relative[0] = f64::NAN;
    let grid = TimeGrid::uniform(0.0, 10.0, 100).unwrap();
    let traj = propagate(init, &grid, RelativeDynamics::earth_j2());

    assert!(!traj.stable());
    assert!(traj.len() <= 1);
    assert!(matches!(
        traj.failure,
        Some(PropagationError::NonFiniteState { .. })
    ));
}

/// Relative dynamics whose derivatives turn to NaN past a given time
#[derive(Copy, Clone, Debug)]
struct DivergingAfter {
    dynamics: RelativeDynamics,
    after_s: f64,
}

impl Dynamics for DivergingAfter {
    type StateType = RelativeState;

    fn eom(
        &self,
        delta_t_s: f64,
        state: &OVector<f64, Const<INTEGRATION_STATE_LEN>>,
        ctx: &RelativeState,
    ) -> Result<OVector<f64, Const<INTEGRATION_STATE_LEN>>, DynamicsError> {
        let d_state = self.dynamics.eom(delta_t_s, state, ctx)?;
        if ctx.time_s + delta_t_s > self.after_s {
            Ok(d_state.map(|_| f64::NAN))
        } else {
            Ok(d_state)
        }
    }
}

#[rstest]
fn non_finite_mid_grid(scenario_a: RelativeState) {
    let _ = pel::try_init();
    let dynamics = DivergingAfter {
        dynamics: RelativeDynamics::earth_j2(),
        after_s: 45.0,
    };
    let prop = Propagator::default(dynamics);
    let grid = TimeGrid::uniform(0.0, 10.0, 11).unwrap();
    let traj = prop.with(scenario_a).for_time_grid(&grid).unwrap();

    assert!(!traj.stable());
    let failure_time_s = match traj.failure {
        Some(PropagationError::NonFiniteState { time_s }) => time_s,
        ref other => panic!("expected a non finite state, got {other:?}"),
    };
    assert_eq!(failure_time_s, 40.0);
    // Samples up to the failure only, all finite and on the grid
    assert_eq!(traj.times_s(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    assert!(traj.states.iter().all(|s| s.time_s <= failure_time_s && s.is_finite()));
}

#[rstest]
fn non_convergence_stops_the_propagation(scenario_a: RelativeState) {
    let opts = PropOpts::<RmsMixedError>::builder()
        .init_step(600.0 * Unit::Second)
        .max_step(600.0 * Unit::Second)
        .abs_tol(1e-12)
        .rel_tol(1e-12)
        .attempts(1)
        .build();
    let prop = Propagator::dp45(RelativeDynamics::earth_j2(), opts);
    let grid = TimeGrid::uniform(0.0, 600.0, 17).unwrap();
    let traj = propagate_with(&prop, scenario_a, &grid);

    assert!(!traj.stable());
    assert_eq!(traj.len(), 1);
    match traj.failure {
        Some(PropagationError::NonConvergence {
            time_s,
            error,
            attempts,
        }) => {
            assert_eq!(time_s, 0.0);
            assert!(error > 1.0);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected a non convergence, got {other:?}"),
    }

    // The same setup with the default attempts converges by reducing the step
    let opts = PropOpts::<RmsMixedError>::builder()
        .init_step(600.0 * Unit::Second)
        .max_step(600.0 * Unit::Second)
        .abs_tol(1e-12)
        .rel_tol(1e-12)
        .max_steps(100_000)
        .build();
    let traj = propagate_with(
        &Propagator::dp45(RelativeDynamics::earth_j2(), opts),
        scenario_a,
        &TimeGrid::uniform(0.0, 600.0, 3).unwrap(),
    );
    assert!(traj.stable(), "{:?}", traj.failure);
}

#[rstest]
fn cancelled_propagation(scenario_a: RelativeState) {
    let prop = Propagator::default(RelativeDynamics::earth_j2());
    let grid = TimeGrid::uniform(0.0, 10.0, 100).unwrap();
    let token = CancelToken::new();
    token.cancel();

    let traj = prop
        .with(scenario_a)
        .with_cancel(token.clone())
        .for_time_grid(&grid)
        .unwrap();
    assert!(token.is_cancelled());
    assert!(!traj.stable());
    assert_eq!(traj.len(), 1);
    assert_eq!(
        traj.failure,
        Some(PropagationError::Cancelled { time_s: 0.0 })
    );
}

#[rstest]
fn step_budget(scenario_a: RelativeState) {
    let opts = PropOpts::<RmsMixedError>::builder()
        .init_step(1.0 * Unit::Second)
        .max_step(1.0 * Unit::Second)
        .max_steps(5)
        .build();
    let prop = Propagator::dp45(RelativeDynamics::earth_j2(), opts);
    let grid = TimeGrid::uniform(0.0, 10.0, 5).unwrap();
    let traj = propagate_with(&prop, scenario_a, &grid);

    assert_eq!(traj.len(), 1);
    assert!(matches!(
        traj.failure,
        Some(PropagationError::MaxStepsExceeded { max_steps: 5, .. })
    ));
}

#[rstest]
fn grid_must_start_at_the_state(scenario_a: RelativeState) {
    let prop = Propagator::default(RelativeDynamics::earth_j2());
    let grid = TimeGrid::uniform(5.0, 10.0, 5).unwrap();
    assert!(matches!(
        prop.with(scenario_a).for_time_grid(&grid),
        Err(PropagationError::InvalidTimeGrid { .. })
    ));
    // The convenience function moves the state to the start of the grid
    let traj = propagate_with(&prop, scenario_a, &grid);
    assert!(traj.stable());
    assert_eq!(traj.first().unwrap().time_s, 5.0);
}

#[rstest]
fn integrators_agree(scenario_a: RelativeState) {
    let _ = pel::try_init();
    let dynamics = RelativeDynamics::earth_j2();
    let grid = TimeGrid::spanning(0.0, 5_000.0, 50).unwrap();
    let opts = PropOpts::with_adaptive_step_s(1e-6, 100.0, 1e-12, 1e-10, LargestMixedError);

    let dp45 = propagate_with(&Propagator::dp45(dynamics, opts), scenario_a, &grid);
    let ck45 = propagate_with(&Propagator::cash_karp45(dynamics, opts), scenario_a, &grid);
    let rkf45 = propagate_with(&Propagator::rkf45(dynamics, opts), scenario_a, &grid);

    let reference = dp45.final_position().unwrap();
    for traj in [&ck45, &rkf45] {
        assert!(traj.stable());
        let delta = (traj.final_position().unwrap() - reference).norm();
        println!("position difference: {delta:e} m");
        assert!(delta < 1e-3);
    }
}

#[rstest]
fn step_details(scenario_a: RelativeState) {
    let prop = Propagator::default(RelativeDynamics::earth_j2());
    let mut instance = prop.with(scenario_a);
    instance.single_step().unwrap();
    let details = instance.latest_details();
    println!("{details}");
    assert!(details.error <= 1.0);
    assert!(details.step > 0.0 * Unit::Second && details.step <= 10.0 * Unit::Second);
    let after_step_s = instance.state.time_s;
    assert_abs_diff_eq!(after_step_s, details.step.to_seconds(), epsilon = 1e-9);

    let end = instance.for_duration(100.0 * Unit::Second).unwrap();
    assert_eq!(end.time_s, after_step_s + 100.0);
}

#[rstest]
fn step_never_exceeds_the_max_step(scenario_a: RelativeState) {
    let opts = PropOpts::<RmsMixedError>::builder()
        .max_step(60.0 * Unit::Second)
        .build();
    let prop = Propagator::dp45(RelativeDynamics::earth_j2(), opts);
    let mut instance = prop.with(scenario_a);
    instance.set_step(1_000.0 * Unit::Second);
    for _ in 0..5 {
        instance.single_step().unwrap();
        assert!(instance.latest_details().step <= 60.0 * Unit::Second);
    }
    assert!(instance.state.time_s <= 300.0);
}
