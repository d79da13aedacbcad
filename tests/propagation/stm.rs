extern crate pretty_env_logger as pel;

use crate::leo_orbit;
use starmap::cosmic::RelativeState;
use starmap::dynamics::{DragConfig, RelativeDynamics};
use starmap::linalg::{Matrix6, Vector6};
use starmap::md::propagate_with;
use starmap::propagators::*;

// Compares the STM integrated with the hyperdual Jacobian against central finite differences of
// the full nonlinear propagation.
fn check_stm(dynamics: RelativeDynamics) {
    let _ = pel::try_init();
    let orbit = leo_orbit();
    let init = RelativeState::from_cartesian(&orbit, &Vector6::new(20.0, -5.0, 3.0, 0.01, 0.0, -0.02));
    let grid = TimeGrid::spanning(0.0, 2_000.0, 20).unwrap();
    let opts = PropOpts::with_adaptive_step_s(1e-6, 100.0, 1e-12, 1e-11, RmsMixedError);
    let prop = Propagator::dp45(dynamics, opts);

    let nominal = propagate_with(&prop, init, &grid);
    assert!(nominal.stable());
    let stm = nominal.last().unwrap().stm;
    println!("STM = {stm:.6}");

    let mut stm_fd = Matrix6::<f64>::zeros();
    for i in 0..6 {
        // Positions in meters, pseudo-velocities in m/s
        let pert = if i < 3 { 1e-1 } else { 1e-4 };
        let mut plus = init;
        plus.relative[i] += pert;
        let mut minus = init;
        minus.relative[i] -= pert;

        let plus_final = propagate_with(&prop, plus, &grid).last().unwrap().relative;
        let minus_final = propagate_with(&prop, minus, &grid).last().unwrap().relative;

        let column = (plus_final - minus_final) / (2.0 * pert);
        stm_fd.set_column(i, &column);
    }
    println!("FD STM = {stm_fd:.6}");

    for i in 0..6 {
        for j in 0..6 {
            let tol = 1e-5 * stm_fd[(i, j)].abs().max(1.0) + 1e-3 * stm_fd.column(j).amax();
            assert!(
                (stm[(i, j)] - stm_fd[(i, j)]).abs() < tol,
                "STM[{i}, {j}] = {} but finite differences give {}",
                stm[(i, j)],
                stm_fd[(i, j)]
            );
        }
    }
}

#[test]
fn stm_j2() {
    check_stm(RelativeDynamics::around(&leo_orbit(), DragConfig::none()));
}

#[test]
fn stm_j2_drag() {
    let drag = DragConfig::builder()
        .area_to_mass_reference_m2_kg(0.02)
        .area_to_mass_chaser_m2_kg(0.01)
        .build();
    check_stm(RelativeDynamics::around(&leo_orbit(), drag));
}
