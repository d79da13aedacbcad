use crate::leo_orbit;
use approx::assert_relative_eq;
use starmap::cosmic::*;
use starmap::linalg::Vector6;
use starmap::utils::{decompose, recompose, StateError};
use starmap::State;

#[test]
fn invalid_orbits() {
    assert!(matches!(
        ReferenceOrbit::try_keplerian(-7e6, 0.0, 0.5, 0.0, 0.0, 0.0, EARTH_GM),
        Err(AstroError::InvalidOrbit { .. })
    ));
    assert!(ReferenceOrbit::try_keplerian(7e6, 1.0, 0.5, 0.0, 0.0, 0.0, EARTH_GM).is_err());
    assert!(ReferenceOrbit::try_keplerian(7e6, -0.1, 0.5, 0.0, 0.0, 0.0, EARTH_GM).is_err());
    assert!(ReferenceOrbit::try_keplerian(7e6, 0.1, 0.5, 0.0, 0.0, 0.0, 0.0).is_err());
    assert!(ReferenceOrbit::try_keplerian(7e6, 0.1, f64::NAN, 0.0, 0.0, 0.0, EARTH_GM).is_err());
    assert!(CentralBody::try_new(EARTH_GM, EARTH_J2, -1.0).is_err());
}

#[test]
fn leo_reference_state() {
    let orbit = leo_orbit();
    println!("{orbit}");
    let reference = orbit.reference_state();
    // At periapsis
    assert_relative_eq!(reference.radius_m, 6_678_136.6 * (1.0 - 1e-4), max_relative = 1e-12);
    assert_eq!(reference.vz_m_s, 0.0);
    assert_relative_eq!(
        reference.h_m2_s,
        (EARTH_GM * 6_678_136.6 * (1.0 - 1e-8)).sqrt(),
        max_relative = 1e-12
    );
    assert_relative_eq!(orbit.period_s(), 5431.0, max_relative = 1e-3);
    // Frame rotates backward about the cross-track axis at the orbital rate
    assert!(reference.wy() < 0.0);
    assert_eq!(reference.wz(&orbit.body()), 0.0);
}

#[test]
fn packing_boundary() {
    let init = RelativeState::from_cartesian(&leo_orbit(), &Vector6::new(1.0, 2.0, 3.0, 0.1, 0.2, 0.3));
    let flat = init.to_vector();
    assert_eq!(flat.len(), INTEGRATION_STATE_LEN);

    let (physical, stm) = decompose(flat.as_slice(), PHYSICAL_STATE_LEN, 6).unwrap();
    assert_eq!(physical.len(), PHYSICAL_STATE_LEN);
    assert_eq!(stm, starmap::linalg::DMatrix::<f64>::identity(6, 6));
    assert_eq!(recompose(physical.as_slice(), &stm).unwrap().as_slice(), flat.as_slice());

    let rebuilt = RelativeState::try_from_flat(0.0, flat.as_slice()).unwrap();
    assert_eq!(rebuilt, init);

    assert!(matches!(
        RelativeState::try_from_flat(0.0, &flat.as_slice()[..46]),
        Err(StateError::DimensionMismatch { .. })
    ));
}
