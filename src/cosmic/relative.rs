/*
    STARMAP, relative motion propagation and single impulse targeting
    Copyright (C) 2024-onwards The STARMAP developers

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{CentralBody, ReferenceOrbit, ReferenceState, State};
use crate::dynamics::DynamicsError;
use crate::linalg::{Const, Matrix3, Matrix6, OVector, SVector, Vector3, Vector6};
use crate::utils::{decompose, StateError};
use std::fmt;

/// Number of scalars of the reference orbit state
pub const REFERENCE_STATE_LEN: usize = 5;
/// Number of physical scalars: reference orbit plus relative motion
pub const PHYSICAL_STATE_LEN: usize = 11;
/// Number of scalars in the integration vector: physical state plus the flattened 6x6 STM
pub const INTEGRATION_STATE_LEN: usize = 47;

/// Relative state of the chaser in the rotating frame of the reference orbit, with its STM.
///
/// The frame has x along-track, y cross-track (opposite of the orbit normal) and z toward nadir.
/// The relative motion is tracked through the position `(x, y, z)` and the pseudo-velocities
/// `(p1, p2, p3)`, which are the inertial velocity of the chaser expressed in the rotating frame.
/// The STM relates perturbations of these six items at the initial time to those at `time_s`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RelativeState {
    /// Time in seconds past the start of the scenario
    pub time_s: f64,
    /// State of the reference orbit
    pub reference: ReferenceState,
    /// Position (m) and pseudo-velocities (m/s): `[x, y, z, p1, p2, p3]`
    pub relative: Vector6<f64>,
    /// State transition matrix of the relative state
    pub stm: Matrix6<f64>,
}

impl RelativeState {
    /// Initialize from the reference state and the relative position and pseudo-velocities, with an identity STM.
    pub fn new(time_s: f64, reference: ReferenceState, relative: Vector6<f64>) -> Self {
        Self {
            time_s,
            reference,
            relative,
            stm: Matrix6::identity(),
        }
    }

    /// Initialize from the 11 physical scalars `[r, vz, h, theta, i, x, y, z, p1, p2, p3]`.
    pub fn from_physical(time_s: f64, physical: &[f64; PHYSICAL_STATE_LEN]) -> Self {
        let mut reference = [0.0; REFERENCE_STATE_LEN];
        reference.copy_from_slice(&physical[..REFERENCE_STATE_LEN]);
        Self::new(
            time_s,
            ReferenceState::from_array(&reference),
            Vector6::from_column_slice(&physical[REFERENCE_STATE_LEN..]),
        )
    }

    /// Initialize from the reference orbit and the rotating frame position (m) and velocity (m/s)
    /// `[x, y, z, vx, vy, vz]` of the chaser, at time zero.
    pub fn from_cartesian(orbit: &ReferenceOrbit, cartesian: &Vector6<f64>) -> Self {
        let body = orbit.body();
        let reference = orbit.reference_state();
        let wy = reference.wy();
        let wz = reference.wz(&body);
        let (x, y, z) = (cartesian[0], cartesian[1], cartesian[2]);
        let zr = z - reference.radius_m;

        let relative = Vector6::new(
            x,
            y,
            z,
            cartesian[3] - y * wz + zr * wy,
            cartesian[4] + x * wz,
            cartesian[5] + reference.vz_m_s - x * wy,
        );

        Self::new(0.0, reference, relative)
    }

    /// Rebuilds a state from a flat integration vector, failing if its size is not that of this state.
    pub fn try_from_flat(time_s: f64, flat: &[f64]) -> Result<Self, StateError> {
        let mut me = Self::default();
        me.set_from_slice(time_s, flat)?;
        Ok(me)
    }

    fn set_from_slice(&mut self, time_s: f64, flat: &[f64]) -> Result<(), StateError> {
        let (physical, stm) = decompose(flat, PHYSICAL_STATE_LEN, 6)?;
        self.time_s = time_s;
        self.reference = ReferenceState {
            radius_m: physical[0],
            vz_m_s: physical[1],
            h_m2_s: physical[2],
            theta_rad: physical[3],
            inc_rad: physical[4],
        };
        self.relative = Vector6::from_iterator(physical.iter().skip(REFERENCE_STATE_LEN).copied());
        self.stm = Matrix6::from_iterator(stm.iter().copied());
        Ok(())
    }

    /// The 11 physical scalars `[r, vz, h, theta, i, x, y, z, p1, p2, p3]`
    pub fn physical(&self) -> SVector<f64, PHYSICAL_STATE_LEN> {
        SVector::<f64, PHYSICAL_STATE_LEN>::from_iterator(
            self.reference
                .as_array()
                .into_iter()
                .chain(self.relative.iter().copied()),
        )
    }

    /// Relative position, in meters
    pub fn position(&self) -> Vector3<f64> {
        self.relative.fixed_rows::<3>(0).into_owned()
    }

    /// Pseudo-velocities, in m/s
    pub fn pseudo_velocity(&self) -> Vector3<f64> {
        self.relative.fixed_rows::<3>(3).into_owned()
    }

    /// Relative velocity of the chaser as seen in the rotating frame, in m/s
    pub fn velocity(&self, body: &CentralBody) -> Vector3<f64> {
        let wy = self.reference.wy();
        let wz = self.reference.wz(body);
        let (x, y, z) = (self.relative[0], self.relative[1], self.relative[2]);
        let zr = z - self.reference.radius_m;
        Vector3::new(
            self.relative[3] + y * wz - zr * wy,
            self.relative[4] - x * wz,
            self.relative[5] - self.reference.vz_m_s + x * wy,
        )
    }

    /// Distance between the chaser and the reference, in meters
    pub fn range_m(&self) -> f64 {
        self.position().norm()
    }

    /// Sensitivity of the position at this time to the velocity at the initial time
    pub fn phi_rv(&self) -> Matrix3<f64> {
        self.stm.fixed_view::<3, 3>(0, 3).into_owned()
    }

    pub fn is_finite(&self) -> bool {
        self.time_s.is_finite()
            && self.reference.as_array().iter().all(|v| v.is_finite())
            && self.relative.iter().all(|v| v.is_finite())
            && self.stm.iter().all(|v| v.is_finite())
    }

    /// Returns a copy of this state with the provided velocity change applied to the pseudo-velocities.
    pub fn with_delta_v(mut self, delta_v: &Vector3<f64>) -> Self {
        for i in 0..3 {
            self.relative[i + 3] += delta_v[i];
        }
        self
    }
}

impl Default for RelativeState {
    fn default() -> Self {
        Self {
            time_s: 0.0,
            reference: ReferenceState::default(),
            relative: Vector6::zeros(),
            stm: Matrix6::identity(),
        }
    }
}

impl State for RelativeState {
    type Size = Const<6>;
    type VecLength = Const<INTEGRATION_STATE_LEN>;

    /// The STM is flattened in row-major order after the physical state.
    fn to_vector(&self) -> OVector<f64, Const<INTEGRATION_STATE_LEN>> {
        OVector::<f64, Const<INTEGRATION_STATE_LEN>>::from_iterator(
            self.physical()
                .iter()
                .copied()
                .chain(self.stm.transpose().iter().copied()),
        )
    }

    fn stm(&self) -> Result<Matrix6<f64>, DynamicsError> {
        Ok(self.stm)
    }

    fn reset_stm(&mut self) {
        self.stm = Matrix6::identity();
    }

    fn set(
        &mut self,
        time_s: f64,
        vector: &OVector<f64, Const<INTEGRATION_STATE_LEN>>,
    ) -> Result<(), StateError> {
        self.set_from_slice(time_s, vector.as_slice())
    }

    fn time_s(&self) -> f64 {
        self.time_s
    }

    fn set_time_s(&mut self, time_s: f64) {
        self.time_s = time_s;
    }
}

impl fmt::Display for RelativeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[t = {} s] r = {:.3} m\tθ = {:.6} rad\tposition = [{:.6}, {:.6}, {:.6}] m\trange = {:.6} m",
            self.time_s,
            self.reference.radius_m,
            self.reference.theta_rad,
            self.relative[0],
            self.relative[1],
            self.relative[2],
            self.range_m()
        )
    }
}

impl fmt::LowerExp for RelativeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[t = {:e} s] r = {:e} m\tvz = {:e} m/s\th = {:e} m^2/s\tθ = {:e} rad\ti = {:e} rad\tx = {:e} m\ty = {:e} m\tz = {:e} m\tp = [{:e}, {:e}, {:e}] m/s",
            self.time_s,
            self.reference.radius_m,
            self.reference.vz_m_s,
            self.reference.h_m2_s,
            self.reference.theta_rad,
            self.reference.inc_rad,
            self.relative[0],
            self.relative[1],
            self.relative[2],
            self.relative[3],
            self.relative[4],
            self.relative[5],
        )
    }
}
