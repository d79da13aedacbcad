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

use super::{DragConfig, Dynamics, DynamicsError, DynamicsStateSnafu, RelativeJacobian};
use crate::cosmic::{
    CentralBody, ReferenceOrbit, ReferenceState, RelativeState, State, INTEGRATION_STATE_LEN,
};
use crate::linalg::{Const, Matrix6, OVector, Vector6};
use snafu::ResultExt;
use std::fmt;

/// Relative motion of a chaser about a J2 and drag perturbed reference orbit.
///
/// The integrated state is the reference orbit state, the relative state and the 6x6 STM of the relative state,
/// where the STM follows `dPhi/dt = A Phi` with `A` the partials of the relative equations of motion.
/// The system is autonomous: time is only used by the integrator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RelativeDynamics {
    pub body: CentralBody,
    pub drag: DragConfig,
}

impl RelativeDynamics {
    pub fn new(body: CentralBody, drag: DragConfig) -> Self {
        Self { body, drag }
    }

    /// Relative dynamics about the body of the provided reference orbit
    pub fn around(orbit: &ReferenceOrbit, drag: DragConfig) -> Self {
        Self::new(orbit.body(), drag)
    }

    /// Two body and J2 dynamics about the Earth, without drag
    pub fn earth_j2() -> Self {
        Self::new(CentralBody::earth(), DragConfig::none())
    }

    pub fn jacobian(&self) -> RelativeJacobian {
        RelativeJacobian::new(self.body, self.drag)
    }

    /// Time derivative of `[r, vz, h, theta, i]`
    pub fn reference_eom(&self, reference: &ReferenceState) -> [f64; 5] {
        let mu = self.body.mu_m3_s2;
        let k_j2 = self.body.k_j2();
        let ReferenceState {
            radius_m: r,
            vz_m_s: vz,
            h_m2_s: h,
            theta_rad: theta,
            inc_rad: inc,
        } = *reference;
        let sin_theta = theta.sin();
        let (sin_i, cos_i) = inc.sin_cos();

        let mut d_vz = mu / r.powi(2) - h.powi(2) / r.powi(3)
            + k_j2 * (1.0 - 3.0 * sin_i.powi(2) * sin_theta.powi(2)) / r.powi(4);

        if let Some(factor) = self.drag.reference_drag_factor() {
            let v_ref = ((h / r).powi(2) + vz.powi(2)).sqrt();
            // Only the nadir component is affected
            d_vz += -factor * self.drag.atmosphere.density(r) * vz * v_ref;
        }

        [
            -vz,
            d_vz,
            -k_j2 * sin_i.powi(2) * (2.0 * theta).sin() / r.powi(3),
            h / r.powi(2) + 2.0 * k_j2 * cos_i.powi(2) * sin_theta.powi(2) / (h * r.powi(3)),
            -k_j2 * (2.0 * theta).sin() * (2.0 * inc).sin() / (2.0 * h * r.powi(3)),
        ]
    }
}

impl Default for RelativeDynamics {
    fn default() -> Self {
        Self::earth_j2()
    }
}

impl fmt::Display for RelativeDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "relative dynamics about {} with {}", self.body, self.drag)
    }
}

impl Dynamics for RelativeDynamics {
    type StateType = RelativeState;

    fn eom(
        &self,
        delta_t_s: f64,
        state: &OVector<f64, Const<INTEGRATION_STATE_LEN>>,
        ctx: &RelativeState,
    ) -> Result<OVector<f64, Const<INTEGRATION_STATE_LEN>>, DynamicsError> {
        let osc = ctx
            .set_with_delta_seconds(delta_t_s, state)
            .context(DynamicsStateSnafu)?;

        let reference_dt = self.reference_eom(&osc.reference);
        let (relative_dt, grad) = self.dual_eom(delta_t_s, &osc)?;
        let stm_dt = grad * osc.stm;

        // The STM derivative is flattened in row-major order, like the STM itself.
        Ok(OVector::<f64, Const<INTEGRATION_STATE_LEN>>::from_iterator(
            reference_dt
                .into_iter()
                .chain(relative_dt.iter().copied())
                .chain(stm_dt.transpose().iter().copied()),
        ))
    }

    fn dual_eom(
        &self,
        _delta_t_s: f64,
        osc: &RelativeState,
    ) -> Result<(Vector6<f64>, Matrix6<f64>), DynamicsError> {
        Ok(self
            .jacobian()
            .eom_and_jacobian(&osc.reference, &osc.relative))
    }
}
