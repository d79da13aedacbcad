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

use super::drag::{cst, DragConfig};
use crate::cosmic::{CentralBody, ReferenceState};
use crate::linalg::{Matrix6, Vector6};
use hyperdual::{extract_jacobian_and_result, hyperspace_from_vector, Float, Hyperdual};

/// Provides the partials of the relative equations of motion with respect to `[x, y, z, p1, p2, p3]`.
///
/// The reference orbit state is held fixed: it is not part of the state tracked by the STM.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RelativeJacobian {
    pub body: CentralBody,
    pub drag: DragConfig,
}

impl RelativeJacobian {
    pub fn new(body: CentralBody, drag: DragConfig) -> Self {
        Self { body, drag }
    }

    /// Evaluates the time derivative of `[x, y, z, p1, p2, p3]`.
    ///
    /// Generic over the number type so that the very same equations are evaluated with
    /// floats in the equations of motion and with hyperdual numbers for the partials.
    pub fn relative_eom<T>(&self, reference: &ReferenceState, relative: &[T; 6]) -> [T; 6]
    where
        T: Float + From<f64>,
    {
        let mu = self.body.mu_m3_s2;
        let k_j2 = self.body.k_j2();
        let wy = cst::<T>(reference.wy());
        let wz = cst::<T>(reference.wz(&self.body));
        let (sin_theta, cos_theta) = reference.theta_rad.sin_cos();
        let (sin_i, cos_i) = reference.inc_rad.sin_cos();

        let [x, y, z, p1, p2, p3] = *relative;
        // Position of the chaser with respect to the center of the body
        let zr = z - cst::<T>(reference.radius_m);

        let dx = p1 + y * wz - zr * wy;
        let dy = p2 - x * wz;
        let dz = p3 - cst::<T>(reference.vz_m_s) + x * wy;

        let rc = (x * x + y * y + zr * zr).sqrt();
        let zc = x * cst::<T>(cos_theta * sin_i) - y * cst::<T>(cos_i) - zr * cst::<T>(sin_i * sin_theta);
        let w_bar = cst::<T>(-mu) / rc.powi(3) - cst::<T>(k_j2) / rc.powi(5)
            + cst::<T>(5.0 * k_j2) * zc * zc / rc.powi(7);
        let zeta = cst::<T>(2.0 * k_j2) * zc / rc.powi(5);

        let mut dp1 = w_bar * x - zeta * cst::<T>(cos_theta * sin_i) + p2 * wz - p3 * wy;
        let mut dp2 = w_bar * y + zeta * cst::<T>(cos_i) - p1 * wz;
        let mut dp3 = w_bar * zr + zeta * cst::<T>(sin_theta * sin_i) + p1 * wy;

        if let Some(factor) = self.drag.chaser_drag_factor() {
            // Chaser velocity rebuilt from the kinematics
            let v1 = dx - y * wz + zr * wy;
            let v2 = dy + x * wz;
            let v3 = dz + cst::<T>(reference.vz_m_s) - x * wy;
            let vmag = (v1 * v1 + v2 * v2 + v3 * v3).sqrt();
            let f_drag = cst::<T>(-factor) * self.drag.atmosphere.density(rc) * vmag;
            dp1 = dp1 + f_drag * v1;
            dp2 = dp2 + f_drag * v2;
            dp3 = dp3 + f_drag * v3;
        }

        [dx, dy, dz, dp1, dp2, dp3]
    }

    /// Returns the derivative of the relative state and the 6x6 matrix of its partials.
    pub fn eom_and_jacobian(
        &self,
        reference: &ReferenceState,
        relative: &Vector6<f64>,
    ) -> (Vector6<f64>, Matrix6<f64>) {
        // Build full state vector with partials in the right position (hence building with all six components)
        let state: Vector6<Hyperdual<f64, 7>> = hyperspace_from_vector(relative);
        let dual = [state[0], state[1], state[2], state[3], state[4], state[5]];

        let d_dual = Vector6::from_iterator(self.relative_eom(reference, &dual));

        extract_jacobian_and_result::<_, 6, 6, 7>(&d_dual)
    }

    /// Partial derivatives of the relative equations of motion: `A[i][j] = d(ds_i/dt) / ds_j`
    pub fn jacobian(&self, reference: &ReferenceState, relative: &Vector6<f64>) -> Matrix6<f64> {
        self.eom_and_jacobian(reference, relative).1
    }
}
