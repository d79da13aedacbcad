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

use super::{AstroError, CentralBody, InvalidOrbitSnafu};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;

/// Keplerian elements of the reference orbit about which the relative motion is computed.
///
/// All angles are in radians, distances in meters. Immutable once built.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrbit {
    sma_m: f64,
    ecc: f64,
    inc_rad: f64,
    raan_rad: f64,
    aop_rad: f64,
    ta_rad: f64,
    body: CentralBody,
}

/// The five scalars tracking the reference orbit during the propagation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceState {
    /// Orbital radius, in meters
    pub radius_m: f64,
    /// Nadir velocity, i.e. the opposite of the radial velocity, in m/s
    pub vz_m_s: f64,
    /// Specific angular momentum, in m^2/s
    pub h_m2_s: f64,
    /// Argument of latitude, in radians
    pub theta_rad: f64,
    /// Inclination, in radians
    pub inc_rad: f64,
}

impl ReferenceOrbit {
    /// Builds a reference orbit about the Earth (with its J2) using the provided gravitational parameter.
    pub fn try_keplerian(
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ta_rad: f64,
        mu_m3_s2: f64,
    ) -> Result<Self, AstroError> {
        Self::try_keplerian_around(
            sma_m,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            ta_rad,
            CentralBody::earth().with_mu(mu_m3_s2),
        )
    }

    pub fn try_keplerian_around(
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ta_rad: f64,
        body: CentralBody,
    ) -> Result<Self, AstroError> {
        let mu_m3_s2 = body.mu_m3_s2;
        ensure!(
            sma_m.is_finite() && sma_m > 0.0,
            InvalidOrbitSnafu {
                sma_m,
                ecc,
                mu_m3_s2,
                reason: "semi major axis must be strictly positive"
            }
        );
        ensure!(
            ecc.is_finite() && (0.0..1.0).contains(&ecc),
            InvalidOrbitSnafu {
                sma_m,
                ecc,
                mu_m3_s2,
                reason: "eccentricity must be in [0, 1)"
            }
        );
        ensure!(
            mu_m3_s2.is_finite() && mu_m3_s2 > 0.0,
            InvalidOrbitSnafu {
                sma_m,
                ecc,
                mu_m3_s2,
                reason: "gravitational parameter must be strictly positive"
            }
        );
        ensure!(
            [inc_rad, raan_rad, aop_rad, ta_rad]
                .iter()
                .all(|angle| angle.is_finite()),
            InvalidOrbitSnafu {
                sma_m,
                ecc,
                mu_m3_s2,
                reason: "angles must be finite"
            }
        );

        Ok(Self {
            sma_m,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            ta_rad,
            body,
        })
    }

    pub fn sma_m(&self) -> f64 {
        self.sma_m
    }

    pub fn ecc(&self) -> f64 {
        self.ecc
    }

    pub fn inc_rad(&self) -> f64 {
        self.inc_rad
    }

    pub fn raan_rad(&self) -> f64 {
        self.raan_rad
    }

    pub fn aop_rad(&self) -> f64 {
        self.aop_rad
    }

    pub fn ta_rad(&self) -> f64 {
        self.ta_rad
    }

    pub fn mu_m3_s2(&self) -> f64 {
        self.body.mu_m3_s2
    }

    /// Central body this orbit is defined about
    pub fn body(&self) -> CentralBody {
        self.body
    }

    /// Semi latus rectum, in meters
    pub fn semi_parameter_m(&self) -> f64 {
        self.sma_m * (1.0 - self.ecc.powi(2))
    }

    /// Radius at the true anomaly of these elements
    pub fn radius_m(&self) -> f64 {
        self.semi_parameter_m() / (1.0 + self.ecc * self.ta_rad.cos())
    }

    /// Specific angular momentum
    pub fn h_m2_s(&self) -> f64 {
        (self.mu_m3_s2() * self.semi_parameter_m()).sqrt()
    }

    /// Argument of latitude: argument of periapsis plus true anomaly
    pub fn arg_latitude_rad(&self) -> f64 {
        self.aop_rad + self.ta_rad
    }

    /// Time derivative of the radius, positive when climbing
    pub fn radial_velocity_m_s(&self) -> f64 {
        self.mu_m3_s2() / self.h_m2_s() * self.ecc * self.ta_rad.sin()
    }

    pub fn period_s(&self) -> f64 {
        TAU * (self.sma_m.powi(3) / self.mu_m3_s2()).sqrt()
    }

    /// Mean motion, in rad/s
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.mu_m3_s2() / self.sma_m.powi(3)).sqrt()
    }

    /// Initial scalar state of the reference orbit.
    pub fn reference_state(&self) -> ReferenceState {
        ReferenceState {
            radius_m: self.radius_m(),
            vz_m_s: -self.radial_velocity_m_s(),
            h_m2_s: self.h_m2_s(),
            theta_rad: self.arg_latitude_rad(),
            inc_rad: self.inc_rad,
        }
    }
}

impl fmt::Display for ReferenceOrbit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "sma = {:.3} m\tecc = {:.6}\tinc = {:.6} rad\traan = {:.6} rad\taop = {:.6} rad\tta = {:.6} rad",
            self.sma_m, self.ecc, self.inc_rad, self.raan_rad, self.aop_rad, self.ta_rad
        )
    }
}

impl ReferenceState {
    /// Frame angular velocity about the (cross-track) y axis
    pub fn wy(&self) -> f64 {
        -self.h_m2_s / self.radius_m.powi(2)
    }

    /// Frame angular velocity about the (nadir) z axis, caused by the J2 induced nodal motion
    pub fn wz(&self, body: &CentralBody) -> f64 {
        body.k_j2() * (2.0 * self.inc_rad).sin() * self.theta_rad.sin()
            / (self.h_m2_s * self.radius_m.powi(3))
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.radius_m,
            self.vz_m_s,
            self.h_m2_s,
            self.theta_rad,
            self.inc_rad,
        ]
    }

    pub fn from_array(items: &[f64; 5]) -> Self {
        Self {
            radius_m: items[0],
            vz_m_s: items[1],
            h_m2_s: items[2],
            theta_rad: items[3],
            inc_rad: items[4],
        }
    }
}
