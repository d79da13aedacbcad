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

use super::{AstroError, InvalidBodySnafu};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Earth gravitational parameter, in m^3/s^2
pub const EARTH_GM: f64 = 3.986_004_415e14;
/// Earth equatorial radius, in meters
pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6_378_136.3;
/// Earth unnormalized J2 zonal harmonic
pub const EARTH_J2: f64 = 1.082e-3;

/// Gravity field of the central body: point mass and J2 zonal harmonic only.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CentralBody {
    /// Gravitational parameter, in m^3/s^2
    pub mu_m3_s2: f64,
    /// Unnormalized J2 coefficient (set to zero to disable the oblateness)
    pub j2: f64,
    /// Equatorial radius, in meters
    pub equatorial_radius_m: f64,
}

impl CentralBody {
    pub fn earth() -> Self {
        Self {
            mu_m3_s2: EARTH_GM,
            j2: EARTH_J2,
            equatorial_radius_m: EARTH_EQUATORIAL_RADIUS_M,
        }
    }

    /// Earth without the J2 harmonic, i.e. two body dynamics
    pub fn earth_two_body() -> Self {
        Self::earth().without_j2()
    }

    pub fn try_new(mu_m3_s2: f64, j2: f64, equatorial_radius_m: f64) -> Result<Self, AstroError> {
        ensure!(
            mu_m3_s2.is_finite() && mu_m3_s2 > 0.0,
            InvalidBodySnafu {
                reason: "gravitational parameter must be strictly positive"
            }
        );
        ensure!(
            equatorial_radius_m.is_finite() && equatorial_radius_m > 0.0,
            InvalidBodySnafu {
                reason: "equatorial radius must be strictly positive"
            }
        );
        ensure!(
            j2.is_finite(),
            InvalidBodySnafu {
                reason: "J2 must be finite"
            }
        );
        Ok(Self {
            mu_m3_s2,
            j2,
            equatorial_radius_m,
        })
    }

    pub fn with_mu(mut self, mu_m3_s2: f64) -> Self {
        self.mu_m3_s2 = mu_m3_s2;
        self
    }

    pub fn without_j2(mut self) -> Self {
        self.j2 = 0.0;
        self
    }

    /// Returns the J2 strength `3/2 J2 mu R^2`, in m^5/s^2
    pub fn k_j2(&self) -> f64 {
        1.5 * self.j2 * self.mu_m3_s2 * self.equatorial_radius_m.powi(2)
    }
}

impl Default for CentralBody {
    fn default() -> Self {
        Self::earth()
    }
}

impl fmt::Display for CentralBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "central body (mu = {:e} m^3/s^2, J2 = {:e}, R = {} m)",
            self.mu_m3_s2, self.j2, self.equatorial_radius_m
        )
    }
}
