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

use super::{DynamicsError, InvalidDragSnafu};
use crate::cosmic::EARTH_EQUATORIAL_RADIUS_M;
use hyperdual::Float;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// Converts a constant into the number type of a generic computation.
#[inline]
pub(crate) fn cst<T: From<f64>>(value: f64) -> T {
    T::from(value)
}

/// Exponential atmosphere: `rho(r) = rho0 * exp(-(r - r0) / H)`.
///
/// The default is the 300 km band of the Vallado exponential model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct ExponentialAtmosphere {
    /// Radius at which the reference density applies, in meters
    #[builder(default_code = "EARTH_EQUATORIAL_RADIUS_M + 300e3")]
    pub ref_radius_m: f64,
    /// Density at the reference radius, in kg/m^3
    #[builder(default = 2.418e-11)]
    pub ref_density_kg_m3: f64,
    /// Scale height, in meters
    #[builder(default = 53_628.0)]
    pub scale_height_m: f64,
}

impl ExponentialAtmosphere {
    /// Density at the provided radius, generic so that it may be differentiated.
    pub fn density<T: Float + From<f64>>(&self, radius_m: T) -> T {
        cst::<T>(self.ref_density_kg_m3)
            * ((cst::<T>(self.ref_radius_m) - radius_m) / cst::<T>(self.scale_height_m)).exp()
    }
}

impl Default for ExponentialAtmosphere {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Drag configuration of the reference and of the chaser.
///
/// Both spacecraft share the drag coefficient and the atmosphere but have their own area-to-mass ratio.
/// The drag is skipped entirely for a spacecraft whose `0.5 * cd * A/m` is zero.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct DragConfig {
    /// coefficient of drag; (spheres are between 2.0 and 2.1, use 2.2 in Earth's atmosphere (default)).
    #[builder(default = 2.2)]
    pub cd: f64,
    /// Area-to-mass ratio of the reference spacecraft, in m^2/kg
    #[builder(default = 0.0)]
    pub area_to_mass_reference_m2_kg: f64,
    /// Area-to-mass ratio of the chaser, in m^2/kg
    #[builder(default = 0.0)]
    pub area_to_mass_chaser_m2_kg: f64,
    #[builder(default)]
    pub atmosphere: ExponentialAtmosphere,
}

impl DragConfig {
    /// No drag on either spacecraft
    pub fn none() -> Self {
        Self::builder().cd(0.0).build()
    }

    /// Same area-to-mass ratio for both spacecraft, default coefficient and atmosphere
    pub fn from_area_to_mass(area_to_mass_m2_kg: f64) -> Self {
        Self::builder()
            .area_to_mass_reference_m2_kg(area_to_mass_m2_kg)
            .area_to_mass_chaser_m2_kg(area_to_mass_m2_kg)
            .build()
    }

    pub fn is_disabled(&self) -> bool {
        self.reference_drag_factor().is_none() && self.chaser_drag_factor().is_none()
    }

    /// Returns `0.5 * cd * A/m` of the reference, if non zero
    pub fn reference_drag_factor(&self) -> Option<f64> {
        let factor = 0.5 * self.cd * self.area_to_mass_reference_m2_kg;
        (factor != 0.0).then_some(factor)
    }

    /// Returns `0.5 * cd * A/m` of the chaser, if non zero
    pub fn chaser_drag_factor(&self) -> Option<f64> {
        let factor = 0.5 * self.cd * self.area_to_mass_chaser_m2_kg;
        (factor != 0.0).then_some(factor)
    }

    /// Ensures that all parameters are finite and physically meaningful.
    pub fn validate(&self) -> Result<(), DynamicsError> {
        ensure!(
            self.cd.is_finite() && self.cd >= 0.0,
            InvalidDragSnafu {
                reason: "drag coefficient must be finite and non negative"
            }
        );
        ensure!(
            self.area_to_mass_reference_m2_kg.is_finite()
                && self.area_to_mass_reference_m2_kg >= 0.0
                && self.area_to_mass_chaser_m2_kg.is_finite()
                && self.area_to_mass_chaser_m2_kg >= 0.0,
            InvalidDragSnafu {
                reason: "area to mass ratios must be finite and non negative"
            }
        );
        ensure!(
            self.atmosphere.scale_height_m.is_finite() && self.atmosphere.scale_height_m > 0.0,
            InvalidDragSnafu {
                reason: "scale height must be strictly positive"
            }
        );
        ensure!(
            self.atmosphere.ref_density_kg_m3.is_finite()
                && self.atmosphere.ref_density_kg_m3 >= 0.0
                && self.atmosphere.ref_radius_m.is_finite(),
            InvalidDragSnafu {
                reason: "reference density must be finite and non negative"
            }
        );
        Ok(())
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Display for DragConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_disabled() {
            write!(f, "no drag")
        } else {
            write!(
                f,
                "drag (cd = {}, A/m ref = {} m^2/kg, A/m chaser = {} m^2/kg, rho0 = {:e} kg/m^3 at {} m, H = {} m)",
                self.cd,
                self.area_to_mass_reference_m2_kg,
                self.area_to_mass_chaser_m2_kg,
                self.atmosphere.ref_density_kg_m3,
                self.atmosphere.ref_radius_m,
                self.atmosphere.scale_height_m
            )
        }
    }
}
