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

use super::{
    duration_from_str, duration_to_str, ConfigError, ConfigRepr, Configurable, DragConfigSnafu,
    ExportCfg, OrbitConfigSnafu, PropConfigSnafu,
};
use crate::cosmic::{CentralBody, ReferenceOrbit, RelativeState};
use crate::dynamics::{DragConfig, RelativeDynamics};
use crate::linalg::{Vector3, Vector6};
use crate::md::{propagate_with, RelativeTraj, Targeter, TargetingError};
use crate::propagators::{PropOpts, Propagator, RmsMixedError, TimeGrid};
use crate::time::{Duration, Unit};
use crate::StarmapError;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::fmt;
use std::path::Path;

/// Embedded Runge Kutta pair used to integrate a scenario
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    #[default]
    Dormand45,
    CashKarp45,
    Fehlberg45,
}

/// Keplerian elements of the reference orbit, in meters and radians
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    pub sma_m: f64,
    pub ecc: f64,
    pub inc_rad: f64,
    #[serde(default)]
    pub raan_rad: f64,
    #[serde(default)]
    pub aop_rad: f64,
    #[serde(default)]
    pub ta_rad: f64,
    /// Defaults to the Earth with its J2
    #[serde(default)]
    pub body: Option<CentralBody>,
}

/// Serializable definition of a scenario.
///
/// ```yaml
/// name: rendezvous
/// orbit:
///   sma_m: 6678136.6
///   ecc: 0.0001
///   inc_rad: 0.52
/// relative: [0.1, 0.1, 0.01, -0.02, 0.0, 0.01]
/// horizon: 10000 s
/// samples: 1000
/// target: [10.0, 0.0, 0.0]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub orbit: OrbitConfig,
    /// Initial relative position (m) and velocity (m/s) in the rotating frame: `[x, y, z, vx, vy, vz]`
    pub relative: [f64; 6],
    /// No drag if unset
    #[serde(default)]
    pub drag: Option<DragConfig>,
    #[serde(
        serialize_with = "duration_to_str",
        deserialize_with = "duration_from_str"
    )]
    pub horizon: Duration,
    /// Number of output times, including the initial time
    pub samples: usize,
    /// Desired relative position at the end of the horizon, in meters
    #[serde(default)]
    pub target: Option<[f64; 3]>,
    #[serde(default)]
    pub integrator: Integrator,
    #[serde(default)]
    pub abs_tol: Option<f64>,
    #[serde(default)]
    pub rel_tol: Option<f64>,
}

impl ConfigRepr for ScenarioConfig {}

/// A validated scenario, ready to run.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub orbit: ReferenceOrbit,
    pub relative: Vector6<f64>,
    pub dynamics: RelativeDynamics,
    pub horizon: Duration,
    pub grid: TimeGrid,
    pub target: Option<Vector3<f64>>,
    pub integrator: Integrator,
    pub opts: PropOpts<RmsMixedError>,
}

/// Outcome of a scenario run
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioResult {
    pub name: String,
    pub traj: RelativeTraj,
    /// Velocity correction, if targeting was requested and succeeded
    pub delta_v: Option<Vector3<f64>>,
    pub targeting_error: Option<TargetingError>,
}

impl ScenarioResult {
    pub fn stable(&self) -> bool {
        self.traj.stable()
    }

    pub fn target_succeeded(&self) -> bool {
        self.delta_v.is_some()
    }
}

impl Scenario {
    /// Initial relative state, with an identity STM
    pub fn initial_state(&self) -> RelativeState {
        RelativeState::from_cartesian(&self.orbit, &self.relative)
    }

    pub fn propagator(&self) -> Propagator<RelativeDynamics, RmsMixedError> {
        match self.integrator {
            Integrator::Dormand45 => Propagator::dp45(self.dynamics, self.opts),
            Integrator::CashKarp45 => Propagator::cash_karp45(self.dynamics, self.opts),
            Integrator::Fehlberg45 => Propagator::rkf45(self.dynamics, self.opts),
        }
    }

    /// Propagates the scenario, and solves for the velocity correction if a target is set.
    pub fn run(&self) -> ScenarioResult {
        info!("Running scenario `{}`", self.name);
        let prop = self.propagator();

        match self.target {
            Some(desired) => {
                let result = Targeter::default().target(&prop, self.initial_state(), &self.grid, desired);
                ScenarioResult {
                    name: self.name.clone(),
                    traj: result.traj,
                    delta_v: result.delta_v,
                    targeting_error: result.error,
                }
            }
            None => ScenarioResult {
                name: self.name.clone(),
                traj: propagate_with(&prop, self.initial_state(), &self.grid),
                delta_v: None,
                targeting_error: None,
            },
        }
    }

    /// Loads the scenario from a YAML file and runs it, exporting the trajectory to CSV if an output is provided.
    pub fn run_file<P: AsRef<Path>, Q: AsRef<Path>>(
        path: P,
        output: Option<(Q, ExportCfg)>,
    ) -> Result<ScenarioResult, StarmapError> {
        let scenario = Self::from_yaml(path)?;
        let result = scenario.run();
        if let Some((output, cfg)) = output {
            let rows = result.traj.to_csv(output, &scenario.orbit.body(), cfg)?;
            debug!("{rows} states exported for `{}`", scenario.name);
        }
        Ok(result)
    }
}

impl Configurable for Scenario {
    type IntermediateRepr = ScenarioConfig;

    fn from_config(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        let body = match cfg.orbit.body {
            Some(body) => CentralBody::try_new(body.mu_m3_s2, body.j2, body.equatorial_radius_m)
                .context(OrbitConfigSnafu)?,
            None => CentralBody::default(),
        };
        let orbit = ReferenceOrbit::try_keplerian_around(
            cfg.orbit.sma_m,
            cfg.orbit.ecc,
            cfg.orbit.inc_rad,
            cfg.orbit.raan_rad,
            cfg.orbit.aop_rad,
            cfg.orbit.ta_rad,
            body,
        )
        .context(OrbitConfigSnafu)?;

        let drag = cfg.drag.unwrap_or_else(DragConfig::none);
        drag.validate().context(DragConfigSnafu)?;

        ensure!(
            cfg.relative.iter().all(|v| v.is_finite()),
            super::InvalidConfigSnafu {
                reason: "relative state must be finite".to_string()
            }
        );
        ensure!(
            cfg.samples >= 2,
            super::InvalidConfigSnafu {
                reason: format!("need at least two samples, got {}", cfg.samples)
            }
        );

        let grid = TimeGrid::spanning(0.0, cfg.horizon.to_seconds(), cfg.samples - 1)
            .context(PropConfigSnafu)?;

        let mut opts = PropOpts::<RmsMixedError>::default();
        if let Some(abs_tol) = cfg.abs_tol {
            opts.abs_tol = abs_tol;
        }
        if let Some(rel_tol) = cfg.rel_tol {
            opts.rel_tol = rel_tol;
        }
        // Never step over more than one output interval
        let interval = (cfg.horizon.to_seconds() / (cfg.samples - 1) as f64) * Unit::Second;
        if interval < opts.max_step {
            opts.set_max_step(interval);
        }
        opts.validate().context(PropConfigSnafu)?;

        Ok(Self {
            name: cfg.name,
            orbit,
            relative: Vector6::from_column_slice(&cfg.relative),
            dynamics: RelativeDynamics::new(body, drag),
            horizon: cfg.horizon,
            grid,
            target: cfg.target.map(|t| Vector3::from_column_slice(&t)),
            integrator: cfg.integrator,
            opts,
        })
    }

    fn to_config(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut relative = [0.0; 6];
        relative.copy_from_slice(self.relative.as_slice());
        Ok(ScenarioConfig {
            name: self.name.clone(),
            orbit: OrbitConfig {
                sma_m: self.orbit.sma_m(),
                ecc: self.orbit.ecc(),
                inc_rad: self.orbit.inc_rad(),
                raan_rad: self.orbit.raan_rad(),
                aop_rad: self.orbit.aop_rad(),
                ta_rad: self.orbit.ta_rad(),
                body: Some(self.orbit.body()),
            },
            relative,
            drag: Some(self.dynamics.drag),
            horizon: self.horizon,
            samples: self.grid.len(),
            target: self.target.map(|t| [t[0], t[1], t[2]]),
            integrator: self.integrator,
            abs_tol: Some(self.opts.abs_tol),
            rel_tol: Some(self.opts.rel_tol),
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} for {} ({} samples) with {:?}",
            self.name,
            self.dynamics,
            self.horizon,
            self.grid.len(),
            self.integrator
        )
    }
}

#[cfg(test)]
mod ut_scenario {
    use super::*;
    use crate::cosmic::AstroError;

    const SCENARIO: &str = r#"
name: rendezvous
orbit:
  sma_m: 6678136.6
  ecc: 0.0001
  inc_rad: 0.52
relative: [0.1, 0.1, 0.01, -0.02, 0.0, 0.01]
horizon: 10000 s
samples: 1001
target: [10.0, 0.0, 0.0]
integrator: cash_karp45
rel_tol: 1.0e-6
"#;

    #[test]
    fn load_scenario() {
        let cfg = ScenarioConfig::loads(SCENARIO).unwrap();
        assert_eq!(cfg.integrator, Integrator::CashKarp45);
        assert!(cfg.drag.is_none());

        let scenario = Scenario::from_config(cfg.clone()).unwrap();
        assert_eq!(scenario.grid.len(), 1001);
        assert_eq!(scenario.grid.end_s(), 10_000.0);
        assert_eq!(scenario.grid.times_s()[1], 10.0);
        assert_eq!(scenario.opts.rel_tol, 1e-6);
        assert_eq!(scenario.opts.abs_tol, 1e-10);
        assert_eq!(scenario.opts.max_step, 10.0 * Unit::Second);
        assert_eq!(scenario.orbit.body(), CentralBody::earth());
        assert_eq!(scenario.target, Some(Vector3::new(10.0, 0.0, 0.0)));
        println!("{scenario}");

        // And back
        let back = scenario.to_config().unwrap();
        assert_eq!(back.samples, cfg.samples);
        assert_eq!(back.relative, cfg.relative);
        assert_eq!(back.horizon, cfg.horizon);
        let yaml = serde_yaml::to_string(&back).unwrap();
        let again = Scenario::from_config(ScenarioConfig::loads(&yaml).unwrap()).unwrap();
        assert_eq!(again.grid, scenario.grid);
    }

    #[test]
    fn invalid_scenarios() {
        let bad_orbit = SCENARIO.replace("ecc: 0.0001", "ecc: 1.5");
        assert!(matches!(
            Scenario::from_config(ScenarioConfig::loads(&bad_orbit).unwrap()),
            Err(ConfigError::OrbitConfig { .. })
        ));

        let bad_samples = SCENARIO.replace("samples: 1001", "samples: 1");
        assert!(matches!(
            Scenario::from_config(ScenarioConfig::loads(&bad_samples).unwrap()),
            Err(ConfigError::InvalidConfig { .. })
        ));

        for body in [
            "{mu_m3_s2: 3.986004415e14, j2: .nan, equatorial_radius_m: 6378136.3}",
            "{mu_m3_s2: 3.986004415e14, j2: 1.082e-3, equatorial_radius_m: -1.0}",
            "{mu_m3_s2: 0.0, j2: 1.082e-3, equatorial_radius_m: 6378136.3}",
        ] {
            let bad_body = SCENARIO.replace("  inc_rad: 0.52", &format!("  inc_rad: 0.52\n  body: {body}"));
            let cfg = ScenarioConfig::loads(&bad_body).unwrap();
            assert!(cfg.orbit.body.is_some());
            assert!(matches!(
                Scenario::from_config(cfg),
                Err(ConfigError::OrbitConfig {
                    source: AstroError::InvalidBody { .. }
                })
            ));
        }

        assert!(ScenarioConfig::loads("name: [").is_err());
        assert!(ScenarioConfig::load("/this/file/does/not/exist.yaml").is_err());
    }
}
