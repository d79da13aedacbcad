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

use crate::cosmic::CentralBody;
use crate::md::RelativeTraj;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::io::Write;
use std::path::Path;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
use typed_builder::TypedBuilder;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExportError {
    #[snafu(display("CSV export failed: {source}"))]
    Csv { source: csv::Error },
    #[snafu(display("could not flush the export: {source}"))]
    Flush { source: std::io::Error },
    #[snafu(display("no state to export"))]
    EmptyTrajectory,
}

const COLUMNS: [&str; 16] = [
    "time (s)",
    "radius (m)",
    "radial velocity (m/s)",
    "angular momentum (m^2/s)",
    "argument of latitude (rad)",
    "inclination (rad)",
    "x (m)",
    "y (m)",
    "z (m)",
    "vx (m/s)",
    "vy (m/s)",
    "vz (m/s)",
    "p1 (m/s)",
    "p2 (m/s)",
    "p3 (m/s)",
    "range (m)",
];

/// Configuration for exporting a trajectory to CSV.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct ExportCfg {
    /// Set to true to also export the STM, in row major order
    #[builder(default)]
    pub include_stm: bool,
    /// Start time to export, defaults to the start of the trajectory
    #[builder(default, setter(strip_option))]
    pub start_time_s: Option<f64>,
    /// End time to export, defaults to the end of the trajectory
    #[builder(default, setter(strip_option))]
    pub end_time_s: Option<f64>,
}

impl ExportCfg {
    fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        if self.include_stm {
            for i in 0..6 {
                for j in 0..6 {
                    headers.push(format!("stm_{i}{j}"));
                }
            }
        }
        headers
    }

    fn includes(&self, time_s: f64) -> bool {
        self.start_time_s.map_or(true, |start| time_s >= start)
            && self.end_time_s.map_or(true, |end| time_s <= end)
    }
}

impl RelativeTraj {
    /// Exports this trajectory to a CSV file. The rotating frame velocity is computed about the provided body.
    /// Returns the number of exported states.
    pub fn to_csv<P: AsRef<Path>>(
        &self,
        path: P,
        body: &CentralBody,
        cfg: ExportCfg,
    ) -> Result<usize, ExportError> {
        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();

        let writer = csv::Writer::from_path(path.as_ref()).context(CsvSnafu)?;
        let count = self.write_csv(writer, body, &cfg)?;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let tock: crate::time::Duration = tick.elapsed().into();
            info!(
                "Trajectory written to {} in {tock}",
                path.as_ref().display()
            );
        }
        Ok(count)
    }

    /// Writes this trajectory as CSV records into the provided writer.
    pub fn write_csv<W: Write>(
        &self,
        mut writer: csv::Writer<W>,
        body: &CentralBody,
        cfg: &ExportCfg,
    ) -> Result<usize, ExportError> {
        ensure!(!self.is_empty(), EmptyTrajectorySnafu);

        writer.write_record(cfg.headers()).context(CsvSnafu)?;

        let mut count = 0;
        for state in self.states.iter().filter(|s| cfg.includes(s.time_s)) {
            let velocity = state.velocity(body);
            let mut record: Vec<String> = Vec::with_capacity(COLUMNS.len() + 36);
            record.push(format!("{}", state.time_s));
            record.extend(state.reference.as_array().iter().map(|v| format!("{v:e}")));
            record.extend(state.position().iter().map(|v| format!("{v:e}")));
            record.extend(velocity.iter().map(|v| format!("{v:e}")));
            record.extend(state.pseudo_velocity().iter().map(|v| format!("{v:e}")));
            record.push(format!("{:e}", state.range_m()));
            if cfg.include_stm {
                // Transposing makes the column major iteration row major
                record.extend(state.stm.transpose().iter().map(|v| format!("{v:e}")));
            }
            writer.write_record(&record).context(CsvSnafu)?;
            count += 1;
        }

        writer.flush().context(FlushSnafu)?;
        Ok(count)
    }
}

#[cfg(test)]
mod ut_export {
    use super::*;
    use crate::cosmic::RelativeState;

    #[test]
    fn csv_records() {
        let mut traj = RelativeTraj::new();
        assert!(matches!(
            traj.write_csv(
                csv::Writer::from_writer(vec![]),
                &CentralBody::earth(),
                &ExportCfg::default()
            ),
            Err(ExportError::EmptyTrajectory)
        ));

        for i in 0..4 {
            let mut state = RelativeState::default();
            state.time_s = 10.0 * i as f64;
            state.reference.radius_m = 6.7e6;
            state.reference.h_m2_s = 5.1e10;
            traj.states.push(state);
        }

        let mut buf = Vec::new();
        let cfg = ExportCfg::builder().include_stm(true).end_time_s(20.0).build();
        let count = traj
            .write_csv(csv::Writer::from_writer(&mut buf), &CentralBody::earth(), &cfg)
            .unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("time (s),radius (m)"));
        assert_eq!(lines[0].split(',').count(), 16 + 36);
        assert_eq!(lines[1].split(',').count(), 16 + 36);
        assert!(lines[3].starts_with("20,"));
    }
}
