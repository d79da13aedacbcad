extern crate pretty_env_logger as pel;

use starmap::cosmic::CentralBody;
use starmap::io::{ConfigRepr, Configurable, ExportCfg, Scenario, ScenarioConfig};
use std::env::temp_dir;
use std::fs;

const SCENARIO: &str = r#"
name: drag rendezvous
orbit:
  sma_m: 6678136.6
  ecc: 0.0001
  inc_rad: 0.52
relative: [0.1, 0.1, 0.01, -0.02, 0.0, 0.01]
drag:
  area_to_mass_reference_m2_kg: 0.01
  area_to_mass_chaser_m2_kg: 0.01
horizon: 5000 s
samples: 501
target: [10.0, 0.0, 0.0]
"#;

#[test]
fn run_and_export_scenario() {
    let _ = pel::try_init();

    let path = temp_dir().join("starmap_run_and_export_scenario.yaml");
    fs::write(&path, SCENARIO).unwrap();

    let scenario = Scenario::from_yaml(&path).unwrap();
    println!("{scenario}");
    assert_eq!(scenario.name, "drag rendezvous");
    assert_eq!(scenario.grid.len(), 501);
    assert!(scenario.dynamics.drag.area_to_mass_chaser_m2_kg > 0.0);

    let result = scenario.run();
    assert!(result.stable(), "{:?}", result.traj.failure);
    assert!(result.target_succeeded(), "{:?}", result.targeting_error);
    assert_eq!(result.traj.len(), 501);

    let csv_path = temp_dir().join("starmap_run_and_export_scenario.csv");
    let rows = result
        .traj
        .to_csv(&csv_path, &CentralBody::earth(), ExportCfg::default())
        .unwrap();
    assert_eq!(rows, 501);

    let content = fs::read_to_string(&csv_path).unwrap();
    // Header plus one line per state
    assert_eq!(content.lines().count(), 502);

    // Only the second half, with the STM
    let cfg = ExportCfg::builder()
        .include_stm(true)
        .start_time_s(2_500.0)
        .build();
    let rows = result
        .traj
        .to_csv(&csv_path, &CentralBody::earth(), cfg)
        .unwrap();
    assert_eq!(rows, 251);
    let content = fs::read_to_string(&csv_path).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(header.split(',').count(), 16 + 36);

    fs::remove_file(&path).unwrap();
    fs::remove_file(&csv_path).unwrap();
}

#[test]
fn many_scenarios() {
    let many = format!("- {}\n- {}", indent(SCENARIO), indent(&SCENARIO.replace("5000 s", "3600 s")));
    let configs = ScenarioConfig::loads_many(&many).unwrap();
    assert_eq!(configs.len(), 2);
    let second = Scenario::from_config(configs[1].clone()).unwrap();
    assert_eq!(second.grid.end_s(), 3_600.0);
}

fn indent(yaml: &str) -> String {
    yaml.trim()
        .lines()
        .collect::<Vec<_>>()
        .join("\n  ")
}

#[test]
fn run_from_file() {
    let path = temp_dir().join("starmap_run_from_file.yaml");
    fs::write(&path, SCENARIO.replace("samples: 501", "samples: 51")).unwrap();
    let csv_path = temp_dir().join("starmap_run_from_file.csv");

    let result = Scenario::run_file(&path, Some((&csv_path, ExportCfg::default()))).unwrap();
    assert!(result.stable());
    assert!(result.target_succeeded());
    assert_eq!(fs::read_to_string(&csv_path).unwrap().lines().count(), 52);

    // Without export
    let again = Scenario::run_file(&path, None::<(&str, ExportCfg)>).unwrap();
    assert_eq!(again.delta_v, result.delta_v);

    assert!(Scenario::run_file("/this/file/does/not/exist.yaml", None::<(&str, ExportCfg)>).is_err());

    fs::remove_file(&path).unwrap();
    fs::remove_file(&csv_path).unwrap();
}
