#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use swerve::simulation::car::Car;
use swerve::simulation::commands::{Command, CommandOutcome};
use swerve::simulation::evolution::Evolution;
use swerve::simulation::params::Params;
use swerve::simulation::solo::SoloRun;
use swerve::simulation::weights::{WeightBundle, WeightsError};
use tempfile::tempdir;

fn assert_weights_close(a: &[Array2<f32>], b: &[Array2<f32>]) {
    assert_eq!(a.len(), b.len());
    for (wa, wb) in a.iter().zip(b) {
        assert_eq!(wa.dim(), wb.dim());
        for (x, y) in wa.iter().zip(wb.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

fn create_test_params() -> Params {
    Params {
        num_cars: 8,
        reproduction_threshold: 2,
        ..Params::default()
    }
}

#[test]
fn test_save_and_load_bundle() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut car = Car::new_sane(&mut rng, 0, &params).expect("sane car");
    car.sensor_spread = 1.1;
    car.sensor_length = 95.0;

    let path = car.to_bundle().save(dir.path()).expect("save");
    assert_eq!(path.file_name().unwrap(), "weights_7.json");

    let loaded = WeightBundle::load(dir.path(), params.num_sensors).expect("load");
    assert_eq!(loaded.sensor_count, 7);
    assert!((loaded.sensor_spread - 1.1).abs() < 1e-6);
    assert_eq!(loaded.sensor_length, 95.0);
    assert_weights_close(&loaded.layers, &car.brain.weights());
    assert_eq!(loaded.layers.len(), 2);
    assert_eq!(loaded.layers[0].dim(), (7, 4));
    assert_eq!(loaded.layers[1].dim(), (4, 3));
}

#[test]
fn test_load_restores_brain_and_geometry() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let original = Car::new_random(&mut rng, 0, &params);
    let mut bundle = original.to_bundle();
    bundle.sensor_length = 120.0;
    bundle.save(dir.path()).expect("save");

    let loaded = Car::load_or_random(&mut rng, 1, &params, Some(dir.path()));
    assert_weights_close(&loaded.brain.weights(), &original.brain.weights());
    assert_eq!(loaded.sensor_length, 120.0);
    assert!(loaded.sensors.iter().all(|s| s.length == 120.0));
}

#[test]
fn test_save_creates_valid_json() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let car = Car::known_good(0, &params);
    let path = car.to_bundle().save(dir.path()).expect("save");

    let json_content = fs::read_to_string(path).expect("read");
    let parsed: serde_json::Value = serde_json::from_str(&json_content).expect("Invalid JSON");

    assert_eq!(parsed["sensor_count"], 7);
    assert!(parsed.get("sensor_spread").is_some());
    assert!(parsed.get("sensor_length").is_some());
    assert!(parsed.get("layers").is_some());
}

#[test]
fn test_missing_bundle_falls_back_to_random() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert!(matches!(
        WeightBundle::load(dir.path(), params.num_sensors),
        Err(WeightsError::Io(_))
    ));

    let car = Car::load_or_random(&mut rng, 0, &params, Some(dir.path()));
    assert_eq!(car.sensors.len(), params.num_sensors);
    assert_eq!(car.sensor_length, params.sensor_length);
}

#[test]
fn test_corrupt_bundle_falls_back_to_random() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    fs::write(
        WeightBundle::path_in(dir.path(), params.num_sensors),
        "{ this is not valid json }",
    )
    .expect("write");

    assert!(matches!(
        WeightBundle::load(dir.path(), params.num_sensors),
        Err(WeightsError::Json(_))
    ));

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let car = Car::load_or_random(&mut rng, 0, &params, Some(dir.path()));
    assert_eq!(car.brain.layer_sizes(), vec![7, 4, 3]);
}

#[test]
fn test_bundle_keyed_by_sensor_count() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let car = Car::known_good(0, &params);
    car.to_bundle().save(dir.path()).expect("save");

    // Another sensor count has its own file.
    assert!(matches!(
        WeightBundle::load(dir.path(), 5),
        Err(WeightsError::Io(_))
    ));

    // A bundle copied under the wrong name is rejected.
    fs::copy(
        WeightBundle::path_in(dir.path(), 7),
        WeightBundle::path_in(dir.path(), 5),
    )
    .expect("copy");
    assert!(matches!(
        WeightBundle::load(dir.path(), 5),
        Err(WeightsError::SensorCountMismatch {
            expected: 5,
            found: 7
        })
    ));
}

#[test]
fn test_mismatched_shapes_are_rejected() {
    let bundle = WeightBundle {
        sensor_count: 7,
        sensor_spread: 1.0,
        sensor_length: 80.0,
        layers: vec![Array2::zeros((7, 4)), Array2::zeros((5, 3))],
    };
    assert!(matches!(bundle.validate(), Err(WeightsError::Shape { layer: 1 })));

    let bundle = WeightBundle {
        layers: vec![Array2::zeros((7, 4)), Array2::zeros((4, 2))],
        ..bundle
    };
    assert!(matches!(bundle.validate(), Err(WeightsError::Shape { .. })));
}

#[test]
fn test_export_command_writes_clicked_car() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut evolution = Evolution::new(params.clone(), 3, Some(dir.path().to_path_buf()));

    let outcome = evolution
        .apply_command(Command::ExportAt {
            x: params.car_x(),
            y: params.car_y(),
        })
        .expect("export");
    let CommandOutcome::Exported(path) = outcome else {
        panic!("expected an export, got {outcome:?}");
    };
    assert!(path.exists());

    let bundle = WeightBundle::load(dir.path(), params.num_sensors).expect("load");
    assert_weights_close(&bundle.layers, &evolution.cars[0].brain.weights());
}

#[test]
fn test_export_command_misses_empty_space() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut run = SoloRun::new(params, 0, Some(dir.path().to_path_buf()));

    let outcome = run
        .apply_command(Command::ExportAt { x: 5.0, y: 5.0 })
        .expect("command");
    assert_eq!(outcome, CommandOutcome::Ignored);
    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn test_exported_weights_seed_next_run() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut first = SoloRun::new(params.clone(), 4, Some(dir.path().to_path_buf()));
    first
        .apply_command(Command::ExportAt {
            x: params.car_x(),
            y: params.car_y(),
        })
        .expect("export");

    let second = SoloRun::new(params, 99, Some(dir.path().to_path_buf()));
    assert_weights_close(&second.car.brain.weights(), &first.car.brain.weights());
}

#[test]
fn test_evolution_seeds_first_car_from_stored_bundle() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let stored = Car::new_sane(&mut rng, 0, &params).expect("sane car");
    stored.to_bundle().save(dir.path()).expect("save");

    let evolution = Evolution::new(params, 0, Some(dir.path().to_path_buf()));
    assert_weights_close(&evolution.cars[0].brain.weights(), &stored.brain.weights());
}

#[test]
fn test_evolution_discards_insane_stored_bundle() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();
    // Equal outputs on every unit: zero input steers left.
    let bundle = WeightBundle {
        sensor_count: params.num_sensors,
        sensor_spread: params.sensor_spread,
        sensor_length: params.sensor_length,
        layers: vec![Array2::zeros((7, 4)), Array2::zeros((4, 3))],
    };
    bundle.save(dir.path()).expect("save");

    let evolution = Evolution::new(params.clone(), 0, Some(dir.path().to_path_buf()));
    assert_eq!(evolution.cars.len(), params.num_cars);
    assert!(evolution.cars.iter().all(|c| c.brain.is_sane()));
}

#[test]
fn test_evolution_without_stored_bundle_seeds_sane_cars() {
    let dir = tempdir().expect("tempdir");
    let params = create_test_params();

    let evolution = Evolution::new(params.clone(), 0, Some(dir.path().to_path_buf()));
    assert_eq!(evolution.cars.len(), params.num_cars);
    assert!(evolution.cars.iter().all(|c| c.brain.is_sane()));
}
