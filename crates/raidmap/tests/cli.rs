//! CLI surface tests for the `raidmap` binary.

use assert_cmd::Command;
use predicates::prelude::*;

const MAPS_JSON: &str = r#"[
  {
    "key": "customs",
    "displayName": "Customs",
    "baseTransform": [1, 0, 0, -1, 0, 1000],
    "calibrationPoints": [
      {"id": "cp1", "name": "crane", "gameX": 200.0, "gameZ": 300.0,
       "targetX": 220.0, "targetY": 680.0}
    ]
  },
  {
    "key": "woods",
    "displayName": "Woods"
  }
]"#;

const SCREENSHOT: &str = "2023-12-27[22-24]_200.0, 2.9, 300.0_0.0, 0.0, 0.0, 1.0_12.1 (0).png";

fn write_maps(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("maps.json");
    std::fs::write(&path, MAPS_JSON).unwrap();
    path
}

fn raidmap() -> Command {
    Command::cargo_bin("raidmap").unwrap()
}

#[test]
fn locate_prints_one_json_position_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let maps = write_maps(&dir);

    raidmap()
        .args(["locate", "--maps"])
        .arg(&maps)
        .args(["--map", "customs"])
        .arg(SCREENSHOT)
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""mapKey":"customs""#)
                .and(predicate::str::contains(r#""x":220.0"#))
                .and(predicate::str::contains(r#""y":680.0"#)),
        );
}

#[test]
fn locate_skips_bad_names_but_fails_on_all_bad() {
    let dir = tempfile::tempdir().unwrap();
    let maps = write_maps(&dir);

    // One good, one bad: succeeds, projecting the good one.
    raidmap()
        .args(["locate", "--maps"])
        .arg(&maps)
        .args(["--map", "customs"])
        .arg(SCREENSHOT)
        .arg("not-a-screenshot.png")
        .assert()
        .success()
        .stdout(predicate::str::contains("mapKey").count(1));

    // All bad: nothing to print, non-zero exit.
    raidmap()
        .args(["locate", "--maps"])
        .arg(&maps)
        .args(["--map", "customs", "not-a-screenshot.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no screenshot carried usable telemetry"));
}

#[test]
fn locate_rejects_unknown_map_key() {
    let dir = tempfile::tempdir().unwrap();
    let maps = write_maps(&dir);

    raidmap()
        .args(["locate", "--maps"])
        .arg(&maps)
        .args(["--map", "streets"])
        .arg(SCREENSHOT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("streets"));
}

#[test]
fn locate_on_map_without_transform_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let maps = write_maps(&dir);

    raidmap()
        .args(["locate", "--maps"])
        .arg(&maps)
        .args(["--map", "woods"])
        .arg(SCREENSHOT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no base transform"));
}

#[test]
fn fit_recovers_synthetic_transform() {
    let dir = tempfile::tempdir().unwrap();
    let pairs = dir.path().join("pairs.json");
    // Generated from [2, 0, 0, -2, 50, 450].
    std::fs::write(
        &pairs,
        r#"[
          {"id": "a", "gameX": 0.0, "gameZ": 0.0, "targetX": 50.0, "targetY": 450.0},
          {"id": "b", "gameX": 100.0, "gameZ": 0.0, "targetX": 250.0, "targetY": 450.0},
          {"id": "c", "gameX": 0.0, "gameZ": 100.0, "targetX": 50.0, "targetY": 250.0}
        ]"#,
    )
    .unwrap();

    let output = raidmap()
        .args(["fit", "--pairs"])
        .arg(&pairs)
        .output()
        .unwrap();
    assert!(output.status.success());
    let coeffs: Vec<f64> = serde_json::from_slice(&output.stdout).unwrap();
    for (got, want) in coeffs.iter().zip([2.0, 0.0, 0.0, -2.0, 50.0, 450.0]) {
        assert!((got - want).abs() < 1e-9, "coefficient {got} != {want}");
    }
}

#[test]
fn fit_with_too_few_pairs_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let pairs = dir.path().join("pairs.json");
    std::fs::write(
        &pairs,
        r#"[
          {"id": "a", "gameX": 0.0, "gameZ": 0.0, "targetX": 0.0, "targetY": 1000.0},
          {"id": "b", "gameX": 10.0, "gameZ": 10.0, "targetX": 10.0, "targetY": 990.0}
        ]"#,
    )
    .unwrap();

    raidmap()
        .args(["fit", "--pairs"])
        .arg(&pairs)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least 3"));
}

#[test]
fn maps_summary_flags_invalid_records() {
    let dir = tempfile::tempdir().unwrap();
    let maps = write_maps(&dir);

    raidmap()
        .args(["maps", "--maps"])
        .arg(&maps)
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("customs (Customs): ok, 1 calibration points, 0 floors")
                .and(predicate::str::contains("woods (Woods): INVALID"))
                .and(predicate::str::contains("2 maps, 1 invalid")),
        );
}
