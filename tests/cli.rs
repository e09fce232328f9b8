use assert_cmd::Command;
use predicates::prelude::*;

fn tripwright(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tripwright").unwrap();
    cmd.current_dir(dir.path()).env_remove("TRIPWRIGHT_CONFIG");
    cmd
}

#[test]
fn plan_rejects_same_day_trip() {
    let dir = tempfile::tempdir().unwrap();
    tripwright(&dir)
        .args([
            "plan",
            "--offline",
            "--destination",
            "Lisbon",
            "--start-date",
            "2025-06-10",
            "--end-date",
            "2025-06-10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be after start date"));
}

#[test]
fn offline_plan_has_one_entry_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let output = tripwright(&dir)
        .args([
            "plan",
            "--offline",
            "--destination",
            "Lisbon",
            "--start-date",
            "2025-06-10",
            "--end-date",
            "2025-06-15",
            "--group-size",
            "2",
            "--currency",
            "EUR",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["destination"], "Lisbon");
    assert_eq!(plan["duration"], "5 days");
    assert_eq!(plan["currency"], "EUR");
    assert_eq!(plan["itinerary"].as_array().unwrap().len(), 5);
    assert_eq!(plan["itinerary"][4]["date"], "2025-06-14");
    assert_eq!(plan["agents_used"].as_array().unwrap().len(), 5);
}

#[test]
fn offline_plan_as_text() {
    let dir = tempfile::tempdir().unwrap();
    tripwright(&dir)
        .args([
            "plan",
            "--offline",
            "--format",
            "text",
            "--destination",
            "Porto",
            "--start-date",
            "2025-05-01",
            "--end-date",
            "2025-05-03",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("TRIP PLAN: PORTO"))
        .stdout(predicate::str::contains("Day 2 - 2025-05-02"));
}

#[test]
fn config_file_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tripwright.yaml"), "workflow:\n  specialists: []\n").unwrap();
    tripwright(&dir)
        .args([
            "plan",
            "--offline",
            "--destination",
            "Lisbon",
            "--start-date",
            "2025-06-10",
            "--end-date",
            "2025-06-12",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No specialists enabled"));
}

#[test]
fn schema_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = tripwright(&dir).arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Config");
}
