use std::path::PathBuf;
use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_ttksim")
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn ttksim() -> Command {
    let mut command = Command::new(bin());
    command.env_remove("TTKSIM_CATALOG").env("RUST_LOG", "off");
    command
}

#[test]
fn simulate_command_emits_json() {
    let output = ttksim()
        .args(["simulate", "--health", "300", "--catalog", &fixture("weapons.csv")])
        .arg("Pulse Cannon=Lv1")
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    assert_eq!(payload["ttk"].as_f64(), Some(4.0));
    assert_eq!(payload["totalShots"], 3);
}

#[test]
fn simulate_command_prints_table_with_trace() {
    let output = ttksim()
        .args(["simulate", "--health", "1000", "--table", "--trace"])
        .args(["--catalog", &fixture("weapons.csv")])
        .args(["Ultimate Orkan=MK2_Lv1", "Gatling=Lv1"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("weapon\tlevel\tshots\tdamage\treloads\treload_time")
    );
    assert!(stdout.contains("Ultimate Orkan\tMK2_Lv1\t"));
    assert!(stdout.contains("Gatling\tLv1\t"));
    assert!(stdout.lines().last().unwrap_or_default().starts_with("total\t"));
}

#[test]
fn simulate_command_rejects_malformed_selection() {
    let output = ttksim()
        .args(["simulate", "--health", "300", "--catalog", &fixture("weapons.csv")])
        .arg("Pulse Cannon")
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected <name>=<level>"));
}

#[test]
fn simulate_command_reports_unknown_weapon() {
    let output = ttksim()
        .args(["simulate", "--health", "300", "--catalog", &fixture("weapons.csv")])
        .arg("Punisher=Lv1")
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Weapon Punisher not found"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = ttksim().output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_command_passes_clean_catalog() {
    let output = ttksim()
        .args(["validate", &fixture("weapons.csv")])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
    assert!(stdout.contains("(4 weapons)"));
}

#[test]
fn validate_command_returns_non_zero_on_invalid_rows() {
    let output = ttksim()
        .args(["validate", &fixture("weapons_invalid.csv")])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation failed: 2 error(s)"));
    assert!(stderr.contains("magazine_size"));
}

#[test]
fn weapons_command_lists_names_and_levels() {
    let output = ttksim()
        .args(["weapons", "--catalog", &fixture("weapons.json")])
        .output()
        .expect("weapons should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["Pulse Cannon\tLv1,Lv2", "Ultimate Orkan\tLv1,MK2_Lv1"]
    );
}
