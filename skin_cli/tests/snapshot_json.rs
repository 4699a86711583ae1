use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("create temp file");
    f.write_all(contents.as_bytes()).expect("write temp file");
    f
}

#[test]
fn snapshot_json_emits_one_object_per_patch() {
    let config = write_temp("[device]\npath = \"/dev/null\"\n");
    let layout = write_temp("1 0 0.0 0.0\n1 1 1.0 0.0\n");

    let assert = Command::cargo_bin("skin_cli")
        .unwrap()
        .arg("--config")
        .arg(config.path())
        .arg("--layout")
        .arg(layout.path())
        .arg("--simulate")
        .arg("--json")
        .arg("snapshot")
        .arg("--settle-ms")
        .arg("50")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 1, "one patch declared, expect one snapshot line");

    let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json line");
    assert_eq!(parsed["patch"], 1);
    assert!(parsed.get("mean").is_some());
    assert!(parsed.get("pressure_magnitude").is_some());
}
