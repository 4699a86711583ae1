use rstest::rstest;
use skin_config::load_toml;

#[rstest]
#[case(
    "[device]\npath = \"\"\n",
    "device.path must not be empty"
)]
#[case(
    "[device]\npath = \"/dev/ttyUSB0\"\n\n[sensing]\nalpha = 1.0\npressure_alpha = 1.5\n",
    "pressure_alpha"
)]
#[case(
    "[device]\npath = \"/dev/ttyUSB0\"\n\n[sensing]\nalpha = 0.0\n",
    "alpha"
)]
#[case(
    "[device]\npath = \"/dev/ttyUSB0\"\n\n[wire]\nrecord_len = 4\n",
    "record_len"
)]
#[case(
    "[device]\npath = \"/dev/ttyUSB0\"\n\n[wire]\nrecord_len = 8\nsentinel = []\n",
    "sentinel"
)]
fn rejects_invalid_config(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject invalid config");
    assert!(
        format!("{err}").to_lowercase().contains(&needle.to_lowercase()),
        "expected error to mention {needle:?}, got: {err}"
    );
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[device]
path = "/dev/ttyUSB0"

[sensing]
alpha = 0.5
pressure_alpha = 0.3
target_pressure = 5.0
history_len = 64

[logging]
sample_log = "samples.csv"
debug_log = "debug.log"

[wire]
record_len = 8
sentinel = [170, 85]
start_token = 49
stop_token = 48
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
}
