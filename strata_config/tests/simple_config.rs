//! End-to-end loading through `simple_config`.
//!
//! Covers the precedence of defaults, files, environment variables and
//! overrides, plus validation of required keys.

use anyhow::{Result, anyhow, ensure};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use strata_config::{Settings, SimpleConfig, StrataError, simple_config};
use test_helpers::jail::{with_jail, write_file};

fn fixture_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn settings(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        _ => Settings::new(),
    }
}

#[fixture]
fn json_settings() -> Utf8PathBuf {
    fixture_path("json_settings.json")
}

#[rstest]
fn overrides_beat_defaults() -> Result<()> {
    let config = simple_config(
        SimpleConfig::new()
            .defaults(settings(json!({"SOMETHING": "x"})))
            .overrides(settings(json!({"SOMETHING": "y"}))),
    )?;
    ensure!(config.get("something")? == &json!("y"), "override lost");
    Ok(())
}

#[rstest]
fn every_source_contributes_in_order(json_settings: Utf8PathBuf) -> Result<()> {
    with_jail(|j| {
        j.set_env("PREFIX_OVERRIDE", "1");
        j.set_env("PREFIX_ENV_VAR_OVERRIDE", "2");
        j.set_env("PREFIX_JSON_OVERRIDE", "3");
        let config = simple_config(
            SimpleConfig::new()
                .defaults(settings(json!({"DEFAULT_ONLY": true, "JSON_1": 0})))
                .json_file(json_settings)
                .ini_file(fixture_path("config_parser.ini"))
                .env_var_prefix("PREFIX")
                .overrides(settings(json!({"OVERRIDE": 2}))),
        )?;
        ensure!(config.get("DEFAULT_ONLY")? == &json!(true), "defaults missing");
        ensure!(config.get("json_1")? == &json!(1), "JSON should beat defaults");
        ensure!(config.get("JSON_2")? == &json!(2), "JSON key missing");
        ensure!(
            config.get("env_var_override")? == &json!(2),
            "environment should beat JSON"
        );
        ensure!(
            config.get("JSON_OVERRIDE")? == &json!(3),
            "environment should beat JSON"
        );
        ensure!(config.get("OVERRIDE")? == &json!(2), "overrides should win");
        ensure!(
            config.get("INI")? == &json!({"x": "1", "y": "2"}),
            "INI sections should load"
        );
        ensure!(
            config.get("nested")? == &json!({"inner": "json"}),
            "nested JSON objects should load whole"
        );
        Ok(())
    })
}

#[rstest]
fn ini_sections_load_as_string_maps() -> Result<()> {
    let config = simple_config(SimpleConfig::new().ini_file(fixture_path("config_parser.ini")))?;
    let loaded = Value::Object(config.to_settings());
    ensure!(
        loaded == json!({"ini": {"x": "1", "y": "2"}, "ini2": {"z": "3"}}),
        "unexpected INI settings: {loaded}"
    );
    Ok(())
}

#[rstest]
fn environment_keys_keep_their_case() -> Result<()> {
    with_jail(|j| {
        j.set_env("APP_MixedCase", "value");
        let config = simple_config(SimpleConfig::new().env_var_prefix("APP"))?;
        ensure!(
            config.stored_key("mixedcase") == Some("MixedCase"),
            "prefix should be stripped and the rest kept"
        );
        Ok(())
    })
}

#[rstest]
fn required_keys_are_reported_together() -> Result<()> {
    let err = simple_config(
        SimpleConfig::new()
            .defaults(settings(json!({"PRESENT": 1})))
            .required(["MISSING_A", "present", "MISSING_B"]),
    )
    .err()
    .ok_or_else(|| anyhow!("validation should fail"))?;
    ensure!(
        err.to_string() == r#"Missing required items: "MISSING_A", "MISSING_B""#,
        "unexpected message: {err}"
    );
    Ok(())
}

#[rstest]
fn loader_errors_propagate_unchanged() -> Result<()> {
    let err = simple_config(
        SimpleConfig::new()
            .defaults(settings(json!({"A": 1})))
            .json_file(fixture_path("array_settings.json")),
    )
    .err()
    .ok_or_else(|| anyhow!("array JSON should be rejected"))?;
    match &*err {
        StrataError::Format { path, .. } => {
            ensure!(path.ends_with("array_settings.json"), "wrong path {path}");
        }
        other => return Err(anyhow!("expected a format error, got {other}")),
    }
    Ok(())
}

#[rstest]
fn files_written_at_runtime_are_read() -> Result<()> {
    with_jail(|j| {
        let path = write_file(j, "runtime.json", r#"{"PORT": 8080}"#)?;
        let config = simple_config(SimpleConfig::new().json_file(path).required(["port"]))?;
        ensure!(config.get("Port")? == &json!(8080), "port missing");
        Ok(())
    })
}
