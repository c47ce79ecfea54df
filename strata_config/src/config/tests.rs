//! Unit tests for loading, validation and the secrets overlay.

#![expect(
    clippy::expect_used,
    reason = "tests panic to surface configuration mistakes"
)]

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::{SimpleConfig, StrataConfig, simple_config};
use crate::loader::{self, DictLoader};
use crate::secrets::{self, SecretTransform, SecretsState};
use crate::{Settings, StrataError};

fn settings(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Prefixes string values with `enc:`.
fn tag() -> impl SecretTransform {
    secrets::from_fn(|value| {
        let text = value.as_str().ok_or("expected a string")?;
        Ok(Value::String(format!("enc:{text}")))
    })
}

/// Strips the `enc:` prefix added by [`tag`].
fn untag() -> impl SecretTransform {
    secrets::from_fn(|value| {
        let text = value.as_str().ok_or("expected a string")?;
        let plain = text.strip_prefix("enc:").ok_or("not encrypted")?;
        Ok(Value::String(plain.to_owned()))
    })
}

#[fixture]
fn secret_config() -> StrataConfig {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({
            "SUPER_SECRET": "hunter2",
            "PLAIN": "visible",
            "SECRETS": ["SUPER_SECRET"],
        }))))
        .encrypter(tag())
        .decrypter(untag())
        .build();
    config.load().expect("load");
    config
}

#[rstest]
fn later_loaders_override_earlier_ones() {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({"x": 1, "y": 2}))))
        .loader(DictLoader::new(settings(json!({"X": 3, "z": 4}))))
        .build();
    config.load().expect("load");
    assert_eq!(config.get("x").ok(), Some(&json!(3)));
    assert_eq!(config.get("Y").ok(), Some(&json!(2)));
    assert_eq!(config.get("z").ok(), Some(&json!(4)));
    assert_eq!(config.len(), 3);
}

#[rstest]
fn nested_objects_are_replaced_not_merged() {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({"db": {"host": "a", "port": 1}}))))
        .loader(DictLoader::new(settings(json!({"db": {"host": "b"}}))))
        .build();
    config.load().expect("load");
    assert_eq!(config.get("db").ok(), Some(&json!({"host": "b"})));
}

#[rstest]
fn first_loader_failure_stops_loading() {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({"kept": true}))))
        .loader(loader::from_fn(|| Err(StrataError::loader("broken", "exploded"))))
        .loader(DictLoader::new(settings(json!({"never": true}))))
        .build();
    let err = config.load().expect_err("second loader fails");
    assert!(matches!(&*err, StrataError::Loader { name, .. } if name == "broken"));
    assert!(config.contains_key("kept"));
    assert!(!config.contains_key("never"));
}

#[rstest]
fn validate_reports_every_missing_key() {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({"PRESENT": 1}))))
        .required(["A", "present", "B"])
        .build();
    config.load().expect("load");
    let err = config.validate().expect_err("keys missing");
    match &*err {
        StrataError::MissingConfiguration { missing } => assert_eq!(missing, &["A", "B"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), r#"Missing required items: "A", "B""#);
}

#[rstest]
fn validate_passes_when_required_keys_exist() {
    let mut config = StrataConfig::builder()
        .loader(DictLoader::new(settings(json!({"A": 1}))))
        .required(["a"])
        .build();
    config.load().expect("load");
    config.validate().expect("all keys present");
}

#[rstest]
fn encrypt_then_decrypt_round_trips(mut secret_config: StrataConfig) {
    secret_config.encrypt().expect("encrypt");
    assert_eq!(secret_config.secrets_state(), SecretsState::Encrypted);
    assert_eq!(secret_config.get("super_secret").ok(), Some(&json!("enc:hunter2")));
    assert_eq!(secret_config.get("PLAIN").ok(), Some(&json!("visible")));

    secret_config.decrypt().expect("decrypt");
    assert!(secret_config.is_decrypted());
    assert_eq!(secret_config.get("SUPER_SECRET").ok(), Some(&json!("hunter2")));
}

#[rstest]
fn encrypting_twice_is_rejected(mut secret_config: StrataConfig) {
    secret_config.encrypt().expect("encrypt");
    let err = secret_config.encrypt().expect_err("already encrypted");
    assert!(matches!(
        &*err,
        StrataError::InvalidState {
            expected: SecretsState::Decrypted,
            actual: SecretsState::Encrypted,
        }
    ));
    assert_eq!(secret_config.get("SUPER_SECRET").ok(), Some(&json!("enc:hunter2")));
}

#[rstest]
fn decrypting_plaintext_is_rejected(mut secret_config: StrataConfig) {
    let err = secret_config.decrypt().expect_err("already decrypted");
    assert!(matches!(&*err, StrataError::InvalidState { .. }));
    assert_eq!(
        err.to_string(),
        "the configuration is already decrypted; expected it to be encrypted"
    );
}

#[rstest]
fn missing_transformer_is_reported() {
    let mut config = StrataConfig::default();
    let err = config.encrypt().expect_err("no encrypter");
    assert!(matches!(
        &*err,
        StrataError::MissingTransformer {
            operation: "encrypter"
        }
    ));
    assert!(config.is_decrypted());
}

#[rstest]
fn failed_encryption_keeps_state_and_values(mut secret_config: StrataConfig) {
    secret_config.insert("SUPER_SECRET", json!(42));
    let err = secret_config.encrypt().expect_err("non-string secret");
    assert!(matches!(&*err, StrataError::Secret { key, .. } if key == "SUPER_SECRET"));
    assert!(secret_config.is_decrypted());
    assert_eq!(secret_config.get("SUPER_SECRET").ok(), Some(&json!(42)));
}

#[rstest]
fn get_encrypted_reads_plaintext_in_both_states(mut secret_config: StrataConfig) {
    assert_eq!(secret_config.get_encrypted("super_secret").ok(), Some(json!("hunter2")));
    secret_config.encrypt().expect("encrypt");
    assert_eq!(secret_config.get_encrypted("super_secret").ok(), Some(json!("hunter2")));
    assert_eq!(secret_config.get("SUPER_SECRET").ok(), Some(&json!("enc:hunter2")));
}

#[rstest]
fn set_encrypted_stores_plaintext_when_decrypted(mut secret_config: StrataConfig) {
    secret_config.set_encrypted("NEW", "value").expect("set");
    assert_eq!(secret_config.get("new").ok(), Some(&json!("value")));
    assert_eq!(secret_config.get("SECRETS").ok(), Some(&json!(["SUPER_SECRET"])));
}

#[rstest]
fn set_encrypted_tracks_new_secrets_once(mut secret_config: StrataConfig) {
    secret_config.encrypt().expect("encrypt");
    secret_config.set_encrypted("TOKEN", "abc").expect("set");
    secret_config.set_encrypted("token", "def").expect("set again");
    assert_eq!(secret_config.get("TOKEN").ok(), Some(&json!("enc:def")));
    assert_eq!(
        secret_config.get("SECRETS").ok(),
        Some(&json!(["SUPER_SECRET", "TOKEN"]))
    );

    secret_config.decrypt().expect("decrypt");
    assert_eq!(secret_config.get("token").ok(), Some(&json!("def")));
}

#[rstest]
fn set_encrypted_creates_the_secrets_list() {
    let mut config = StrataConfig::builder()
        .encrypter(tag())
        .secrets_config_key("MY_SECRETS")
        .initial_state(SecretsState::Encrypted)
        .build();
    config.set_encrypted("api_key", "k").expect("set");
    assert_eq!(config.get("MY_SECRETS").ok(), Some(&json!(["api_key"])));
    assert!(!config.contains_key("SECRETS"));
}

#[rstest]
fn marking_state_transforms_nothing(mut secret_config: StrataConfig) {
    secret_config.mark_encrypted();
    assert_eq!(secret_config.get("SUPER_SECRET").ok(), Some(&json!("hunter2")));
    let err = secret_config.decrypt().expect_err("hunter2 is not tagged");
    assert!(matches!(&*err, StrataError::Secret { .. }));
    secret_config.mark_decrypted();
    assert!(secret_config.is_decrypted());
}

#[rstest]
fn simple_config_applies_overrides_last() {
    let config = simple_config(
        SimpleConfig::new()
            .defaults(settings(json!({"SOMETHING": "default", "OTHER": 1})))
            .overrides(settings(json!({"something": "override"}))),
    )
    .expect("load");
    assert_eq!(config.get("SOMETHING").ok(), Some(&json!("override")));
    assert_eq!(config.stored_key("something"), Some("SOMETHING"));
    assert_eq!(config.get("other").ok(), Some(&json!(1)));
}

#[rstest]
fn simple_config_validates_required_keys() {
    let err = simple_config(
        SimpleConfig::new()
            .defaults(settings(json!({"A": 1})))
            .required(["A", "B"]),
    )
    .expect_err("B missing");
    assert!(matches!(&*err, StrataError::MissingConfiguration { missing } if missing == &["B"]));
}

#[rstest]
#[case(None)]
#[case(Some(""))]
fn simple_config_skips_unset_sources(#[case] prefix: Option<&str>) {
    let mut options = SimpleConfig::new();
    if let Some(value) = prefix {
        options = options.env_var_prefix(value);
    }
    assert!(options.loaders().is_empty());
    let config = simple_config(options).expect("load");
    assert!(config.is_empty());
}

#[rstest]
fn simple_config_orders_its_loaders() {
    let options = SimpleConfig::new()
        .overrides(Settings::new())
        .env_var_prefix("APP")
        .ini_file("settings.ini")
        .json_file("settings.json")
        .defaults(Settings::new());
    let described: Vec<String> = options
        .loaders()
        .iter()
        .map(|loader| loader.describe().into_owned())
        .collect();
    assert_eq!(
        described,
        [
            "defaults",
            "json file settings.json",
            "ini file settings.ini",
            "environment prefix APP_",
            "overrides",
        ]
    );
}

#[derive(serde::Serialize)]
struct Defaults {
    name: &'static str,
    port: u16,
    _scratch: bool,
}

#[rstest]
fn defaults_can_come_from_a_struct() {
    let options = SimpleConfig::new()
        .defaults_from(&Defaults {
            name: "svc",
            port: 8080,
            _scratch: true,
        })
        .expect("serialize defaults");
    let config = simple_config(options).expect("load");
    assert_eq!(config.get("PORT").ok(), Some(&json!(8080)));
    assert!(!config.contains_key("_scratch"));
}
