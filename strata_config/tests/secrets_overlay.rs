//! Secrets handling across a loaded configuration.
//!
//! Uses the reversible toy transforms from the shared test helpers in place
//! of a key management service.

use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use serde_json::{Value, json};
use strata_config::loader::JsonFileLoader;
use strata_config::secrets::{
    self, BoxError, CipherClient, envelope_decrypter, envelope_encrypter,
};
use strata_config::{CaseInsensitiveMap, SecretsState, StrataConfig, StrataError};
use test_helpers::cipher::{Recorder, constant, failing, reverse};
use test_helpers::jail::{with_jail, write_file};

const ENCRYPTED_FILE: &str = r#"{
    "API_KEY": "terces",
    "DB_PASSWORD": "2retnuh",
    "HOST": "example.org",
    "SECRETS": ["api_key", "DB_PASSWORD"]
}"#;

#[rstest]
fn loads_encrypted_files_and_reads_plaintext() -> Result<()> {
    with_jail(|j| {
        let path = write_file(j, "secrets.json", ENCRYPTED_FILE)?;
        let recorder = Recorder::new();
        let mut config = StrataConfig::builder()
            .loader(JsonFileLoader::new(path))
            .encrypter(reverse())
            .decrypter(recorder.wrap(reverse()))
            .initial_state(SecretsState::Encrypted)
            .build();
        config.load()?;

        ensure!(config.get_encrypted("API_KEY")? == json!("secret"), "decrypt on read");
        ensure!(config.get("api_key")? == &json!("terces"), "reads must not mutate");

        config.decrypt()?;
        ensure!(config.get("DB_PASSWORD")? == &json!("hunter2"), "bulk decrypt");
        ensure!(config.get("HOST")? == &json!("example.org"), "plain keys untouched");
        ensure!(
            recorder.calls() == vec![json!("terces"), json!("terces"), json!("2retnuh")],
            "unexpected decrypter inputs: {:?}",
            recorder.calls()
        );
        Ok(())
    })
}

#[rstest]
fn secrets_survive_a_full_cycle() -> Result<()> {
    let mut config = StrataConfig::builder()
        .encrypter(reverse())
        .decrypter(reverse())
        .build();
    config.insert("TOKEN", "abc");
    config.insert("SECRETS", json!(["TOKEN"]));

    config.encrypt()?;
    config.set_encrypted("PIN", "1234")?;
    ensure!(config.get("PIN")? == &json!("4321"), "stored encrypted");
    ensure!(
        config.get("SECRETS")? == &json!(["TOKEN", "PIN"]),
        "new secret tracked"
    );

    let err = config
        .encrypt()
        .err()
        .ok_or_else(|| anyhow!("double encryption must fail"))?;
    ensure!(
        matches!(&*err, StrataError::InvalidState { .. }),
        "unexpected error {err}"
    );

    config.decrypt()?;
    ensure!(config.get("TOKEN")? == &json!("abc"), "token round-trips");
    ensure!(config.get("PIN")? == &json!("1234"), "pin round-trips");
    Ok(())
}

#[rstest]
fn one_shot_decrypt_uses_list_and_extra_keys() -> Result<()> {
    let mut store = CaseInsensitiveMap::new();
    store.insert("A", "x");
    store.insert("B", "y");
    store.insert("C", "z");
    store.insert("SECRETS", json!(["A"]));
    secrets::decrypt(&mut store, &constant(json!("plain")), Some("SECRETS"), ["b"])?;
    let values: Vec<&Value> = ["A", "B", "C"]
        .iter()
        .map(|key| store.get(key))
        .collect::<Result<_, _>>()?;
    ensure!(
        values == [&json!("plain"), &json!("plain"), &json!("z")],
        "unexpected values {values:?}"
    );
    Ok(())
}

#[rstest]
fn failing_decrypter_names_the_key() -> Result<()> {
    let mut config = StrataConfig::builder()
        .decrypter(failing("bad ciphertext"))
        .initial_state(SecretsState::Encrypted)
        .build();
    config.insert("KEY", "opaque");
    config.insert("SECRETS", json!(["KEY"]));
    let err = config
        .decrypt()
        .err()
        .ok_or_else(|| anyhow!("decryption should fail"))?;
    ensure!(
        matches!(&*err, StrataError::Secret { key, .. } if key == "KEY"),
        "unexpected error {err}"
    );
    ensure!(
        config.secrets_state() == SecretsState::Encrypted,
        "state must not change on failure"
    );
    Ok(())
}

/// Rotates every byte by a fixed amount.
struct RotatingClient(u8);

impl CipherClient for RotatingClient {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(plaintext.iter().map(|b| b.wrapping_add(self.0)).collect())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(ciphertext.iter().map(|b| b.wrapping_sub(self.0)).collect())
    }
}

#[rstest]
fn envelope_helpers_drive_the_overlay() -> Result<()> {
    let mut config = StrataConfig::builder()
        .encrypter(envelope_encrypter(RotatingClient(7)))
        .decrypter(envelope_decrypter(RotatingClient(7), true))
        .build();
    config.insert("PASSWORD", "correct horse");
    config.insert("SECRETS", json!(["PASSWORD"]));

    config.encrypt()?;
    let stored = config.get("PASSWORD")?.clone();
    ensure!(stored != json!("correct horse"), "value should be encrypted");
    ensure!(
        config.get_encrypted("password")? == json!("correct horse"),
        "envelope should decrypt"
    );
    config.decrypt()?;
    ensure!(config.get("PASSWORD")? == &json!("correct horse"), "round trip");
    Ok(())
}
