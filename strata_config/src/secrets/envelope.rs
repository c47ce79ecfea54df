//! Base64 envelope around byte-oriented cipher clients.
//!
//! Key management services encrypt bytes and return opaque ciphertext
//! blobs. Configuration files store text, so the encrypter base64-encodes the
//! blob and the decrypter reverses it before handing the bytes back to the
//! client.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::{BoxError, SecretTransform};

/// A byte-level cipher, typically a thin adapter over a KMS client.
pub trait CipherClient: Send + Sync {
    /// Encrypt `plaintext` into an opaque ciphertext blob.
    ///
    /// # Errors
    ///
    /// Returns the client's failure.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, BoxError>;

    /// Decrypt a ciphertext blob previously produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns the client's failure.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError>;
}

impl<C: CipherClient + ?Sized> CipherClient for Arc<C> {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, BoxError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError> {
        (**self).decrypt(ciphertext)
    }
}

fn plaintext_bytes(value: &Value) -> Result<Vec<u8>, BoxError> {
    match value {
        Value::String(text) => Ok(text.as_bytes().to_vec()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .ok_or_else(|| BoxError::from("byte arrays may only contain values 0-255"))
            })
            .collect(),
        other => Err(format!("cannot encrypt non-text value {other}").into()),
    }
}

/// Encrypter producing base64 text from a [`CipherClient`].
#[derive(Clone, Debug)]
pub struct EnvelopeEncrypter<C> {
    client: C,
}

impl<C: CipherClient> SecretTransform for EnvelopeEncrypter<C> {
    fn transform(&self, value: &Value) -> Result<Value, BoxError> {
        let plaintext = plaintext_bytes(value)?;
        let ciphertext = self.client.encrypt(&plaintext)?;
        Ok(Value::String(STANDARD.encode(ciphertext)))
    }
}

/// Decrypter accepting base64 text and returning the client's plaintext.
#[derive(Clone, Debug)]
pub struct EnvelopeDecrypter<C> {
    client: C,
    decode_utf8: bool,
}

impl<C: CipherClient> SecretTransform for EnvelopeDecrypter<C> {
    fn transform(&self, value: &Value) -> Result<Value, BoxError> {
        let encoded = value
            .as_str()
            .ok_or_else(|| BoxError::from("encrypted values must be base64 strings"))?;
        let ciphertext = STANDARD.decode(encoded.trim())?;
        let plaintext = self.client.decrypt(&ciphertext)?;
        if self.decode_utf8 {
            Ok(Value::String(String::from_utf8(plaintext)?))
        } else {
            Ok(Value::Array(plaintext.into_iter().map(Value::from).collect()))
        }
    }
}

/// Build an encrypter that base64-encodes `client` ciphertext.
///
/// ```
/// use serde_json::json;
/// use strata_config::secrets::{BoxError, CipherClient, SecretTransform, envelope_encrypter};
///
/// struct Identity;
/// impl CipherClient for Identity {
///     fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, BoxError> { Ok(plaintext.to_vec()) }
///     fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BoxError> { Ok(ciphertext.to_vec()) }
/// }
///
/// let encrypter = envelope_encrypter(Identity);
/// assert_eq!(encrypter.transform(&json!("blah")).ok(), Some(json!("YmxhaA==")));
/// ```
#[must_use]
pub const fn envelope_encrypter<C: CipherClient>(client: C) -> EnvelopeEncrypter<C> {
    EnvelopeEncrypter { client }
}

/// Build a decrypter for values produced by [`envelope_encrypter`].
///
/// With `decode_utf8` the plaintext is returned as a string; otherwise it is
/// returned as an array of byte values.
#[must_use]
pub const fn envelope_decrypter<C: CipherClient>(
    client: C,
    decode_utf8: bool,
) -> EnvelopeDecrypter<C> {
    EnvelopeDecrypter {
        client,
        decode_utf8,
    }
}
