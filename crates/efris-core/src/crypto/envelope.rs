// ============================================
// File: crates/efris-core/src/crypto/envelope.rs
// ============================================
//! # Envelope Codec
//!
//! ## Creation Reason
//! Every business payload sent to the gateway travels as an envelope:
//! AES-ECB ciphertext under the session key plus an RSA signature over the
//! ciphertext text. Responses come back under the same key, optionally
//! gzip-compressed.
//!
//! ## Main Functionality
//! - `encode()`: canonical JSON ─► PKCS#7 ─► AES-ECB ─► base64, then sign
//! - `decode()` / `decode_as()`: base64 ─► [gunzip] ─► AES-ECB ─► JSON
//! - `decode_plain()`: base64 ─► [gunzip] ─► JSON (unencrypted responses)
//! - `verify()`: check an inbound signature
//!
//! ## Wire Format
//! ```text
//! content   = base64( AES-ECB(key, PKCS7(canonical_json(payload))) )
//! signature = base64( RSA-PKCS1v15-SHA1(private_key, utf8(content)) )
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ECB with no IV is what the gateway accepts; identical payloads produce
//!   identical envelopes, and tests rely on that determinism
//! - The signature covers the base64 TEXT of `content`, not the ciphertext
//! - Decoding is lenient on purpose-built points only: block truncation,
//!   invalid padding and Latin-1 text. Everything else is a `Decode` error
//!
//! ## Last Modified
//! v0.1.0 - Initial envelope codec

use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ecb::cipher::block_padding::{NoPadding, Pkcs7};
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use rsa::RsaPublicKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::compress::gunzip_lenient;
use super::keys::{verify_sha1, PrivateCredential, SessionKey};
use super::AES_BLOCK_SIZE;
use crate::error::{CoreError, Result};

// ============================================
// Envelope
// ============================================

/// Encrypted and signed payload as carried in `data.content` /
/// `data.signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 AES-ECB ciphertext.
    pub content: String,
    /// Base64 RSA-SHA1 signature over the `content` text.
    pub signature: String,
}

// ============================================
// Encode
// ============================================

/// Serializes `payload` as canonical JSON: keys sorted at every level, no
/// whitespace.
///
/// # Errors
/// Returns `Common(Encoding)` if the payload cannot be represented as JSON.
pub fn canonical_json<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(payload)
        .map_err(|e| efris_common::CommonError::encoding("payload json", e.to_string()))?;
    serde_json::to_vec(&sort_keys(value))
        .map_err(|e| efris_common::CommonError::encoding("payload json", e.to_string()).into())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Encrypts `payload` under `key`, returning the base64 `content` text.
///
/// # Example
/// ```
/// use efris_core::crypto::{envelope, SessionKey};
/// use serde_json::json;
///
/// let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
/// let content = envelope::encrypt_content(&json!({"a": 1}), &key).unwrap();
/// assert_eq!(content, "96da4jqLYngT/Xmqbwk1xA==");
/// ```
///
/// # Errors
/// Returns `Encryption` if the cipher rejects the key, or an encoding error
/// if the payload is not serializable.
pub fn encrypt_content<T: Serialize + ?Sized>(payload: &T, key: &SessionKey) -> Result<String> {
    let plaintext = canonical_json(payload)?;
    let ciphertext = aes_ecb_encrypt(key, &plaintext)?;
    trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "Payload encrypted"
    );
    Ok(BASE64.encode(ciphertext))
}

/// Encrypts and signs `payload`.
///
/// Deterministic: the same payload, key and credential always produce the
/// same envelope.
///
/// # Errors
/// See [`encrypt_content`]; additionally `SignatureCreation`.
pub fn encode<T: Serialize + ?Sized>(
    payload: &T,
    key: &SessionKey,
    credential: &PrivateCredential,
) -> Result<Envelope> {
    let content = encrypt_content(payload, key)?;
    let signature = BASE64.encode(credential.sign_sha1(content.as_bytes())?);
    Ok(Envelope { content, signature })
}

// ============================================
// Decode
// ============================================

/// Decrypts gateway `content` into JSON.
///
/// # Errors
/// - `Decode` for bad base64, empty ciphertext, or non-JSON plaintext
/// - `Decompress` if `decompress` is set and the gzip stream is unusable
pub fn decode(content_b64: &str, key: &SessionKey, decompress: bool) -> Result<Value> {
    let mut data = base64_decode(content_b64)?;

    if decompress {
        data = gunzip_lenient(&data)?;
    }

    let aligned = data.len() - data.len() % AES_BLOCK_SIZE;
    if aligned == 0 {
        return Err(CoreError::decode(
            "ciphertext",
            format!("{} bytes, less than one AES block", data.len()),
        ));
    }
    if aligned != data.len() {
        debug!(
            dropped = data.len() - aligned,
            "Ciphertext not block aligned, truncating"
        );
    }

    let plaintext = aes_ecb_decrypt(key, &data[..aligned])?;
    parse_json_text(plaintext)
}

/// Decrypts gateway `content` into a typed value.
///
/// # Errors
/// See [`decode`]; additionally `Decode` if the JSON does not match `T`.
pub fn decode_as<T: DeserializeOwned>(
    content_b64: &str,
    key: &SessionKey,
    decompress: bool,
) -> Result<T> {
    let value = decode(content_b64, key, decompress)?;
    serde_json::from_value(value).map_err(|e| CoreError::decode("typed json", e.to_string()))
}

/// Decodes unencrypted `content` (`encryptCode = "0"`).
///
/// # Errors
/// `Decode` or `Decompress` as for [`decode`].
pub fn decode_plain(content_b64: &str, decompress: bool) -> Result<Value> {
    let mut data = base64_decode(content_b64)?;
    if decompress {
        data = gunzip_lenient(&data)?;
    }
    parse_json_text(data)
}

/// Verifies the signature of an inbound envelope.
///
/// # Errors
/// Returns `SignatureVerification` if the signature is not base64 or does
/// not match `content`.
pub fn verify(envelope: &Envelope, public_key: &RsaPublicKey) -> Result<()> {
    let signature = BASE64
        .decode(envelope.signature.trim())
        .map_err(|_| CoreError::SignatureVerification)?;
    verify_sha1(public_key, envelope.content.as_bytes(), &signature)
}

// ============================================
// Helpers
// ============================================

fn base64_decode(content_b64: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(content_b64.trim())
        .map_err(|e| CoreError::decode("base64", e.to_string()))
}

/// UTF-8 with a Latin-1 fallback, then JSON.
fn parse_json_text(bytes: Vec<u8>) -> Result<Value> {
    let text = String::from_utf8(bytes).unwrap_or_else(|e| {
        debug!("Plaintext is not UTF-8, decoding as Latin-1");
        e.into_bytes().into_iter().map(char::from).collect()
    });
    serde_json::from_str(&text).map_err(|e| CoreError::decode("json", e.to_string()))
}

fn aes_ecb_encrypt(key: &SessionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    match key.len() {
        16 => ecb_encrypt::<ecb::Encryptor<Aes128>>(key.as_bytes(), plaintext),
        24 => ecb_encrypt::<ecb::Encryptor<Aes192>>(key.as_bytes(), plaintext),
        32 => ecb_encrypt::<ecb::Encryptor<Aes256>>(key.as_bytes(), plaintext),
        other => Err(CoreError::invalid_key(format!("{other}-byte key"))),
    }
}

fn aes_ecb_decrypt(key: &SessionKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    match key.len() {
        16 => ecb_decrypt::<ecb::Decryptor<Aes128>>(key.as_bytes(), ciphertext),
        24 => ecb_decrypt::<ecb::Decryptor<Aes192>>(key.as_bytes(), ciphertext),
        32 => ecb_decrypt::<ecb::Decryptor<Aes256>>(key.as_bytes(), ciphertext),
        other => Err(CoreError::invalid_key(format!("{other}-byte key"))),
    }
}

fn ecb_encrypt<E: KeyInit + BlockEncryptMut>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        E::new_from_slice(key).map_err(|_| CoreError::encryption("AES key setup"))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn ecb_decrypt<D: KeyInit + BlockDecryptMut>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        D::new_from_slice(key).map_err(|_| CoreError::decode("aes", "key setup failed"))?;
    if let Ok(plaintext) = cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext) {
        return Ok(plaintext);
    }

    debug!("Invalid PKCS#7 padding, keeping unpadded plaintext");
    let cipher =
        D::new_from_slice(key).map_err(|_| CoreError::decode("aes", "key setup failed"))?;
    cipher
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CoreError::decode("aes", "ciphertext not block aligned"))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_credential;
    use flate2::{write::GzEncoder, Compression};
    use serde_json::json;
    use std::io::Write;

    const FIXTURE_KEY: &str = "00112233445566778899aabbccddeeff";
    const FIXTURE_CONTENT: &str = "96da4jqLYngT/Xmqbwk1xA==";

    fn fixture_key() -> SessionKey {
        SessionKey::from_hex(FIXTURE_KEY).unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_regression_fixture() {
        let key = fixture_key();
        assert_eq!(encrypt_content(&json!({"a": 1}), &key).unwrap(), FIXTURE_CONTENT);
        assert_eq!(decode(FIXTURE_CONTENT, &key, false).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_roundtrip_all_key_sizes() {
        let credential = test_credential();
        let payload = json!({
            "goodsCode": "AZ-0042",
            "measureUnit": "101",
            "qty": 3,
            "remarks": "Bujumbura → Kampala",
            "nested": {"z": [1, 2, {"y": null}], "a": true}
        });

        for len in [16, 24, 32] {
            let key = SessionKey::generate(len).unwrap();
            let envelope = encode(&payload, &key, &credential).unwrap();
            assert_eq!(decode(&envelope.content, &key, false).unwrap(), payload);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let credential = test_credential();
        let key = fixture_key();
        let payload = json!({"tin": "1000023516", "ninBrn": ""});

        let first = encode(&payload, &key, &credential).unwrap();
        let second = encode(&payload, &key, &credential).unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.signature, second.signature);
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let bytes = canonical_json(&json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
        assert_eq!(bytes, br#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn test_signature_verifies() {
        let credential = test_credential();
        let envelope = encode(&json!({"a": 1}), &fixture_key(), &credential).unwrap();
        assert!(verify(&envelope, credential.public_key()).is_ok());

        let tampered = Envelope {
            content: FIXTURE_CONTENT.replace('9', "8"),
            signature: envelope.signature.clone(),
        };
        assert!(matches!(
            verify(&tampered, credential.public_key()),
            Err(CoreError::SignatureVerification)
        ));
    }

    #[test]
    fn test_decode_compressed_with_junk() {
        let key = fixture_key();
        let ciphertext = BASE64.decode(FIXTURE_CONTENT).unwrap();
        let mut packed = gzip(&ciphertext);
        packed.extend_from_slice(&[0, 0, 0]);

        let value = decode(&BASE64.encode(&packed), &key, true).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_decode_truncates_partial_block() {
        let key = fixture_key();
        let mut ciphertext = BASE64.decode(FIXTURE_CONTENT).unwrap();
        ciphertext.extend_from_slice(&[0xEE; 5]);

        let value = decode(&BASE64.encode(&ciphertext), &key, false).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_decode_keeps_unpadded_plaintext() {
        // 16 bytes of JSON with no padding block at all
        let key = fixture_key();
        let plaintext = br#"{"k":"abcdefgh"}"#;
        assert_eq!(plaintext.len(), 16);
        let cipher = ecb::Encryptor::<Aes128>::new_from_slice(key.as_bytes()).unwrap();
        let ciphertext = cipher.encrypt_padded_vec_mut::<NoPadding>(plaintext);

        let value = decode(&BASE64.encode(&ciphertext), &key, false).unwrap();
        assert_eq!(value, json!({"k": "abcdefgh"}));
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let key = fixture_key();
        // "{"n":"Caf\xe9"}" is not valid UTF-8
        let plaintext = b"{\"n\":\"Caf\xe9\"}";
        let cipher = ecb::Encryptor::<Aes128>::new_from_slice(key.as_bytes()).unwrap();
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let value = decode(&BASE64.encode(&ciphertext), &key, false).unwrap();
        assert_eq!(value, json!({"n": "Café"}));
    }

    #[test]
    fn test_decode_errors() {
        let key = fixture_key();
        assert!(matches!(
            decode("not base64!", &key, false),
            Err(CoreError::Decode { .. })
        ));
        // shorter than one block
        assert!(matches!(
            decode(&BASE64.encode([1u8; 10]), &key, false),
            Err(CoreError::Decode { .. })
        ));
        assert!(matches!(
            decode(FIXTURE_CONTENT, &key, true),
            Err(CoreError::Decompress { .. })
        ));
        // wrong key yields garbage, not JSON
        let other = SessionKey::from_hex("ffeeddccbbaa99887766554433221100").unwrap();
        assert!(decode(FIXTURE_CONTENT, &other, false).is_err());
    }

    #[test]
    fn test_decode_as_typed() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Sample {
            a: u32,
        }

        let sample: Sample = decode_as(FIXTURE_CONTENT, &fixture_key(), false).unwrap();
        assert_eq!(sample, Sample { a: 1 });
    }

    #[test]
    fn test_decode_plain() {
        let content = BASE64.encode(br#"{"currentTime":"02/01/2026 14:56:31"}"#);
        let value = decode_plain(&content, false).unwrap();
        assert_eq!(value["currentTime"], "02/01/2026 14:56:31");

        let zipped = BASE64.encode(gzip(br#"{"ok":true}"#));
        assert_eq!(decode_plain(&zipped, true).unwrap(), json!({"ok": true}));
    }
}
