// ============================================
// File: crates/efris-client/src/test_support.rs
// ============================================
//! Shared fixtures for the client tests: a device with a PKCS#12 archive
//! on disk and a fake gateway that speaks the T104 and envelope protocol.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p12::PFX;
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use tempfile::TempDir;

use efris_core::crypto::envelope;
use efris_core::{wrap_session_key, PaddingScheme, SessionKey};
use efris_transport::{MockTransport, TransportError};

const DUMMY_CERT: &[u8] = b"\x30\x03\x02\x01\x01";

fn device_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).unwrap())
}

fn other_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).unwrap())
}

/// A device whose private key lives in a password-protected archive.
pub struct TestDevice {
    public_key: RsaPublicKey,
    password: String,
    archive: PathBuf,
    _dir: TempDir,
}

impl TestDevice {
    pub fn new(password: &str) -> Self {
        Self::with_key(device_key().clone(), password)
    }

    /// A second device with a different key.
    pub fn other() -> Self {
        Self::with_key(other_key().clone(), "")
    }

    fn with_key(key: RsaPrivateKey, password: &str) -> Self {
        let der = key.to_pkcs8_der().unwrap();
        let pfx = PFX::new(DUMMY_CERT, der.as_bytes(), None, password, "efris-device").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("device.p12");
        std::fs::write(&archive, pfx.to_der()).unwrap();

        Self {
            public_key: RsaPublicKey::from(&key),
            password: password.to_string(),
            archive,
            _dir: dir,
        }
    }

    pub fn store(&self) -> efris_core::CredentialStore {
        efris_core::CredentialStore::new(&self.archive, self.password.as_str())
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive
    }
}

/// Base64 of a JSON value, as carried in unencrypted `data.content`.
pub fn plain_content(value: &Value) -> String {
    BASE64.encode(value.to_string())
}

/// A gateway reply wrapping `content`.
pub fn gateway_reply(content: &str, encrypted: bool, code: &str, message: &str) -> Value {
    json!({
        "data": {
            "content": content,
            "signature": "",
            "dataDescription": {
                "codeType": "0",
                "encryptCode": if encrypted { "1" } else { "0" },
                "zipCode": "0"
            }
        },
        "globalInfo": {},
        "returnStateInfo": {"returnCode": code, "returnMessage": message}
    })
}

/// A successful T104 reply carrying `key` wrapped for `public_key`.
pub fn key_exchange_reply(
    key: &SessionKey,
    public_key: &RsaPublicKey,
    scheme: PaddingScheme,
) -> Value {
    let wrapped = wrap_session_key(key, public_key, scheme).unwrap();
    let content = plain_content(&json!({"passowrdDes": wrapped, "sign": ""}));
    gateway_reply(&content, false, "00", "SUCCESS")
}

/// A fake gateway: hands out `key` on T104 and echoes every envelope call
/// back, encrypted under `key`, as `{"interfaceCode": .., "echo": ..}`.
pub fn mock_gateway(key: SessionKey, public_key: RsaPublicKey) -> MockTransport {
    MockTransport::with_handler(move |_url, body| {
        let interface = body["globalInfo"]["interfaceCode"].as_str().unwrap_or_default();
        if interface == "T104" {
            return Ok(key_exchange_reply(&key, &public_key, PaddingScheme::Pkcs1v15));
        }

        let content = body["data"]["content"].as_str().unwrap_or_default();
        let request = envelope::decode(content, &key, false)
            .map_err(|e| TransportError::invalid_response(e.to_string()))?;
        let answer = json!({"interfaceCode": interface, "echo": request});
        let reply = envelope::encrypt_content(&answer, &key)
            .map_err(|e| TransportError::invalid_response(e.to_string()))?;
        Ok(gateway_reply(&reply, true, "00", "SUCCESS"))
    })
}
