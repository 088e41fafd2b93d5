// ============================================
// File: crates/efris-client/src/services/gateway.rs
// ============================================
//! # Gateway Service
//!
//! ## Creation Reason
//! The caller-facing entry points: encrypt a payload, decrypt gateway
//! content, send a payload to an interface and read the reply, refresh
//! the session key. Every entry point returns an [`Outcome`].
//!
//! ## Send Flow
//! ```text
//! payload ─► SessionKeyStore::get ─► envelope::encode ─► POST
//!                                                         │
//!  Outcome ◄── decode per dataDescription ◄── returnCode ◄┘
//!                 │
//!                 └─ AES decode fails ─► plain base64 JSON
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Interface codes are opaque here; payload shapes belong to callers
//! - Every POST produces exactly one audit record
//! - Reply decoding falls back to plain JSON because some interfaces answer
//!   unencrypted even when the request was encrypted
//!
//! ## Last Modified
//! v0.1.0 - Initial gateway service
//! v0.1.1 - `decrypt` reports content under `decrypted_content`

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use efris_common::{CommonError, InterfaceCode, TenantId};
use efris_core::crypto::envelope;
use efris_core::protocol::{DataPayload, GatewayResponse};
use efris_core::{CredentialStore, DeviceProfile, Envelope, GatewayRequest, SessionKey};
use efris_transport::GatewayTransport;

use crate::audit::{AuditRecord, AuditSink, TracingAuditSink};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::outcome::Outcome;
use crate::services::key_store::SessionKeyStore;

// ============================================
// Result Types
// ============================================

/// Decoded reply of an envelope call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayReply {
    pub interface_code: InterfaceCode,
    pub return_code: String,
    pub return_message: String,
    /// Decoded `data.content`; `null` when the reply carries none.
    pub data: Value,
}

/// Decrypted gateway content. Kept under its own key so that payload
/// fields never mix with the outcome's `success`/`error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecryptedContent {
    pub decrypted_content: Value,
}

/// Session key state after a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub tenant: String,
    pub cache_key: String,
    pub key_bits: usize,
    pub expires_in_secs: u64,
}

// ============================================
// GatewayService
// ============================================

/// Envelope calls against the gateway.
pub struct GatewayService {
    transport: Arc<dyn GatewayTransport>,
    keys: Arc<SessionKeyStore>,
    credentials: CredentialStore,
    profile: DeviceProfile,
    server_url: String,
    timeout: Duration,
    audit: Arc<dyn AuditSink>,
}

impl GatewayService {
    /// Default envelope call timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        keys: Arc<SessionKeyStore>,
        credentials: CredentialStore,
        profile: DeviceProfile,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            keys,
            credentials,
            profile,
            server_url: server_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Builds the service from configuration.
    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn GatewayTransport>,
        keys: Arc<SessionKeyStore>,
    ) -> Self {
        Self::new(
            transport,
            keys,
            config.credential_store(),
            config.device_profile(),
            &config.gateway.server_url,
        )
        .with_timeout(config.request_timeout())
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// The session key store backing this service.
    #[must_use]
    pub fn key_store(&self) -> &Arc<SessionKeyStore> {
        &self.keys
    }

    // ========================================
    // Public entry points
    // ========================================

    /// Encrypts and signs `payload` under `tenant`'s current key.
    pub async fn encrypt(&self, tenant: &TenantId, payload: &Value) -> Outcome<Envelope> {
        Outcome::from_result(self.try_encrypt(tenant, payload).await)
    }

    /// Decodes gateway `content` under `tenant`'s current key.
    pub async fn decrypt(
        &self,
        tenant: &TenantId,
        content: &str,
        compressed: bool,
    ) -> Outcome<DecryptedContent> {
        let result = self.try_decrypt(tenant, content, compressed).await;
        Outcome::from_result(result.map(|decrypted_content| DecryptedContent { decrypted_content }))
    }

    /// Sends `payload` to `interface` and decodes the reply.
    pub async fn send(
        &self,
        tenant: &TenantId,
        interface: InterfaceCode,
        payload: &Value,
    ) -> Outcome<GatewayReply> {
        Outcome::from_result(self.try_send(tenant, interface, payload).await)
    }

    /// Forces a key exchange for `tenant`.
    pub async fn refresh_key(&self, tenant: &TenantId) -> Outcome<KeyStatus> {
        Outcome::from_result(self.try_refresh_key(tenant).await)
    }

    // ========================================
    // Result-returning variants
    // ========================================

    /// See [`GatewayService::encrypt`].
    ///
    /// # Errors
    /// Key store, credential or encoding failures.
    pub async fn try_encrypt(&self, tenant: &TenantId, payload: &Value) -> Result<Envelope> {
        let key = self.keys.get(tenant).await?;
        let credential = self.credentials.load()?;
        Ok(envelope::encode(payload, &key, &credential)?)
    }

    /// See [`GatewayService::decrypt`].
    ///
    /// # Errors
    /// Key store or decoding failures.
    pub async fn try_decrypt(&self, tenant: &TenantId, content: &str, compressed: bool) -> Result<Value> {
        let key = self.keys.get(tenant).await?;
        Ok(envelope::decode(content, &key, compressed)?)
    }

    /// See [`GatewayService::refresh_key`].
    ///
    /// # Errors
    /// Any key exchange failure.
    pub async fn try_refresh_key(&self, tenant: &TenantId) -> Result<KeyStatus> {
        let key = self.keys.refresh(tenant).await?;
        Ok(KeyStatus {
            tenant: tenant.to_string(),
            cache_key: self.keys.cache_key(tenant),
            key_bits: key.bits(),
            expires_in_secs: self.keys.expires_in(tenant).map_or(0, |d| d.as_secs()),
        })
    }

    /// See [`GatewayService::send`].
    ///
    /// # Errors
    /// - key store, credential or encoding failures before the POST
    /// - `Transport` if the POST fails
    /// - `Rejected` if the gateway answers with a non-"00" return code
    /// - `Core(Decode)` if the reply content cannot be decoded
    pub async fn try_send(
        &self,
        tenant: &TenantId,
        interface: InterfaceCode,
        payload: &Value,
    ) -> Result<GatewayReply> {
        let key = self.keys.get(tenant).await?;
        let credential = self.credentials.load()?;
        let envelope = envelope::encode(payload, &key, &credential)?;

        let request = GatewayRequest::with_envelope(&self.profile, tenant, interface.clone(), envelope);
        let body = serde_json::to_value(&request)
            .map_err(|e| CommonError::encoding("gateway request", e.to_string()))?;

        debug!(
            tenant = %tenant,
            interface = %interface,
            exchange_id = %request.global_info.data_exchange_id,
            "Sending envelope"
        );

        let started = Instant::now();
        let reply = match self
            .transport
            .post_json(&self.server_url, &body, self.timeout)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                let err = ClientError::from(e);
                warn!(tenant = %tenant, interface = %interface, error = %err, "Envelope call failed");
                self.audit.record(AuditRecord::failed(
                    interface,
                    tenant,
                    &self.server_url,
                    body,
                    None,
                    err.to_string(),
                    started.elapsed(),
                ));
                return Err(err);
            }
        };

        let result = read_reply(&interface, &reply, &key);
        let elapsed = started.elapsed();

        match &result {
            Ok(decoded) => {
                info!(
                    tenant = %tenant,
                    interface = %interface,
                    return_code = %decoded.return_code,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Envelope call completed"
                );
                self.audit.record(AuditRecord::completed(
                    interface,
                    tenant,
                    &self.server_url,
                    body,
                    reply,
                    elapsed,
                ));
            }
            Err(e) => {
                warn!(tenant = %tenant, interface = %interface, error = %e, "Envelope call rejected");
                self.audit.record(AuditRecord::failed(
                    interface,
                    tenant,
                    &self.server_url,
                    body,
                    Some(reply),
                    e.to_string(),
                    elapsed,
                ));
            }
        }

        result
    }
}

// ============================================
// Reply decoding
// ============================================

fn read_reply(interface: &InterfaceCode, reply: &Value, key: &SessionKey) -> Result<GatewayReply> {
    let response: GatewayResponse = serde_json::from_value(reply.clone()).map_err(|e| {
        ClientError::rejected(interface.as_str(), "", format!("malformed response: {e}"))
    })?;

    let state = response.return_state_info;
    if !state.is_success() {
        return Err(ClientError::rejected(
            interface.as_str(),
            state.return_code.trim(),
            state.return_message,
        ));
    }

    Ok(GatewayReply {
        interface_code: interface.clone(),
        data: decode_data(&response.data, key)?,
        return_code: state.return_code,
        return_message: state.return_message,
    })
}

/// Decodes `data.content` per its `dataDescription`.
fn decode_data(data: &DataPayload, key: &SessionKey) -> Result<Value> {
    if data.is_empty() {
        return Ok(Value::Null);
    }

    let compressed = data.data_description.is_compressed();
    if !data.data_description.is_encrypted() {
        return Ok(envelope::decode_plain(&data.content, compressed)?);
    }

    match envelope::decode(&data.content, key, compressed) {
        Ok(value) => Ok(value),
        Err(aes_err) => {
            debug!(error = %aes_err, "Encrypted decode failed, trying plain content");
            envelope::decode_plain(&data.content, compressed).map_err(|_| aes_err.into())
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditStatus, MemoryAuditSink};
    use crate::services::key_exchange::KeyExchangeClient;
    use crate::test_support::{gateway_reply, mock_gateway, plain_content, TestDevice};
    use efris_core::protocol::DataDescription;
    use efris_transport::{MockReply, MockTransport};
    use serde_json::json;

    const URL: &str = "https://gw.test/efrisws/ws/taapp/getInformation";

    struct Harness {
        service: GatewayService,
        mock: Arc<MockTransport>,
        audit: Arc<MemoryAuditSink>,
        key: SessionKey,
        device: TestDevice,
    }

    fn harness() -> Harness {
        let device = TestDevice::new("secret");
        let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
        let mock = Arc::new(mock_gateway(key.clone(), device.public_key().clone()));
        let audit = Arc::new(MemoryAuditSink::new());

        let exchange = KeyExchangeClient::new(mock.clone(), device.store(), DeviceProfile::default(), URL)
            .with_audit(audit.clone());
        let keys = Arc::new(SessionKeyStore::new(Arc::new(exchange)));
        let service = GatewayService::new(mock.clone(), keys, device.store(), DeviceProfile::default(), URL)
            .with_audit(audit.clone());

        Harness {
            service,
            mock,
            audit,
            key,
            device,
        }
    }

    fn tenant() -> TenantId {
        TenantId::parse("1000023516", "TCS9e0df01728335239").unwrap()
    }

    #[tokio::test]
    async fn test_send_round_trip() {
        let h = harness();
        let payload = json!({"tin": "1000023516", "ninBrn": ""});

        let reply = h
            .service
            .try_send(&tenant(), InterfaceCode::TaxpayerLookup, &payload)
            .await
            .unwrap();

        assert_eq!(reply.return_code, "00");
        assert_eq!(reply.data["interfaceCode"], "T119");
        assert_eq!(reply.data["echo"], payload);

        // One handshake, one envelope call
        assert_eq!(h.mock.request_count(), 2);
        let sent = h.mock.last_request().unwrap();
        assert_eq!(sent.timeout, GatewayService::DEFAULT_TIMEOUT);
        assert_eq!(sent.body["data"]["dataDescription"]["encryptCode"], "1");

        let records = h.audit.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].interface_code, InterfaceCode::KeyExchange);
        assert_eq!(records[1].interface_code, InterfaceCode::TaxpayerLookup);
        assert!(records.iter().all(AuditRecord::is_completed));
    }

    #[tokio::test]
    async fn test_request_signature_verifies() {
        let h = harness();
        h.service
            .try_send(&tenant(), InterfaceCode::ServerTime, &json!({}))
            .await
            .unwrap();

        let sent = h.mock.last_request().unwrap();
        let envelope = Envelope {
            content: sent.body["data"]["content"].as_str().unwrap().to_string(),
            signature: sent.body["data"]["signature"].as_str().unwrap().to_string(),
        };
        envelope::verify(&envelope, h.device.public_key()).unwrap();
    }

    #[tokio::test]
    async fn test_send_failure_is_audited() {
        let h = harness();
        // Prime the key so the queued timeout hits the envelope call
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));
        h.mock.push(MockReply::Timeout);

        let outcome = h
            .service
            .send(&tenant(), InterfaceCode::InvoiceUpload, &json!({"sellerDetails": {}}))
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("timed out"));

        let record = h.audit.last().unwrap();
        assert_eq!(record.status, AuditStatus::Failed);
        assert_eq!(record.interface_code, InterfaceCode::InvoiceUpload);
        assert!(record.response.is_none());
    }

    #[tokio::test]
    async fn test_rejected_return_code() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));
        h.mock.push_json(gateway_reply("", false, "2001", "Invoice already uploaded"));

        let err = h
            .service
            .try_send(&tenant(), InterfaceCode::InvoiceUpload, &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Rejected { ref code, .. } if code == "2001"));
        let record = h.audit.last().unwrap();
        assert!(!record.is_completed());
        assert!(record.response.is_some());
    }

    #[tokio::test]
    async fn test_plain_reply_fallback() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));
        // Flagged as encrypted but actually plain base64 JSON
        h.mock.push_json(gateway_reply(
            &plain_content(&json!({"currentTime": "16/10/2026 10:00:00"})),
            true,
            "00",
            "SUCCESS",
        ));

        let reply = h
            .service
            .try_send(&tenant(), InterfaceCode::ServerTime, &json!({}))
            .await
            .unwrap();
        assert_eq!(reply.data["currentTime"], "16/10/2026 10:00:00");
    }

    #[tokio::test]
    async fn test_empty_reply_data_is_null() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));
        h.mock.push_json(json!({"returnStateInfo": {"returnCode": "00", "returnMessage": "SUCCESS"}}));

        let reply = h
            .service
            .try_send(&tenant(), InterfaceCode::StockMaintain, &json!({}))
            .await
            .unwrap();
        assert!(reply.data.is_null());
    }

    #[tokio::test]
    async fn test_encrypt_and_decrypt() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));

        let outcome = h.service.encrypt(&tenant(), &json!({"a": 1})).await;
        let envelope = outcome.into_result().unwrap();
        assert_eq!(envelope.content, "96da4jqLYngT/Xmqbwk1xA==");

        let decoded = h.service.decrypt(&tenant(), &envelope.content, false).await;
        assert_eq!(
            decoded.to_json(),
            json!({"success": true, "decrypted_content": {"a": 1}})
        );

        // No gateway traffic: the key was already cached
        assert_eq!(h.mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_decrypted_status_keys_stay_nested() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));

        let payload = json!({"success": "Y", "error": "none", "n": 1});
        let envelope = h.service.try_encrypt(&tenant(), &payload).await.unwrap();
        let json = h.service.decrypt(&tenant(), &envelope.content, false).await.to_json();

        assert_eq!(json, json!({"success": true, "decrypted_content": payload}));
        assert!(json.get("error").is_none());
        assert!(json.get("n").is_none());
    }

    #[tokio::test]
    async fn test_decrypt_failure_outcome() {
        let h = harness();
        h.service.key_store().set(&tenant(), &h.key, Duration::from_secs(60));

        let json = h.service.decrypt(&tenant(), "!!!", false).await.to_json();
        assert_eq!(json["success"], false);
        assert!(json.get("decrypted_content").is_none());
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_key_outcome() {
        let h = harness();
        let outcome = h.service.refresh_key(&tenant()).await;
        let json = outcome.to_json();

        assert_eq!(json["success"], true);
        assert_eq!(json["key_bits"], 128);
        assert_eq!(json["cache_key"], "efris_cached_aes_key:1000023516:TCS9e0df01728335239");
        assert!(json["expires_in_secs"].as_u64().unwrap() > 86_000);
    }

    #[test]
    fn test_rejection_with_null_data_keeps_code() {
        let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
        let reply = json!({
            "data": {"content": null, "signature": null, "dataDescription": null},
            "globalInfo": null,
            "returnStateInfo": {"returnCode": "45", "returnMessage": "Partial failure"}
        });

        let err = read_reply(&InterfaceCode::InvoiceUpload, &reply, &key).unwrap_err();
        match err {
            ClientError::Rejected { interface, code, message } => {
                assert_eq!(interface, "T109");
                assert_eq!(code, "45");
                assert_eq!(message, "Partial failure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_data_on_success_is_null() {
        let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
        let reply = json!({
            "data": {"content": null, "signature": null},
            "returnStateInfo": {"returnCode": "00", "returnMessage": "SUCCESS"}
        });

        let reply = read_reply(&InterfaceCode::ServerTime, &reply, &key).unwrap();
        assert!(reply.data.is_null());
    }

    #[test]
    fn test_decode_data_per_description() {
        let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();

        let encrypted = DataPayload {
            content: "96da4jqLYngT/Xmqbwk1xA==".into(),
            signature: String::new(),
            data_description: DataDescription::encrypted(false),
        };
        assert_eq!(decode_data(&encrypted, &key).unwrap(), json!({"a": 1}));

        let plain = DataPayload {
            content: plain_content(&json!({"b": 2})),
            signature: String::new(),
            data_description: DataDescription::default(),
        };
        assert_eq!(decode_data(&plain, &key).unwrap(), json!({"b": 2}));

        let garbage = DataPayload {
            content: "!!!".into(),
            signature: String::new(),
            data_description: DataDescription::encrypted(false),
        };
        assert!(decode_data(&garbage, &key).is_err());
    }
}
