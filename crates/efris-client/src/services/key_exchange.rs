// ============================================
// File: crates/efris-client/src/services/key_exchange.rs
// ============================================
//! # Key Exchange Service
//!
//! ## Creation Reason
//! Obtains a fresh session key from the gateway through the T104 handshake
//! and unwraps it with the device's private key.
//!
//! ## Handshake Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    KeyExchangeClient                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  1. Load private key (CredentialStore, re-read every time)   │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  2. POST fixed-shape T104 request (handshake timeout)        │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  3. Check returnStateInfo ("00" or empty)                    │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  4. data.content ─► base64 ─► JSON ─► passowrdDes            │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  5. Unwrap with the configured padding schemes, in order     │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  6. Record audit entry, return SessionKey                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//! - Non-200 status or non-"00" return code: `Handshake` with code/message
//! - Missing content or `passowrdDes`: `Handshake`
//! - Timeout: `Transport(Timeout)`, retryable by the caller
//! - Credential and unwrap failures: fatal `Core` errors
//!
//! ## ⚠️ Important Note for Next Developer
//! - `passowrdDes` is the gateway's spelling; do not fix it
//! - The protocol does not say which RSA padding wraps the key. The scheme
//!   that worked is logged so a gateway-side change is visible
//! - The wrapped key is redacted from audit records
//!
//! ## Last Modified
//! v0.1.0 - Initial key exchange service

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use efris_common::{CommonError, DeviceNo, InterfaceCode, TenantId, Tin};
use efris_core::crypto::envelope;
use efris_core::protocol::{GatewayResponse, KeyExchangeContent};
use efris_core::{
    unwrap_session_key, CredentialStore, DeviceProfile, GatewayRequest, PaddingScheme,
    PrivateCredential, SessionKey,
};
use efris_transport::{GatewayTransport, TransportError};

use crate::audit::{redact_content, AuditRecord, AuditSink, TracingAuditSink};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

// ============================================
// SessionKeySource
// ============================================

/// Anything that can produce a fresh session key for a tenant.
#[async_trait]
pub trait SessionKeySource: Send + Sync {
    /// Fetches a new key. Each call is one handshake.
    async fn fetch_session_key(&self, tenant: &TenantId) -> Result<SessionKey>;
}

// ============================================
// KeyExchangeClient
// ============================================

/// Performs the T104 key exchange.
pub struct KeyExchangeClient {
    transport: Arc<dyn GatewayTransport>,
    credentials: CredentialStore,
    profile: DeviceProfile,
    server_url: String,
    timeout: Duration,
    schemes: Vec<PaddingScheme>,
    audit: Arc<dyn AuditSink>,
}

impl KeyExchangeClient {
    /// Default handshake timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        credentials: CredentialStore,
        profile: DeviceProfile,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            profile,
            server_url: server_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            schemes: PaddingScheme::DEFAULT_ORDER.to_vec(),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Builds a client from configuration.
    pub fn from_config(config: &ClientConfig, transport: Arc<dyn GatewayTransport>) -> Self {
        Self::new(
            transport,
            config.credential_store(),
            config.device_profile(),
            &config.gateway.server_url,
        )
        .with_timeout(config.handshake_timeout())
        .with_schemes(config.key_cache.unwrap_schemes.clone())
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the order in which padding schemes are tried.
    #[must_use]
    pub fn with_schemes(mut self, schemes: Vec<PaddingScheme>) -> Self {
        self.schemes = schemes;
        self
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Performs one handshake for the device `device_no` of taxpayer `tin`.
    ///
    /// # Errors
    /// See the module documentation.
    pub async fn refresh_session_key(&self, device_no: &DeviceNo, tin: &Tin) -> Result<SessionKey> {
        let tenant = TenantId::new(tin.clone(), device_no.clone());
        self.exchange(&tenant).await
    }

    async fn exchange(&self, tenant: &TenantId) -> Result<SessionKey> {
        let credential = self.credentials.load()?;

        let request = GatewayRequest::key_exchange(&self.profile, tenant);
        let body = serde_json::to_value(&request)
            .map_err(|e| CommonError::encoding("T104 request", e.to_string()))?;

        debug!(
            tenant = %tenant,
            exchange_id = %request.global_info.data_exchange_id,
            url = %self.server_url,
            "Sending key exchange request"
        );

        let started = Instant::now();
        let reply = self
            .transport
            .post_json(&self.server_url, &body, self.timeout)
            .await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                let err = handshake_transport_error(e);
                self.audit.record(AuditRecord::failed(
                    InterfaceCode::KeyExchange,
                    tenant,
                    &self.server_url,
                    body,
                    None,
                    err.to_string(),
                    started.elapsed(),
                ));
                warn!(tenant = %tenant, error = %err, "Key exchange request failed");
                return Err(err);
            }
        };

        let result = self.session_key_from_reply(&reply, &credential);
        let elapsed = started.elapsed();
        let recorded_reply = redact_content(reply);

        match &result {
            Ok((key, scheme)) => {
                info!(
                    tenant = %tenant,
                    key_bits = key.bits(),
                    scheme = %scheme,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Session key refreshed"
                );
                self.audit.record(AuditRecord::completed(
                    InterfaceCode::KeyExchange,
                    tenant,
                    &self.server_url,
                    body,
                    recorded_reply,
                    elapsed,
                ));
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Key exchange rejected");
                self.audit.record(AuditRecord::failed(
                    InterfaceCode::KeyExchange,
                    tenant,
                    &self.server_url,
                    body,
                    Some(recorded_reply),
                    e.to_string(),
                    elapsed,
                ));
            }
        }

        result.map(|(key, _)| key)
    }

    fn session_key_from_reply(
        &self,
        reply: &Value,
        credential: &PrivateCredential,
    ) -> Result<(SessionKey, PaddingScheme)> {
        let response: GatewayResponse = serde_json::from_value(reply.clone())
            .map_err(|e| ClientError::handshake("", format!("malformed response: {e}")))?;

        let state = &response.return_state_info;
        if !state.is_success() {
            return Err(ClientError::handshake(
                state.return_code.trim(),
                &state.return_message,
            ));
        }

        if response.data.is_empty() {
            return Err(ClientError::handshake(
                state.return_code.trim(),
                "response carries no data.content",
            ));
        }

        let content = envelope::decode_plain(
            &response.data.content,
            response.data.data_description.is_compressed(),
        )?;
        let content: KeyExchangeContent = serde_json::from_value(content).map_err(|e| {
            ClientError::handshake(state.return_code.trim(), format!("unexpected content: {e}"))
        })?;

        let wrapped = content
            .password_des
            .filter(|w| !w.trim().is_empty())
            .ok_or_else(|| {
                ClientError::handshake(state.return_code.trim(), "content has no passowrdDes")
            })?;

        Ok(unwrap_session_key(&wrapped, credential, &self.schemes)?)
    }
}

/// Non-200 statuses are gateway refusals; everything else stays a
/// transport error.
fn handshake_transport_error(err: TransportError) -> ClientError {
    match err {
        TransportError::HttpStatus { status, body } => {
            ClientError::handshake(status.to_string(), body)
        }
        other => other.into(),
    }
}

#[async_trait]
impl SessionKeySource for KeyExchangeClient {
    async fn fetch_session_key(&self, tenant: &TenantId) -> Result<SessionKey> {
        self.exchange(tenant).await
    }
}

// ============================================
// Tests
// ============================================
