// ============================================
// File: crates/efris-core/src/protocol/messages.rs
// ============================================
//! # Gateway Message Definitions
//!
//! ## Creation Reason
//! Defines the JSON wrapper exchanged with the EFRIS gateway. Every
//! interface (T101 ... T131) uses the same outer shape; only
//! `globalInfo.interfaceCode` and the envelope inside `data` differ.
//!
//! ## Main Functionality
//! - `GatewayRequest` / `GatewayResponse`: the outer wrapper
//! - `DataPayload`, `DataDescription`: envelope plus framing flags
//! - `GlobalInfo`, `ExtendField`: routing and device identity
//! - `ReturnStateInfo`: gateway status
//! - `DeviceProfile`: static identity values stamped into `globalInfo`
//! - `KeyExchangeContent`: decoded T104 `data.content`
//!
//! ## Wire Format (camelCase JSON)
//! ```text
//! {
//!   "data": {"content", "signature", "dataDescription": {codeType, encryptCode, zipCode}},
//!   "globalInfo": {appId, version, dataExchangeId, interfaceCode, requestCode,
//!                  requestTime, responseCode, userName, deviceMAC, deviceNo, tin,
//!                  brn, taxpayerID, longitude, latitude, agentType, extendField},
//!   "returnStateInfo": {returnCode, returnMessage}
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `deviceMAC` and `taxpayerID` do not follow camelCase; they are renamed
//!   explicitly
//! - `passowrdDes` is misspelled by the gateway. Do NOT fix the spelling
//! - Response fields are all optional on the wire; missing or `null` ones
//!   default to empty strings, so a rejection's code and message survive a
//!   reply whose `data` is all nulls
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions
//! v0.1.1 - Tolerate `null` in inbound fields

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use efris_common::time::{request_time, RESPONSE_DATE_FORMAT, RESPONSE_TIME_FORMAT};
use efris_common::{ExchangeId, InterfaceCode, TenantId};

use crate::crypto::Envelope;

// ============================================
// Constants
// ============================================

/// `returnCode` the gateway uses for success.
pub const SUCCESS_RETURN_CODE: &str = "00";

/// Flag value meaning "yes" in `dataDescription`.
const FLAG_ON: &str = "1";

/// Flag value meaning "no" in `dataDescription`.
const FLAG_OFF: &str = "0";

/// Reads `null` as the type's default. Missing keys are covered by
/// `#[serde(default)]`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================
// DataDescription
// ============================================

/// Framing flags for `data.content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDescription {
    /// `"0"` plain text content, `"1"` other.
    #[serde(deserialize_with = "null_as_default")]
    pub code_type: String,
    /// `"1"` when content is AES-encrypted.
    #[serde(deserialize_with = "null_as_default")]
    pub encrypt_code: String,
    /// `"1"` when content is gzip-compressed.
    #[serde(deserialize_with = "null_as_default")]
    pub zip_code: String,
}

impl DataDescription {
    /// Flags for an encrypted, optionally compressed body.
    #[must_use]
    pub fn encrypted(compressed: bool) -> Self {
        Self {
            code_type: FLAG_OFF.into(),
            encrypt_code: FLAG_ON.into(),
            zip_code: if compressed { FLAG_ON } else { FLAG_OFF }.into(),
        }
    }

    /// Returns `true` if content is AES-encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.encrypt_code == FLAG_ON
    }

    /// Returns `true` if content is gzip-compressed.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.zip_code == FLAG_ON
    }
}

// ============================================
// DataPayload
// ============================================

/// The `data` section of a request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataPayload {
    /// Base64 content (encrypted or plain per `data_description`).
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    /// Base64 signature over `content`.
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
    /// Framing flags.
    #[serde(deserialize_with = "null_as_default")]
    pub data_description: DataDescription,
}

impl DataPayload {
    /// Empty body used by the key exchange.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            content: String::new(),
            signature: String::new(),
            data_description: DataDescription::encrypted(false),
        }
    }

    /// Body carrying an encoded envelope.
    #[must_use]
    pub fn from_envelope(envelope: Envelope, compressed: bool) -> Self {
        Self {
            content: envelope.content,
            signature: envelope.signature,
            data_description: DataDescription::encrypted(compressed),
        }
    }

    /// Returns `true` if there is no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ============================================
// DeviceProfile
// ============================================

/// Static device and client identity stamped into every `globalInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Client application id.
    pub app_id: String,
    /// Interface version.
    pub version: String,
    /// MAC-like device identifier registered with the gateway.
    pub device_mac: String,
    /// Operator user name.
    pub user_name: String,
    /// Taxpayer id slot.
    pub taxpayer_id: String,
    /// Device longitude.
    pub longitude: String,
    /// Device latitude.
    pub latitude: String,
    /// Agent type flag.
    pub agent_type: String,
    /// Business registration number.
    pub brn: String,
    /// Operator name in `extendField`.
    pub operator_name: String,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            app_id: "AP04".into(),
            version: "1.1.20191201".into(),
            device_mac: "B47720524158".into(),
            user_name: "admin".into(),
            taxpayer_id: "1".into(),
            longitude: "32.61665".into(),
            latitude: "0.36601".into(),
            agent_type: "0".into(),
            brn: String::new(),
            operator_name: "administrator".into(),
        }
    }
}

// ============================================
// GlobalInfo
// ============================================

/// Free-form `globalInfo.extendField`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtendField {
    /// Date format requested for responses.
    pub response_date_format: String,
    /// Timestamp format requested for responses.
    pub response_time_format: String,
    /// Caller reference.
    pub reference_no: String,
    /// Operator name.
    pub operator_name: String,
}

impl Default for ExtendField {
    fn default() -> Self {
        Self {
            response_date_format: RESPONSE_DATE_FORMAT.into(),
            response_time_format: RESPONSE_TIME_FORMAT.into(),
            reference_no: String::new(),
            operator_name: String::new(),
        }
    }
}

/// Routing and identity header of every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalInfo {
    /// Client application id.
    pub app_id: String,
    /// Interface version.
    pub version: String,
    /// Unique per request.
    pub data_exchange_id: ExchangeId,
    /// Routing code.
    pub interface_code: InterfaceCode,
    /// Requesting party code.
    pub request_code: String,
    /// `%Y-%m-%d %H:%M:%S` in EAT.
    pub request_time: String,
    /// Responding party code.
    pub response_code: String,
    /// Operator user name.
    pub user_name: String,
    /// MAC-like device identifier.
    #[serde(rename = "deviceMAC")]
    pub device_mac: String,
    /// Fiscal device number.
    pub device_no: String,
    /// Taxpayer identification number.
    pub tin: String,
    /// Business registration number.
    pub brn: String,
    /// Taxpayer id slot.
    #[serde(rename = "taxpayerID")]
    pub taxpayer_id: String,
    /// Device longitude.
    pub longitude: String,
    /// Device latitude.
    pub latitude: String,
    /// Agent type flag.
    pub agent_type: String,
    /// Extension block.
    pub extend_field: ExtendField,
}

impl GlobalInfo {
    /// Builds a header for `tenant` calling `interface`, with a fresh
    /// exchange id and the current EAT request time.
    #[must_use]
    pub fn new(profile: &DeviceProfile, tenant: &TenantId, interface: InterfaceCode) -> Self {
        let data_exchange_id = ExchangeId::generate();
        Self {
            app_id: profile.app_id.clone(),
            version: profile.version.clone(),
            interface_code: interface,
            request_code: "TP".into(),
            request_time: request_time(),
            response_code: "TA".into(),
            user_name: profile.user_name.clone(),
            device_mac: profile.device_mac.clone(),
            device_no: tenant.device_no.to_string(),
            tin: tenant.tin.to_string(),
            brn: profile.brn.clone(),
            taxpayer_id: profile.taxpayer_id.clone(),
            longitude: profile.longitude.clone(),
            latitude: profile.latitude.clone(),
            agent_type: profile.agent_type.clone(),
            extend_field: ExtendField {
                reference_no: data_exchange_id.as_str().chars().take(14).collect(),
                operator_name: profile.operator_name.clone(),
                ..ExtendField::default()
            },
            data_exchange_id,
        }
    }
}

// ============================================
// ReturnStateInfo
// ============================================

/// Gateway status block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnStateInfo {
    /// `"00"` (or empty) on success.
    #[serde(deserialize_with = "null_as_default")]
    pub return_code: String,
    /// Human readable status.
    #[serde(deserialize_with = "null_as_default")]
    pub return_message: String,
}

impl ReturnStateInfo {
    /// Returns `true` when the code is `"00"` or absent.
    #[must_use]
    pub fn is_success(&self) -> bool {
        let code = self.return_code.trim();
        code.is_empty() || code == SUCCESS_RETURN_CODE
    }
}

// ============================================
// GatewayRequest / GatewayResponse
// ============================================

/// Outbound wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    /// Envelope and framing.
    pub data: DataPayload,
    /// Routing header.
    pub global_info: GlobalInfo,
    /// Always empty on requests.
    pub return_state_info: ReturnStateInfo,
}

impl GatewayRequest {
    /// The fixed-shape T104 key-exchange request.
    #[must_use]
    pub fn key_exchange(profile: &DeviceProfile, tenant: &TenantId) -> Self {
        Self {
            data: DataPayload::empty(),
            global_info: GlobalInfo::new(profile, tenant, InterfaceCode::KeyExchange),
            return_state_info: ReturnStateInfo::default(),
        }
    }

    /// A request carrying an encoded envelope.
    #[must_use]
    pub fn with_envelope(
        profile: &DeviceProfile,
        tenant: &TenantId,
        interface: InterfaceCode,
        envelope: Envelope,
    ) -> Self {
        Self {
            data: DataPayload::from_envelope(envelope, false),
            global_info: GlobalInfo::new(profile, tenant, interface),
            return_state_info: ReturnStateInfo::default(),
        }
    }
}

/// Inbound wrapper. Every section is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayResponse {
    /// Envelope and framing.
    #[serde(deserialize_with = "null_as_default")]
    pub data: DataPayload,
    /// Echoed header, kept untyped.
    pub global_info: Option<Value>,
    /// Gateway status.
    #[serde(deserialize_with = "null_as_default")]
    pub return_state_info: ReturnStateInfo,
}

// ============================================
// KeyExchangeContent
// ============================================

/// Decoded T104 `data.content`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyExchangeContent {
    /// RSA-wrapped session key, base64.
    #[serde(rename = "passowrdDes")]
    pub password_des: Option<String>,
    /// Gateway signature, not checked.
    #[serde(default)]
    pub sign: Option<String>,
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant() -> TenantId {
        TenantId::parse("1000023516", "TCS9e0df01728335239").unwrap()
    }

    #[test]
    fn test_key_exchange_request_shape() {
        let request = GatewayRequest::key_exchange(&DeviceProfile::default(), &tenant());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["data"]["content"], "");
        assert_eq!(value["data"]["signature"], "");
        assert_eq!(
            value["data"]["dataDescription"],
            json!({"codeType": "0", "encryptCode": "1", "zipCode": "0"})
        );

        let global = &value["globalInfo"];
        assert_eq!(global["interfaceCode"], "T104");
        assert_eq!(global["deviceNo"], "TCS9e0df01728335239");
        assert_eq!(global["tin"], "1000023516");
        assert_eq!(global["deviceMAC"], "B47720524158");
        assert_eq!(global["taxpayerID"], "1");
        assert_eq!(global["appId"], "AP04");
        assert_eq!(global["requestCode"], "TP");
        assert_eq!(global["responseCode"], "TA");
        assert_eq!(global["extendField"]["responseDateFormat"], "dd/MM/yyyy");
        assert_eq!(global["dataExchangeId"].as_str().unwrap().len(), 32);

        assert_eq!(
            value["returnStateInfo"],
            json!({"returnCode": "", "returnMessage": ""})
        );
    }

    #[test]
    fn test_exchange_ids_differ() {
        let a = GlobalInfo::new(&DeviceProfile::default(), &tenant(), InterfaceCode::ServerTime);
        let b = GlobalInfo::new(&DeviceProfile::default(), &tenant(), InterfaceCode::ServerTime);
        assert_ne!(a.data_exchange_id, b.data_exchange_id);
    }

    #[test]
    fn test_response_with_missing_sections() {
        let response: GatewayResponse =
            serde_json::from_value(json!({"returnStateInfo": {"returnCode": "00"}})).unwrap();
        assert!(response.return_state_info.is_success());
        assert!(response.data.is_empty());

        let response: GatewayResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.return_state_info.is_success());
    }

    #[test]
    fn test_response_with_null_fields() {
        let response: GatewayResponse = serde_json::from_value(json!({
            "data": {"content": null, "signature": null, "dataDescription": null},
            "globalInfo": null,
            "returnStateInfo": {"returnCode": "45", "returnMessage": "Partial failure"}
        }))
        .unwrap();

        assert!(response.data.is_empty());
        assert_eq!(response.data.signature, "");
        assert!(!response.data.data_description.is_encrypted());
        assert_eq!(response.return_state_info.return_code, "45");
        assert_eq!(response.return_state_info.return_message, "Partial failure");
        assert!(!response.return_state_info.is_success());

        let response: GatewayResponse = serde_json::from_value(json!({
            "data": null,
            "returnStateInfo": {"returnCode": null, "returnMessage": null}
        }))
        .unwrap();
        assert!(response.data.is_empty());
        assert!(response.return_state_info.is_success());
    }

    #[test]
    fn test_return_codes() {
        let failed = ReturnStateInfo {
            return_code: "2124".into(),
            return_message: "Device not registered".into(),
        };
        assert!(!failed.is_success());
    }

    #[test]
    fn test_data_description_flags() {
        let response: GatewayResponse = serde_json::from_value(json!({
            "data": {
                "content": "abc",
                "dataDescription": {"codeType": "1", "encryptCode": "1", "zipCode": "1"}
            }
        }))
        .unwrap();
        assert!(response.data.data_description.is_encrypted());
        assert!(response.data.data_description.is_compressed());
    }

    #[test]
    fn test_key_exchange_content_typo_field() {
        let content: KeyExchangeContent =
            serde_json::from_value(json!({"passowrdDes": "AAAA", "sign": "x"})).unwrap();
        assert_eq!(content.password_des.as_deref(), Some("AAAA"));

        let content: KeyExchangeContent =
            serde_json::from_value(json!({"passwordDes": "AAAA"})).unwrap();
        assert!(content.password_des.is_none());
    }
}
