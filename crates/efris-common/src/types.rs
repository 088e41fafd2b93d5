// ============================================
// File: crates/efris-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the identifiers that travel in `globalInfo` and key the
//! session-key store, so a TIN can never be passed where a device number
//! is expected.
//!
//! ## Main Functionality
//! - `Tin`, `DeviceNo`: taxpayer and fiscal device identifiers
//! - `TenantId`: (tin, device) pair, the unit of key isolation
//! - `InterfaceCode`: gateway routing code (`T104`, `T109`, ...)
//! - `ExchangeId`: per-request `dataExchangeId`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Interface codes are opaque routing strings; unknown codes are kept
//!   verbatim in `InterfaceCode::Other`
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Tin / DeviceNo
// ============================================

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, trimming surrounding whitespace.
            ///
            /// # Errors
            /// Returns `InvalidInput` if the value is empty.
            pub fn new(value: impl AsRef<str>) -> crate::Result<Self> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(CommonError::invalid_input($field, "cannot be empty"));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CommonError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

identifier!(
    /// Taxpayer identification number.
    Tin,
    "tin"
);

identifier!(
    /// Fiscal device number registered with the gateway.
    DeviceNo,
    "device_no"
);

// ============================================
// TenantId
// ============================================

/// Identity a session key belongs to.
///
/// Keys issued by the gateway are bound to the device that performed the
/// handshake, so every cache slot is keyed by the full pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId {
    /// Taxpayer identification number.
    pub tin: Tin,
    /// Fiscal device number.
    pub device_no: DeviceNo,
}

impl TenantId {
    /// Creates a tenant identity.
    #[must_use]
    pub const fn new(tin: Tin, device_no: DeviceNo) -> Self {
        Self { tin, device_no }
    }

    /// Parses a tenant identity from raw strings.
    ///
    /// # Errors
    /// Returns `InvalidInput` if either part is empty.
    pub fn parse(tin: &str, device_no: &str) -> crate::Result<Self> {
        Ok(Self::new(Tin::new(tin)?, DeviceNo::new(device_no)?))
    }

    /// Cache key for this tenant under `prefix`.
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        format!("{prefix}:{}:{}", self.tin, self.device_no)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tin, self.device_no)
    }
}

// ============================================
// InterfaceCode
// ============================================

/// Gateway interface code carried in `globalInfo.interfaceCode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceCode {
    /// T101 - server time / connectivity check.
    ServerTime,
    /// T104 - symmetric key exchange.
    KeyExchange,
    /// T109 - invoice upload.
    InvoiceUpload,
    /// T115 - system dictionary.
    Dictionary,
    /// T119 - taxpayer lookup by TIN.
    TaxpayerLookup,
    /// T127 - goods and services inquiry.
    GoodsInquiry,
    /// T130 - goods registration.
    GoodsUpload,
    /// T131 - stock maintenance.
    StockMaintain,
    /// Any other code, passed through verbatim.
    Other(String),
}

impl InterfaceCode {
    /// Wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServerTime => "T101",
            Self::KeyExchange => "T104",
            Self::InvoiceUpload => "T109",
            Self::Dictionary => "T115",
            Self::TaxpayerLookup => "T119",
            Self::GoodsInquiry => "T127",
            Self::GoodsUpload => "T130",
            Self::StockMaintain => "T131",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for InterfaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceCode {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Ok(match code.as_str() {
            "" => return Err(CommonError::invalid_input("interface_code", "cannot be empty")),
            "T101" => Self::ServerTime,
            "T104" => Self::KeyExchange,
            "T109" => Self::InvoiceUpload,
            "T115" => Self::Dictionary,
            "T119" => Self::TaxpayerLookup,
            "T127" => Self::GoodsInquiry,
            "T130" => Self::GoodsUpload,
            "T131" => Self::StockMaintain,
            _ => Self::Other(code),
        })
    }
}

impl Serialize for InterfaceCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InterfaceCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// ExchangeId
// ============================================

/// `globalInfo.dataExchangeId`: unique per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Generates a fresh 32-character hex exchange id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Wraps a caller-provided id.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_trims_and_rejects_empty() {
        assert_eq!(Tin::new(" 1000023516 ").unwrap().as_str(), "1000023516");
        assert!(Tin::new("   ").is_err());
        assert!(DeviceNo::new("").is_err());
    }

    #[test]
    fn test_tenant_cache_key() {
        let tenant = TenantId::parse("1000023516", "TCS9e0df01728335239").unwrap();
        assert_eq!(
            tenant.cache_key("efris_cached_aes_key"),
            "efris_cached_aes_key:1000023516:TCS9e0df01728335239"
        );
        assert_eq!(tenant.to_string(), "1000023516/TCS9e0df01728335239");
    }

    #[test]
    fn test_interface_code_parse() {
        assert_eq!("T104".parse::<InterfaceCode>().unwrap(), InterfaceCode::KeyExchange);
        assert_eq!("t109".parse::<InterfaceCode>().unwrap(), InterfaceCode::InvoiceUpload);
        assert_eq!(
            "T144".parse::<InterfaceCode>().unwrap(),
            InterfaceCode::Other("T144".into())
        );
        assert!("".parse::<InterfaceCode>().is_err());
    }

    #[test]
    fn test_interface_code_serde() {
        let json = serde_json::to_string(&InterfaceCode::StockMaintain).unwrap();
        assert_eq!(json, "\"T131\"");
        let back: InterfaceCode = serde_json::from_str("\"T115\"").unwrap();
        assert_eq!(back, InterfaceCode::Dictionary);
    }

    #[test]
    fn test_exchange_id_unique() {
        let a = ExchangeId::generate();
        let b = ExchangeId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
