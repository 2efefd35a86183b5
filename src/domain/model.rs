use crate::utils::error::RouterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 6 位數字的郵遞區號 (pincode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    pub const LEN: usize = 6;

    /// `isdigit() && len == 6`
    pub fn is_well_formed(code: &str) -> bool {
        code.len() == Self::LEN && code.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::is_well_formed(code).then(|| Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PostalCode {
    type Error = RouterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(RouterError::invalid_input(format!(
                "'{}' is not a 6-digit pincode",
                value
            )))
        }
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

impl AsRef<str> for PostalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 區域配送中心 (nodal center) 與其負責的郵遞區號
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub name: String,
    pub postal_codes: Vec<PostalCode>,
}

impl Hub {
    pub fn new(name: impl Into<String>, postal_codes: impl IntoIterator<Item = PostalCode>) -> Self {
        Self {
            name: name.into(),
            postal_codes: postal_codes.into_iter().collect(),
        }
    }
}

/// Segmenter 產出的結構化地址，缺少的欄位為 `None` 而不是空字串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<PostalCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub suggested_code: Option<PostalCode>,
    pub confidence: f64,
}

impl CorrectionResult {
    pub fn none() -> Self {
        Self {
            suggested_code: None,
            confidence: 0.0,
        }
    }
}

/// Externally verified address fields from a geocoding collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeHint {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Ocr,
    Text,
    Voice,
}

impl std::str::FromStr for InputSource {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ocr" | "image" => Ok(Self::Ocr),
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            other => Err(RouterError::invalid_input(format!(
                "unknown input source '{}' (expected ocr, text or voice)",
                other
            ))),
        }
    }
}

/// 管線的終止狀態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved {
        hub: String,
    },
    ResolvedViaSuggestion {
        hub: String,
        original: String,
        suggestion: PostalCode,
        confidence: f64,
    },
    UnresolvedNoPincode,
    UnresolvedNoMatch {
        original: String,
    },
}

impl Resolution {
    pub fn hub(&self) -> Option<&str> {
        match self {
            Self::Resolved { hub } | Self::ResolvedViaSuggestion { hub, .. } => Some(hub),
            Self::UnresolvedNoPincode | Self::UnresolvedNoMatch { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.hub().is_some()
    }
}

/// A correction the pipeline applied, waiting to be written to the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAudit {
    pub original: String,
    pub corrected: PostalCode,
    pub source_text: String,
    pub confidence: f64,
}

/// Append-only audit entry, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongPincodeRecord {
    pub original: String,
    pub corrected: PostalCode,
    pub source_text: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl WrongPincodeRecord {
    pub fn from_audit(audit: CorrectionAudit, timestamp: DateTime<Utc>) -> Self {
        Self {
            original: audit.original,
            corrected: audit.corrected,
            source_text: audit.source_text,
            confidence: audit.confidence,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub parsed: ParsedAddress,
    pub geocoded: Option<GeocodeHint>,
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<CorrectionAudit>,
}

/// 持久化的地址紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub source_text: String,
    pub source: InputSource,
    pub parsed: ParsedAddress,
    pub geocoded: Option<GeocodeHint>,
    pub resolution: Resolution,
    pub nodal_delivery_center: String,
    pub created_at: DateTime<Utc>,
}

/// Response shape of the pincode-check flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PincodeCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<PostalCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
    pub message: String,
}

/// Number of newest addresses shown on the dashboard.
pub const RECENT_ADDRESS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubCount {
    pub nodal_delivery_center: String,
    pub count: usize,
}

/// 儀表板彙總資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_addresses: usize,
    pub total_wrong_pincodes: usize,
    pub total_voice_addresses: usize,
    /// Busiest center first; ties by name.
    pub nodal_centers: Vec<HubCount>,
    pub recent_addresses: Vec<AddressRecord>,
}

impl DashboardSummary {
    /// `addresses` must be ordered newest first.
    pub fn from_records(addresses: &[AddressRecord], total_wrong_pincodes: usize) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in addresses {
            *counts
                .entry(record.nodal_delivery_center.as_str())
                .or_default() += 1;
        }

        let mut nodal_centers: Vec<HubCount> = counts
            .into_iter()
            .map(|(name, count)| HubCount {
                nodal_delivery_center: name.to_string(),
                count,
            })
            .collect();
        nodal_centers.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_addresses: addresses.len(),
            total_wrong_pincodes,
            total_voice_addresses: addresses
                .iter()
                .filter(|record| record.source == InputSource::Voice)
                .count(),
            nodal_centers,
            recent_addresses: addresses.iter().take(RECENT_ADDRESS_LIMIT).cloned().collect(),
        }
    }
}
