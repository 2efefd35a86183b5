use crate::domain::model::{AddressRecord, CorrectionAudit, WrongPincodeRecord};
use crate::domain::ports::AddressStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 記憶體內的持久化實作，測試與單次 CLI 執行使用
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    addresses: Arc<Mutex<Vec<AddressRecord>>>,
    wrong_pincodes: Arc<Mutex<Vec<WrongPincodeRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest first, in insertion order.
    pub async fn addresses(&self) -> Vec<AddressRecord> {
        self.addresses.lock().await.clone()
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn record_address(&self, record: AddressRecord) -> Result<()> {
        self.addresses.lock().await.push(record);
        Ok(())
    }

    async fn record_wrong_pincode(&self, audit: CorrectionAudit) -> Result<WrongPincodeRecord> {
        let record = WrongPincodeRecord::from_audit(audit, chrono::Utc::now());
        self.wrong_pincodes.lock().await.push(record.clone());
        Ok(record)
    }

    async fn list_wrong_pincodes(&self) -> Result<Vec<WrongPincodeRecord>> {
        let records = self.wrong_pincodes.lock().await;
        Ok(records.iter().rev().cloned().collect())
    }

    async fn list_addresses(&self) -> Result<Vec<AddressRecord>> {
        let records = self.addresses.lock().await;
        Ok(records.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InputSource, PostalCode};

    fn audit(original: &str, corrected: &str) -> CorrectionAudit {
        CorrectionAudit {
            original: original.to_string(),
            corrected: PostalCode::parse(corrected).unwrap(),
            source_text: String::new(),
            confidence: 5.0 / 6.0,
        }
    }

    #[tokio::test]
    async fn test_wrong_pincodes_newest_first() {
        let store = InMemoryStore::new();
        store.record_wrong_pincode(audit("411009", "411001")).await.unwrap();
        store.record_wrong_pincode(audit("560009", "560001")).await.unwrap();

        let listed = store.list_wrong_pincodes().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].original, "560009");
        assert_eq!(listed[1].original, "411009");
    }

    #[tokio::test]
    async fn test_dashboard_summarises_store() {
        use crate::domain::model::{ParsedAddress, Resolution};

        let store = InMemoryStore::new();
        for (source, hub) in [
            (InputSource::Voice, "Nashik Main Post Office"),
            (InputSource::Ocr, "Nashik Main Post Office"),
            (InputSource::Text, "Latur City Post Office"),
        ] {
            store
                .record_address(AddressRecord {
                    source_text: hub.to_string(),
                    source,
                    parsed: ParsedAddress::default(),
                    geocoded: None,
                    resolution: Resolution::Resolved {
                        hub: hub.to_string(),
                    },
                    nodal_delivery_center: hub.to_string(),
                    created_at: chrono::Utc::now(),
                })
                .await
                .unwrap();
        }
        store.record_wrong_pincode(audit("422009", "422001")).await.unwrap();

        let summary = store.dashboard().await.unwrap();
        assert_eq!(summary.total_addresses, 3);
        assert_eq!(summary.total_wrong_pincodes, 1);
        assert_eq!(summary.total_voice_addresses, 1);
        assert_eq!(summary.nodal_centers[0].nodal_delivery_center, "Nashik Main Post Office");
        assert_eq!(summary.nodal_centers[0].count, 2);
        assert_eq!(summary.recent_addresses[0].source, InputSource::Text);
    }

    #[tokio::test]
    async fn test_recorded_entry_is_stamped() {
        let store = InMemoryStore::new();
        let before = chrono::Utc::now();
        let record = store.record_wrong_pincode(audit("411009", "411001")).await.unwrap();
        assert!(record.timestamp >= before);
        assert_eq!(record.corrected.as_str(), "411001");
    }
}
