use crate::domain::model::{AddressRecord, CorrectionAudit, WrongPincodeRecord};
use crate::domain::ports::{AddressStore, Storage};
use crate::utils::error::{Result, RouterError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const ADDRESSES_FILE: &str = "addresses.jsonl";
pub const WRONG_PINCODES_FILE: &str = "wrong_pincodes.jsonl";

/// Append-only JSON-lines store on top of a [`Storage`] backend.
///
/// Each record is written as one complete line through
/// [`Storage::append_file`], so several stores (or processes) sharing the
/// same directory only ever add lines and never rewrite existing ones.
pub struct FileStore<S: Storage> {
    storage: S,
}

impl<S: Storage> FileStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Oldest first, in file order.
    pub async fn addresses(&self) -> Result<Vec<AddressRecord>> {
        self.read_lines(ADDRESSES_FILE).await
    }

    async fn append<T: Serialize + Sync>(&self, file: &str, entry: &T) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.storage.append_file(file, &line).await
    }

    async fn read_lines<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let data = self.read_or_empty(file).await?;
        let text = String::from_utf8(data).map_err(|e| {
            RouterError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not valid UTF-8: {}", file, e),
            ))
        })?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(RouterError::from))
            .collect()
    }

    async fn read_or_empty(&self, file: &str) -> Result<Vec<u8>> {
        match self.storage.read_file(file).await {
            Ok(data) => Ok(data),
            Err(RouterError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: Storage> AddressStore for FileStore<S> {
    async fn record_address(&self, record: AddressRecord) -> Result<()> {
        self.append(ADDRESSES_FILE, &record).await?;
        tracing::debug!("Recorded address for {}", record.nodal_delivery_center);
        Ok(())
    }

    async fn record_wrong_pincode(&self, audit: CorrectionAudit) -> Result<WrongPincodeRecord> {
        let record = WrongPincodeRecord::from_audit(audit, chrono::Utc::now());
        self.append(WRONG_PINCODES_FILE, &record).await?;
        tracing::debug!(
            "Recorded wrong pincode {} → {}",
            record.original,
            record.corrected
        );
        Ok(record)
    }

    async fn list_wrong_pincodes(&self) -> Result<Vec<WrongPincodeRecord>> {
        let mut records: Vec<WrongPincodeRecord> = self.read_lines(WRONG_PINCODES_FILE).await?;
        records.reverse();
        Ok(records)
    }

    async fn list_addresses(&self) -> Result<Vec<AddressRecord>> {
        let mut records = self.addresses().await?;
        records.reverse();
        Ok(records)
    }
}
