use crate::domain::model::{AddressRecord, CorrectionAudit, DashboardSummary, WrongPincodeRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Appends `data` to the end of `path`, creating it when missing. Existing
    /// content is never rewritten.
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 處理參數的提供者 (CLI / TOML 共用)
pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
}

/// Persistence collaborator. The routing core only writes through it; the
/// logs are read back only for operator listings and the dashboard.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn record_address(&self, record: AddressRecord) -> Result<()>;

    /// Stamps the audit tuple and appends it to the wrong-pincode log.
    async fn record_wrong_pincode(&self, audit: CorrectionAudit) -> Result<WrongPincodeRecord>;

    /// Newest first.
    async fn list_wrong_pincodes(&self) -> Result<Vec<WrongPincodeRecord>>;

    /// Newest first.
    async fn list_addresses(&self) -> Result<Vec<AddressRecord>>;

    /// 儀表板統計：總數、語音來源數、各配送中心筆數、最近的地址
    async fn dashboard(&self) -> Result<DashboardSummary> {
        let addresses = self.list_addresses().await?;
        let wrong_pincodes = self.list_wrong_pincodes().await?;
        Ok(DashboardSummary::from_records(&addresses, wrong_pincodes.len()))
    }
}
