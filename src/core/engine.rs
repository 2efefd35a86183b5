use crate::core::pipeline::AddressPipeline;
use crate::core::resolver::NOT_FOUND_LABEL;
use crate::domain::model::{
    AddressRecord, DashboardSummary, GeocodeHint, InputSource, PincodeCheck, PipelineOutcome,
    WrongPincodeRecord,
};
use crate::domain::ports::AddressStore;
use crate::utils::error::{Result, RouterError};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs the pure pipeline and hands its results to the persistence
/// collaborator. Store failures are logged and never change the outcome.
pub struct RoutingEngine<S: AddressStore> {
    pipeline: Arc<AddressPipeline>,
    store: Arc<S>,
    concurrent_requests: usize,
}

impl<S: AddressStore + 'static> RoutingEngine<S> {
    pub fn new(pipeline: AddressPipeline, store: S) -> Self {
        Self::with_shared(Arc::new(pipeline), Arc::new(store))
    }

    pub fn with_shared(pipeline: Arc<AddressPipeline>, store: Arc<S>) -> Self {
        Self {
            pipeline,
            store,
            concurrent_requests: 5,
        }
    }

    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn process(
        &self,
        source: InputSource,
        raw_text: &str,
        hint: Option<GeocodeHint>,
    ) -> Result<PipelineOutcome> {
        process_one(&self.pipeline, self.store.as_ref(), source, raw_text, hint).await
    }

    /// 併發處理多筆地址，結果依輸入順序回傳
    pub async fn process_batch(
        &self,
        source: InputSource,
        texts: Vec<String>,
    ) -> Vec<Result<PipelineOutcome>> {
        tracing::info!(
            "📦 Processing batch of {} addresses ({} concurrent)",
            texts.len(),
            self.concurrent_requests
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrent_requests));
        let handles: Vec<_> = texts
            .into_iter()
            .map(|text| {
                let pipeline = Arc::clone(&self.pipeline);
                let store = Arc::clone(&self.store);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| RouterError::dependency(format!("worker pool closed: {}", e)))?;
                    process_one(&pipeline, store.as_ref(), source, &text, None).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| {
                Err(RouterError::dependency(format!("address worker failed: {}", e)))
            }));
        }

        let resolved = results
            .iter()
            .filter(|r| matches!(r, Ok(outcome) if outcome.resolution.is_resolved()))
            .count();
        tracing::info!("✅ Batch done: {}/{} resolved", resolved, results.len());
        results
    }

    pub async fn check_pincode(&self, pincode: &str, address_text: Option<&str>) -> Result<PincodeCheck> {
        let (check, audit) = self.pipeline.check_pincode(pincode, address_text)?;
        if let Some(audit) = audit {
            if let Err(e) = self.store.record_wrong_pincode(audit).await {
                tracing::warn!("⚠️ Failed to record wrong pincode '{}': {}", pincode, e);
            }
        }
        Ok(check)
    }

    pub async fn wrong_pincodes(&self) -> Result<Vec<WrongPincodeRecord>> {
        self.store.list_wrong_pincodes().await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        self.store.dashboard().await
    }
}

async fn process_one<S: AddressStore + ?Sized>(
    pipeline: &AddressPipeline,
    store: &S,
    source: InputSource,
    raw_text: &str,
    hint: Option<GeocodeHint>,
) -> Result<PipelineOutcome> {
    let outcome = pipeline.process(raw_text, hint)?;

    let record = AddressRecord {
        source_text: raw_text.to_string(),
        source,
        parsed: outcome.parsed.clone(),
        geocoded: outcome.geocoded.clone(),
        resolution: outcome.resolution.clone(),
        nodal_delivery_center: outcome
            .resolution
            .hub()
            .unwrap_or(NOT_FOUND_LABEL)
            .to_string(),
        created_at: chrono::Utc::now(),
    };
    if let Err(e) = store.record_address(record).await {
        tracing::warn!("⚠️ Failed to record address: {}", e);
    }

    if let Some(audit) = outcome.audit.clone() {
        if let Err(e) = store.record_wrong_pincode(audit).await {
            tracing::warn!("⚠️ Failed to record wrong pincode: {}", e);
        }
    }

    Ok(outcome)
}
