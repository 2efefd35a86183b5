use anyhow::Result;
use parcel_router::core::resolver::NOT_FOUND_LABEL;
use parcel_router::domain::model::{InputSource, Resolution};
use parcel_router::{
    AddressPipeline, FileStore, LocalStorage, Registry, RouterError, RoutingEngine, SharedRegistry,
};
use tempfile::TempDir;

fn file_engine(temp_dir: &TempDir) -> RoutingEngine<FileStore<LocalStorage>> {
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let pipeline =
        AddressPipeline::with_defaults(SharedRegistry::loaded(Registry::bundled())).unwrap();
    RoutingEngine::new(pipeline, FileStore::new(LocalStorage::new(output_path)))
}

/// 完整地址：切分、驗證、指派配送中心
#[tokio::test]
async fn test_end_to_end_valid_address() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    let outcome = engine
        .process(
            InputSource::Ocr,
            "123 Ganesh Peth, Pune, Maharashtra 411002",
            None,
        )
        .await?;

    assert_eq!(outcome.parsed.street.as_deref(), Some("123 Ganesh Peth"));
    assert_eq!(outcome.parsed.city.as_deref(), Some("Pune"));
    assert_eq!(outcome.parsed.state.as_deref(), Some("Maharashtra"));
    assert_eq!(
        outcome.parsed.pincode.as_ref().map(|c| c.as_str()),
        Some("411002")
    );
    assert_eq!(
        outcome.resolution,
        Resolution::Resolved {
            hub: "Pune Main Nodal Center".to_string()
        }
    );

    let addresses = engine.store().addresses().await?;
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].source, InputSource::Ocr);
    assert!(!temp_dir.path().join("wrong_pincodes.jsonl").exists());
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_correction_is_audited() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    let text = "Sarojini Devi Road, Secunderabad, Telangana 500009";
    let outcome = engine.process(InputSource::Text, text, None).await?;

    assert_eq!(outcome.parsed.state.as_deref(), Some("Telangana"));
    match &outcome.resolution {
        Resolution::ResolvedViaSuggestion {
            hub, suggestion, ..
        } => {
            assert_eq!(hub, "Hyderabad Sarojini Devi Hub");
            assert_eq!(suggestion.as_str(), "500001");
        }
        other => panic!("expected a corrected resolution, got {:?}", other),
    }

    let audit = engine.wrong_pincodes().await?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].original, "500009");
    assert_eq!(audit[0].corrected.as_str(), "500001");
    assert_eq!(audit[0].source_text, text);
    assert!((audit[0].confidence - 5.0 / 6.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_no_pincode_stops_before_correction() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    let outcome = engine
        .process(InputSource::Voice, "123 Main Street, Mumbai, Maharashtra", None)
        .await?;

    assert_eq!(outcome.parsed.pincode, None);
    assert_eq!(outcome.resolution, Resolution::UnresolvedNoPincode);
    assert!(outcome.audit.is_none());
    assert!(engine.wrong_pincodes().await?.is_empty());

    let addresses = engine.store().addresses().await?;
    assert_eq!(addresses[0].nodal_delivery_center, NOT_FOUND_LABEL);
    Ok(())
}

#[tokio::test]
async fn test_repeated_runs_resolve_identically() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);
    let text = "Ring Road, Nagpur 440090";

    let first = engine.process(InputSource::Text, text, None).await?;
    let second = engine.process(InputSource::Text, text, None).await?;

    assert_eq!(first.resolution, second.resolution);
    assert_eq!(first.parsed, second.parsed);
    // 稽核紀錄只會累加
    assert_eq!(engine.wrong_pincodes().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_wrong_pincodes_are_listed_newest_first() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    engine.check_pincode("302009", Some("JLN Marg, Jaipur")).await?;
    engine.check_pincode("380019", Some("MG Road, Ahmedabad")).await?;

    let listed = engine.wrong_pincodes().await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].original, "380019");
    assert_eq!(listed[1].original, "302009");
    assert!(listed[0].timestamp >= listed[1].timestamp);
    Ok(())
}

#[tokio::test]
async fn test_unknown_pincode_without_suggestion() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    let outcome = engine
        .process(InputSource::Text, "Unknown Lane, Nowhere 999999", None)
        .await?;
    assert_eq!(
        outcome.resolution,
        Resolution::UnresolvedNoMatch {
            original: "999999".to_string()
        }
    );
    assert!(engine.wrong_pincodes().await?.is_empty());

    let check = engine.check_pincode("12", None).await?;
    assert!(check.suggestion.is_none());
    assert_eq!(check.confidence, None);
    Ok(())
}

#[tokio::test]
async fn test_registry_refresh_and_unloaded_state() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let shared = SharedRegistry::unloaded();
    let pipeline = AddressPipeline::with_defaults(shared.clone())?;
    let engine = RoutingEngine::new(
        pipeline,
        FileStore::new(LocalStorage::new(temp_dir.path().to_str().unwrap())),
    );

    let err = engine
        .process(InputSource::Text, "Fort, Mumbai 400001", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::DependencyFailure { .. }));
    assert!(engine.store().addresses().await?.is_empty());

    shared.replace(Registry::bundled())?;
    let outcome = engine
        .process(InputSource::Text, "Fort, Mumbai 400001", None)
        .await?;
    assert_eq!(outcome.resolution.hub(), Some("Mumbai Central Nodal Center"));
    Ok(())
}

#[tokio::test]
async fn test_batch_from_many_sources() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir).with_concurrency(3);

    let texts: Vec<String> = [
        "MG Road, Bangalore, Karnataka 560002",
        "Park Street, Kolkata, West Bengal 700017",
        "Ashram Road, Ahmedabad, Gujarat 380010",
        "Banjara Hills, Hyderabad 500004",
        "Lal Chowk, Srinagar",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let results = engine.process_batch(InputSource::Ocr, texts).await;
    let hubs: Vec<Option<String>> = results
        .iter()
        .map(|r| {
            r.as_ref()
                .ok()
                .and_then(|o| o.resolution.hub().map(str::to_string))
        })
        .collect();

    assert_eq!(
        hubs,
        vec![
            Some("Bangalore MG Road Center".to_string()),
            Some("Kolkata Park Street Hub".to_string()),
            Some("Ahmedabad MG Road Hub".to_string()),
            Some("Hyderabad Sarojini Devi Hub".to_string()),
            None,
        ]
    );
    assert_eq!(engine.store().addresses().await?.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_dashboard_reads_back_file_logs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let engine = file_engine(&temp_dir);

    engine
        .process(InputSource::Voice, "Ganesh Peth, Pune 411002", None)
        .await?;
    engine
        .process(InputSource::Text, "JLN Marg, Jaipur 302009", None)
        .await?;

    // 另一個 engine 指向同一個目錄，看到相同的紀錄
    let reader = file_engine(&temp_dir);
    let summary = reader.dashboard().await?;
    assert_eq!(summary.total_addresses, 2);
    assert_eq!(summary.total_wrong_pincodes, 1);
    assert_eq!(summary.total_voice_addresses, 1);
    assert_eq!(summary.nodal_centers.len(), 2);
    assert_eq!(summary.recent_addresses[0].source_text, "JLN Marg, Jaipur 302009");
    Ok(())
}
