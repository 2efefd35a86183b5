use clap::Parser;
use parcel_router::config::TomlConfig;
use parcel_router::core::loader::{HubColumn, PincodeTable};
use parcel_router::domain::ports::ConfigProvider;
use parcel_router::utils::error::ErrorCategory;
use parcel_router::utils::{logger, validation::Validate};
use parcel_router::{
    AddressPipeline, CliConfig, FileStore, LocalStorage, Registry, RouterError, RoutingEngine,
    SharedRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting parcel-router");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let toml_config = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let toml_config = TomlConfig::from_file(path).unwrap_or_else(|e| exit_with(&e));
            if let Err(e) = toml_config.validate() {
                exit_with(&e);
            }
            tracing::info!(
                "🔧 Service: {} ({})",
                toml_config.service.name,
                toml_config.service.description.as_deref().unwrap_or("no description")
            );
            Some(toml_config)
        }
        None => None,
    };

    let registry = build_registry(&config, toml_config.as_ref()).unwrap_or_else(|e| exit_with(&e));
    tracing::info!(
        "📚 Registry loaded: {} hubs, {} pincodes",
        registry.hub_count(),
        registry.code_count()
    );
    let shared = SharedRegistry::loaded(registry);

    let (pipeline, output_path, concurrency) = match &toml_config {
        Some(toml_config) => (
            toml_config.build_pipeline(shared)?,
            toml_config.output_path().to_string(),
            toml_config.concurrent_requests(),
        ),
        None => (
            AddressPipeline::with_defaults(shared)?,
            config.output_path().to_string(),
            config.concurrent_requests(),
        ),
    };

    let store = FileStore::new(LocalStorage::new(output_path.clone()));
    let engine = RoutingEngine::new(pipeline, store).with_concurrency(concurrency);

    if config.dashboard {
        let summary = engine.dashboard().await?;
        tracing::info!(
            "📊 {} addresses, {} wrong pincodes, {} voice inputs",
            summary.total_addresses,
            summary.total_wrong_pincodes,
            summary.total_voice_addresses
        );
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if config.list_wrong_pincodes {
        let records = engine.wrong_pincodes().await?;
        tracing::info!("📋 {} wrong pincode records", records.len());
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut texts = config.addresses.clone();
    if let Some(input_file) = &config.input_file {
        let content = tokio::fs::read_to_string(input_file).await?;
        texts.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    if texts.is_empty() {
        eprintln!("❌ No addresses given. Use --address or --input-file.");
        std::process::exit(2);
    }

    let results = engine.process_batch(config.source, texts.clone()).await;
    let mut failures = 0;
    for (text, result) in texts.iter().zip(results) {
        match result {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(e) => {
                failures += 1;
                tracing::error!("❌ '{}': {}", text, e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }

    tracing::info!("📁 Records saved to: {}", output_path);
    if failures > 0 {
        std::process::exit(2);
    }
    Ok(())
}

fn build_registry(config: &CliConfig, toml_config: Option<&TomlConfig>) -> parcel_router::Result<Registry> {
    if let Some(csv_path) = &config.registry_csv {
        let hub_column = config
            .hub_column
            .or_else(|| toml_config.map(|c| c.registry.hub_column))
            .unwrap_or(HubColumn::Division);
        let (table, report) = PincodeTable::from_csv_path(csv_path)?;
        tracing::info!(
            "📊 Imported {}/{} rows from {}",
            report.imported,
            report.total_rows,
            csv_path
        );
        return Ok(table.to_registry(hub_column));
    }

    match toml_config {
        Some(toml_config) => toml_config.build_registry(),
        None => Ok(Registry::bundled()),
    }
}

fn exit_with(e: &RouterError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::Input => 2,
        ErrorCategory::Configuration => 1,
        ErrorCategory::Storage => 1,
        ErrorCategory::Dependency => 3,
    };
    std::process::exit(exit_code);
}
