use clap::Parser;
use parcel_router::config::TomlConfig;
use parcel_router::domain::ports::ConfigProvider;
use parcel_router::utils::{logger, validation::Validate};
use parcel_router::{AddressPipeline, FileStore, LocalStorage, Registry, RoutingEngine, SharedRegistry};

#[derive(Parser)]
#[command(name = "pincode-check")]
#[command(about = "Validate a pincode and suggest a correction when it is unknown")]
struct Args {
    /// Pincode to check
    #[arg(short, long)]
    pincode: String,

    /// Address text the pincode came from, kept in the audit log
    #[arg(short, long)]
    address_text: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, default_value = "./output")]
    output_path: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let (pipeline, output_path) = match &args.config {
        Some(path) => {
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            let registry = SharedRegistry::loaded(config.build_registry()?);
            (config.build_pipeline(registry)?, config.output_path().to_string())
        }
        None => (
            AddressPipeline::with_defaults(SharedRegistry::loaded(Registry::bundled()))?,
            args.output_path.clone(),
        ),
    };

    let engine = RoutingEngine::new(pipeline, FileStore::new(LocalStorage::new(output_path)));

    match engine
        .check_pincode(&args.pincode, args.address_text.as_deref())
        .await
    {
        Ok(check) => {
            if check.is_valid {
                tracing::info!("✅ {}", check.message);
            } else {
                tracing::warn!("⚠️ {}", check.message);
            }
            println!("{}", serde_json::to_string_pretty(&check)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }
}
