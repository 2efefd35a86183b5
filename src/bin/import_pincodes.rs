use clap::Parser;
use parcel_router::core::loader::{HubColumn, PincodeTable};
use parcel_router::utils::logger;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "import-pincodes")]
#[command(about = "Import a postal table CSV and inspect the resulting hub registry")]
struct Args {
    /// Postal table CSV (CircleName, RegionName, ..., Latitude, Longitude)
    #[arg(short, long, default_value = "pincode.csv")]
    file: String,

    /// Column naming the hub: circle, region, division, district
    #[arg(long, default_value = "division")]
    hub_column: HubColumn,

    #[arg(long, default_value = "1")]
    page: usize,

    #[arg(long, default_value = "50")]
    per_page: usize,

    /// Search pincode, office name or district instead of paging
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long, default_value = "10")]
    limit: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let start = Instant::now();
    let (table, report) = PincodeTable::from_csv_path(&args.file)?;
    let registry = table.to_registry(args.hub_column);

    tracing::info!(
        "✅ Imported {} of {} rows in {:.2?}",
        report.imported,
        report.total_rows,
        start.elapsed()
    );
    if report.invalid_coordinates > 0 {
        tracing::warn!(
            "⚠️ {} rows skipped due to invalid coordinates",
            report.invalid_coordinates
        );
    }
    if !registry.conflicts().is_empty() {
        tracing::warn!(
            "⚠️ {} pincodes claimed by more than one hub (first hub kept)",
            registry.conflicts().len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "📚 Registry: {} hubs, {} pincodes",
        registry.hub_count(),
        registry.code_count()
    );

    match &args.search {
        Some(query) => {
            let results = table.search(query, args.limit);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        None => {
            let page = table.page(args.page, args.per_page)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(())
}
