use crate::core::loader::HubColumn;
use crate::domain::model::InputSource;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_concurrency, validate_file_extension, validate_path, Validate,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "parcel-router")]
#[command(about = "Segment addresses, reconcile pincodes and assign delivery hubs")]
pub struct CliConfig {
    /// Address text to process (repeatable)
    #[arg(long = "address", value_name = "TEXT")]
    pub addresses: Vec<String>,

    /// File with one address per line
    #[arg(long)]
    pub input_file: Option<String>,

    /// Where the text came from: ocr, text or voice
    #[arg(long, default_value = "text")]
    pub source: InputSource,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Build the registry from a postal table CSV instead of the configured source
    #[arg(long)]
    pub registry_csv: Option<String>,

    /// Column naming the hub when importing a CSV: circle, region, division, district
    #[arg(long)]
    pub hub_column: Option<HubColumn>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    /// Print the wrong-pincode audit log (newest first) and exit
    #[arg(long)]
    pub list_wrong_pincodes: bool,

    /// Print dashboard totals (addresses, corrections, voice inputs, per hub) and exit
    #[arg(long)]
    pub dashboard: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        validate_concurrency("concurrent_requests", self.concurrent_requests)?;
        if let Some(csv) = &self.registry_csv {
            validate_file_extension("registry_csv", csv, &["csv"])?;
        }
        if let Some(input) = &self.input_file {
            validate_path("input_file", input)?;
        }
        Ok(())
    }
}
