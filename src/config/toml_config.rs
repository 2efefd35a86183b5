use crate::core::loader::{HubColumn, PincodeTable};
use crate::core::pipeline::AddressPipeline;
use crate::core::registry::{Registry, SharedRegistry};
use crate::core::segmenter::AddressSegmenter;
use crate::core::validator::CorrectionPolicy;
use crate::domain::model::{Hub, PostalCode};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, RouterError};
use crate::utils::validation::{
    validate_concurrency, validate_file_extension, validate_non_empty_string, validate_path,
    validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySource {
    #[default]
    Bundled,
    Inline,
    Csv,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub source: RegistrySource,
    pub csv_path: Option<String>,
    #[serde(default)]
    pub hub_column: HubColumn,
    #[serde(default)]
    pub hubs: Vec<HubConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    pub name: String,
    pub pincodes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// 覆寫預設州名清單
    pub states: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionConfig {
    pub min_length: Option<usize>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub output_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub concurrent_requests: Option<usize>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RouterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PINCODE_CSV})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("service.name", &self.service.name)?;
        validate_path("storage.output_path", &self.storage.output_path)?;

        if let Some(concurrent) = self.processing.concurrent_requests {
            validate_concurrency("processing.concurrent_requests", concurrent)?;
        }

        self.correction_policy().validate()?;

        match self.registry.source {
            RegistrySource::Bundled => {}
            RegistrySource::Csv => {
                let csv_path = validate_required_field("registry.csv_path", &self.registry.csv_path)?;
                validate_path("registry.csv_path", csv_path)?;
                validate_file_extension("registry.csv_path", csv_path, &["csv"])?;
            }
            RegistrySource::Inline => {
                if self.registry.hubs.is_empty() {
                    return Err(RouterError::MissingConfigError {
                        field: "registry.hubs".to_string(),
                    });
                }
                for (index, hub) in self.registry.hubs.iter().enumerate() {
                    validate_non_empty_string(&format!("registry.hubs[{}].name", index), &hub.name)?;
                    if let Some(bad) = hub.pincodes.iter().find(|c| !PostalCode::is_well_formed(c)) {
                        return Err(RouterError::InvalidConfigValueError {
                            field: format!("registry.hubs[{}].pincodes", index),
                            value: bad.clone(),
                            reason: "pincodes must be exactly 6 digits".to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn correction_policy(&self) -> CorrectionPolicy {
        let defaults = CorrectionPolicy::default();
        CorrectionPolicy {
            min_length: self.correction.min_length.unwrap_or(defaults.min_length),
            threshold: self.correction.threshold.unwrap_or(defaults.threshold),
        }
    }

    pub fn build_segmenter(&self) -> Result<AddressSegmenter> {
        match &self.segmenter.states {
            Some(states) => AddressSegmenter::with_states(states),
            None => AddressSegmenter::new(),
        }
    }

    /// 依 `registry.source` 建立 Registry
    pub fn build_registry(&self) -> Result<Registry> {
        match self.registry.source {
            RegistrySource::Bundled => Ok(Registry::bundled()),
            RegistrySource::Inline => {
                let hubs = self
                    .registry
                    .hubs
                    .iter()
                    .map(|hub| {
                        let codes = hub
                            .pincodes
                            .iter()
                            .map(|code| {
                                PostalCode::parse(code).ok_or_else(|| {
                                    RouterError::InvalidConfigValueError {
                                        field: format!("registry.hubs.{}", hub.name),
                                        value: code.clone(),
                                        reason: "pincodes must be exactly 6 digits".to_string(),
                                    }
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(Hub::new(hub.name.clone(), codes))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Registry::from_hubs(hubs))
            }
            RegistrySource::Csv => {
                let csv_path =
                    validate_required_field("registry.csv_path", &self.registry.csv_path)?;
                let (table, _report) = PincodeTable::from_csv_path(csv_path)?;
                Ok(table.to_registry(self.registry.hub_column))
            }
        }
    }

    pub fn build_pipeline(&self, registry: SharedRegistry) -> Result<AddressPipeline> {
        Ok(AddressPipeline::new(
            registry,
            self.build_segmenter()?,
            self.correction_policy(),
        ))
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.storage.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.processing.concurrent_requests.unwrap_or(5)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
