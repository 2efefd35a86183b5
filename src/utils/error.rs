use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Dependency unavailable: {message}")]
    DependencyFailure { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Pattern compilation error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// 錯誤分類，決定呼叫端該如何回應
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入錯誤 (4xx)
    Input,
    /// 依賴資源不可用，例如 Registry 尚未載入
    Dependency,
    Configuration,
    Storage,
}

impl RouterError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        Self::DependencyFailure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::DependencyFailure { .. } => ErrorCategory::Dependency,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_)
            | Self::RegexError(_) => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => format!("The request was rejected: {}", message),
            Self::DependencyFailure { .. } => {
                "The pincode registry is not available right now".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Configuration is missing the '{}' setting", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the address text or pincode and try again",
            ErrorCategory::Dependency => {
                "Load a registry (bundled, inline TOML hubs or a pincode CSV) before processing"
            }
            ErrorCategory::Configuration => "Review the TOML configuration and CLI flags",
            ErrorCategory::Storage => "Verify the file paths exist and are readable/writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(RouterError::invalid_input("empty").is_client_error());
        assert_eq!(
            RouterError::dependency("unloaded").category(),
            ErrorCategory::Dependency
        );
        let io = RouterError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(io.category(), ErrorCategory::Storage);
        assert!(!io.is_client_error());
    }

    #[test]
    fn test_user_friendly_message() {
        let err = RouterError::MissingConfigError {
            field: "registry.csv_path".to_string(),
        };
        assert!(err.user_friendly_message().contains("registry.csv_path"));
    }
}
