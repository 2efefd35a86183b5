pub mod engine;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod segmenter;
pub mod validator;

pub use crate::domain::model::{
    CorrectionResult, Hub, ParsedAddress, PipelineOutcome, PostalCode, Resolution,
};
pub use crate::domain::ports::{AddressStore, ConfigProvider, Storage};
pub use crate::utils::error::Result;
