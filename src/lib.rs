pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{file_store::FileStore, memory::InMemoryStore, storage::LocalStorage};
pub use core::{
    engine::RoutingEngine,
    pipeline::AddressPipeline,
    registry::{Registry, SharedRegistry},
};
pub use utils::error::{Result, RouterError};
