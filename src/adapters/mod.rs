// Adapters layer: concrete implementations of the domain ports (storage, persistence).

pub mod file_store;
pub mod memory;
pub mod storage;
