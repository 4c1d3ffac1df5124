//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_store_adapter;
pub mod dataset_csv_adapter;
pub mod email_outbox_adapter;
pub mod file_config_adapter;
pub mod mirror_sync_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod tables;
