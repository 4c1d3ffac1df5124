//! Port traits for every external collaborator of the trading core.

pub mod config_port;
pub mod data_port;
pub mod notify_port;
pub mod store_port;
pub mod sync_port;
