//! Best-effort remote copy of the store tables.

use crate::domain::error::AlTraderError;
use crate::ports::store_port::StoreSnapshot;

/// Mirrors the persisted tables somewhere else. Failures are reported to the
/// caller, which logs and discards them.
pub trait RemoteSyncPort {
    fn sync(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError>;
}
