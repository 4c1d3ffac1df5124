//! Remote sheet mirror: writes the five tables to a second workbook
//! directory after the primary store has been saved.

use std::path::PathBuf;

use tracing::info;

use super::csv_store_adapter::CsvWorkbookStore;
use crate::domain::error::AlTraderError;
use crate::ports::store_port::{PortfolioStore, StoreSnapshot};
use crate::ports::sync_port::RemoteSyncPort;

pub struct MirrorSyncAdapter {
    mirror: CsvWorkbookStore,
}

impl MirrorSyncAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            mirror: CsvWorkbookStore::new(dir),
        }
    }
}

impl RemoteSyncPort for MirrorSyncAdapter {
    fn sync(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError> {
        self.mirror.save(snapshot).map_err(|e| AlTraderError::Sync {
            reason: e.to_string(),
        })?;
        info!(dir = %self.mirror.dir().display(), "mirrored workbook");
        Ok(())
    }
}
