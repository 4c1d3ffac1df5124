//! Notification sink port trait.

use crate::domain::error::AlTraderError;
use crate::domain::summary::TradeSummary;

pub trait NotificationPort {
    fn send(&self, summary: &TradeSummary) -> Result<(), AlTraderError>;
}
