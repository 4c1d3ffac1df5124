//! Email notification via an outbox directory.
//!
//! Each summary becomes one `.eml` message (multipart text + HTML) that a
//! local mail transfer agent picks up. Nothing is sent over the network
//! from this process.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::error::AlTraderError;
use crate::domain::summary::TradeSummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::NotificationPort;

const BOUNDARY: &str = "altrader-summary-boundary";

pub struct EmailOutboxAdapter {
    outbox: PathBuf,
    sender: String,
    recipient: String,
}

impl EmailOutboxAdapter {
    pub fn new(outbox: PathBuf, sender: &str, recipient: &str) -> Self {
        Self {
            outbox,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AlTraderError> {
        let missing = |key: &str| AlTraderError::ConfigMissing {
            section: "notify".into(),
            key: key.into(),
        };
        let sender = config.get_string("notify", "sender").ok_or_else(|| missing("sender"))?;
        let recipient = config
            .get_string("notify", "recipient")
            .ok_or_else(|| missing("recipient"))?;
        let outbox = config
            .get_string("notify", "outbox")
            .unwrap_or_else(|| "outbox".to_string());
        Ok(Self::new(PathBuf::from(outbox), &sender, &recipient))
    }

    pub fn render_message(&self, summary: &TradeSummary) -> String {
        format!(
            "From: {from}\r\n\
             To: {to}\r\n\
             Subject: {subject}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/alternative; boundary=\"{BOUNDARY}\"\r\n\
             \r\n\
             --{BOUNDARY}\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             {text}\r\n\
             --{BOUNDARY}\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             \r\n\
             {html}\r\n\
             --{BOUNDARY}--\r\n",
            from = self.sender,
            to = self.recipient,
            subject = summary.subject(),
            text = summary.render_text(),
            html = summary.render_html(),
        )
    }
}

impl NotificationPort for EmailOutboxAdapter {
    fn send(&self, summary: &TradeSummary) -> Result<(), AlTraderError> {
        let notify_err = |e: std::io::Error| AlTraderError::Notify {
            reason: format!("{}: {e}", self.outbox.display()),
        };
        fs::create_dir_all(&self.outbox).map_err(notify_err)?;

        let name = format!("summary-{}.eml", summary.generated_at.format("%Y%m%d-%H%M%S"));
        let path = self.outbox.join(name);
        fs::write(&path, self.render_message(summary)).map_err(notify_err)?;
        info!(
            path = %path.display(),
            recipient = %self.recipient,
            trades = summary.trades.len(),
            "queued summary email"
        );
        Ok(())
    }
}
