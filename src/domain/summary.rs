//! End-of-run trading summary rendered for notification delivery.

use chrono::NaiveDateTime;

use super::portfolio::{Holding, Holdings, PortfolioSummary};
use super::trade::{TradeLedger, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    pub generated_at: NaiveDateTime,
    /// Trades executed on the calendar day of `generated_at`.
    pub trades: Vec<TradeRecord>,
    pub holdings: Vec<Holding>,
    pub portfolio: PortfolioSummary,
}

impl TradeSummary {
    pub fn build(
        generated_at: NaiveDateTime,
        ledger: &TradeLedger,
        holdings: &Holdings,
        portfolio: PortfolioSummary,
    ) -> Self {
        TradeSummary {
            generated_at,
            trades: ledger
                .trades_on(generated_at.date())
                .into_iter()
                .cloned()
                .collect(),
            holdings: holdings.iter().cloned().collect(),
            portfolio,
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Trading Summary - {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    pub fn render_text(&self) -> String {
        let mut out = String::from("Here is a summary of the last EXECUTED TRADES:\n\n");
        if self.trades.is_empty() {
            out.push_str("  (no trades today)\n");
        }
        for t in &self.trades {
            out.push_str(&format!(
                "  {}  {:<6} {:<4} {:>6} shares  ${:.2}\n",
                t.timestamp.format("%d/%m/%Y %H:%M:%S"),
                t.ticker,
                t.side,
                t.shares,
                t.value
            ));
        }

        out.push_str("\nCURRENT HOLDINGS:\n\n");
        if self.holdings.is_empty() {
            out.push_str("  (none)\n");
        }
        for h in &self.holdings {
            out.push_str(&format!(
                "  {:<6} {:>6} shares @ ${:.2} = ${:.2} (cost ${:.2})\n",
                h.ticker, h.shares, h.price, h.value, h.cost_basis
            ));
        }

        out.push_str("\nPORTFOLIO SUMMARY:\n\n");
        out.push_str(&format!("  CASH    ${:.2}\n", self.portfolio.cash));
        out.push_str(&format!("  STOCKS  ${:.2}\n", self.portfolio.stocks));
        out.push_str(&format!("  TOTAL   ${:.2}\n", self.portfolio.total));
        out
    }

    pub fn render_html(&self) -> String {
        let mut out = String::from("<html><body>\n");
        out.push_str("<p>Here is a summary of the last EXECUTED TRADES:</p>\n");
        out.push_str(
            "<table>\n<tr><th>date</th><th>ticker</th><th>side</th><th>shares</th><th>value</th></tr>\n",
        );
        for t in &self.trades {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                t.timestamp.format("%d/%m/%Y %H:%M:%S"),
                escape(&t.ticker),
                t.side,
                t.shares,
                t.value
            ));
        }
        out.push_str("</table>\n<p>CURRENT HOLDINGS:</p>\n");
        out.push_str(
            "<table>\n<tr><th>ticker</th><th>shares</th><th>price</th><th>value</th><th>cost_basis</th></tr>\n",
        );
        for h in &self.holdings {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                escape(&h.ticker),
                h.shares,
                h.price,
                h.value,
                h.cost_basis
            ));
        }
        out.push_str("</table>\n<p>PORTFOLIO SUMMARY:</p>\n<table>\n");
        for (label, value) in [
            ("CASH", self.portfolio.cash),
            ("STOCKS", self.portfolio.stocks),
            ("TOTAL", self.portfolio.total),
        ] {
            out.push_str(&format!("<tr><th>{label}</th><td>{value:.2}</td></tr>\n"));
        }
        out.push_str("</table>\n</body></html>\n");
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::TradeSide;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample() -> TradeSummary {
        let ledger = TradeLedger::from_records(vec![
            TradeRecord {
                timestamp: at(1, 10),
                ticker: "XOM".into(),
                side: TradeSide::Buy,
                shares: 1,
                value: 10.0,
            },
            TradeRecord {
                timestamp: at(2, 16),
                ticker: "AAPL".into(),
                side: TradeSide::Buy,
                shares: 3,
                value: 450.0,
            },
        ]);
        let mut holdings = Holdings::new();
        holdings.upsert(Holding {
            ticker: "AAPL".into(),
            shares: 3,
            price: 150.0,
            value: 450.0,
            cost_basis: 150.0,
        });
        let portfolio = PortfolioSummary {
            cash: 550.0,
            stocks: 450.0,
            total: 1000.0,
        };
        TradeSummary::build(at(2, 17), &ledger, &holdings, portfolio)
    }

    #[test]
    fn build_keeps_only_todays_trades() {
        let summary = sample();
        assert_eq!(summary.trades.len(), 1);
        assert_eq!(summary.trades[0].ticker, "AAPL");
        assert_eq!(summary.holdings.len(), 1);
    }

    #[test]
    fn text_contains_sections() {
        let text = sample().render_text();
        assert!(text.contains("EXECUTED TRADES"));
        assert!(text.contains("AAPL   buy       3 shares  $450.00"));
        assert!(!text.contains("XOM"));
        assert!(text.contains("TOTAL   $1000.00"));
    }

    #[test]
    fn html_contains_tables() {
        let html = sample().render_html();
        assert!(html.starts_with("<html>"));
        assert_eq!(html.matches("<table>").count(), 3);
        assert!(html.contains("<td>450.00</td>"));
    }

    #[test]
    fn subject_has_timestamp() {
        assert_eq!(sample().subject(), "Trading Summary - 2024-07-02 17:00:00");
    }
}
