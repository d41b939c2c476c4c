// src/fetch.rs
//! Screener transport: one blocking HTTP client per run, a fixed page URL
//! shape, and a post-request delay to respect the source's rate limits.
//!
//! The aggregator only sees the `PageFetcher` seam, so tests can feed it
//! synthetic pages without any network.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::table::{parse_table, RawRow};

pub const BASE_URL: &str = "https://finviz.com/screener.ashx";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Column projections fetched per page; together they cover every metric a
/// candidate needs, which no single view does.
pub const VIEWS: [u32; 3] = [111, 121, 161];

pub const ROWS_PER_PAGE: u32 = 20;

/// Exchange display name -> screener filter code.
pub const EXCHANGES: [(&str, &str); 3] = [
    ("NASDAQ", "exch_nasd"),
    ("NYSE", "exch_nyse"),
    ("AMEX", "exch_amex"),
];

// Keep this broad; selection narrows later.
pub const BASE_FILTERS: [&str; 5] = [
    "geo_usa",
    "ind_stocksonly",
    "cap_midover",
    "sh_price_o5",
    "sh_avgvol_o200",
];

pub const RESULT_ORDER: &str = "-marketcap";

/// One page of one view of the screener, as flat rows.
pub trait PageFetcher {
    fn fetch_page(&self, view: u32, exchange_filter: &str, start_row: u32) -> Result<Vec<RawRow>>;
}

/// Comma-joined filter expression: exchange filter first, base filters after.
pub fn filter_expression(exchange_filter: &str) -> String {
    let mut parts = Vec::with_capacity(1 + BASE_FILTERS.len());
    parts.push(exchange_filter);
    parts.extend(BASE_FILTERS);
    parts.join(",")
}

pub struct ScreenerClient {
    http: reqwest::blocking::Client,
    delay: Duration,
}

impl ScreenerClient {
    pub fn new(delay: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building screener HTTP client")?;
        Ok(Self { http, delay })
    }
}

impl PageFetcher for ScreenerClient {
    fn fetch_page(&self, view: u32, exchange_filter: &str, start_row: u32) -> Result<Vec<RawRow>> {
        let response = self
            .http
            .get(BASE_URL)
            .query(&[
                ("v", view.to_string()),
                ("ft", "4".to_string()),
                ("o", RESULT_ORDER.to_string()),
                ("f", filter_expression(exchange_filter)),
                ("r", start_row.to_string()),
            ])
            .send()
            .with_context(|| format!("fetching screener view {view} at row {start_row}"))?
            .error_for_status()
            .with_context(|| format!("screener rejected view {view} at row {start_row}"))?;
        let body = response
            .text()
            .with_context(|| format!("reading screener view {view} at row {start_row}"))?;

        // Unconditional pause between requests, success or not downstream.
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let rows = parse_table(&body);
        debug!(view, start_row, rows = rows.len(), "fetched screener page");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_expression_puts_exchange_first() {
        let expr = filter_expression("exch_nyse");
        assert!(expr.starts_with("exch_nyse,geo_usa,"));
        assert_eq!(expr.matches(',').count(), BASE_FILTERS.len());
    }
}
