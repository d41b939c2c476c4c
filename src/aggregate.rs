// src/aggregate.rs
//! Multi-view row reconciliation.
//!
//! For one exchange, walk page offsets 1, 21, 41, ... up to the page limit,
//! fetch every view at each offset, and shallow-merge rows by ticker. A
//! merged record is seeded `{Ticker, Exchange}` and updated with each view's
//! row; on shared keys the later view wins. The loop stops after a page
//! where the minimum row count across views is zero (that page is not
//! merged) or smaller than a full page (that page is merged first).

use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::fetch::{PageFetcher, ROWS_PER_PAGE, VIEWS};
use crate::table::{RawRow, EXCHANGE_COLUMN, TICKER_COLUMN};

/// Merged, ticker-deduplicated rows for one exchange, in first-seen order.
pub fn merge_exchange_rows(
    fetcher: &dyn PageFetcher,
    exchange_name: &str,
    exchange_filter: &str,
    max_pages: u32,
) -> Result<Vec<RawRow>> {
    let mut merged: HashMap<String, RawRow> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for page in 0..max_pages {
        let start_row = 1 + page * ROWS_PER_PAGE;
        let mut page_rows: Vec<Vec<RawRow>> = Vec::with_capacity(VIEWS.len());
        for view in VIEWS {
            page_rows.push(fetcher.fetch_page(view, exchange_filter, start_row)?);
        }

        let min_count = page_rows.iter().map(Vec::len).min().unwrap_or(0);
        if min_count == 0 {
            break;
        }

        for rows in &page_rows {
            for row in rows {
                let ticker = row
                    .get(TICKER_COLUMN)
                    .map(|t| t.trim().to_ascii_uppercase())
                    .unwrap_or_default();
                if ticker.is_empty() {
                    continue;
                }
                let slot = merged.entry(ticker.clone()).or_insert_with(|| {
                    order.push(ticker.clone());
                    let mut seed = RawRow::new();
                    seed.insert(TICKER_COLUMN.to_string(), ticker.clone());
                    seed.insert(EXCHANGE_COLUMN.to_string(), exchange_name.to_string());
                    seed
                });
                for (key, value) in row {
                    slot.insert(key.clone(), value.clone());
                }
            }
        }

        if min_count < ROWS_PER_PAGE as usize {
            break;
        }
    }

    debug!(
        exchange = exchange_name,
        tickers = order.len(),
        "merged exchange rows"
    );
    Ok(order
        .into_iter()
        .filter_map(|ticker| merged.remove(&ticker))
        .collect())
}
