//! Hyperliquid Info API client.

use super::{DataSource, DataSourceError};
use crate::domain::{Address, BookSnapshot, Coin, Fill, RawBook, RawFill};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Most fills the exchange returns for one `userFillsByTime` request.
pub const FILLS_PAGE_LIMIT: usize = 2000;

const DEFAULT_RETRY_WINDOW: Duration = Duration::from_secs(30);

/// Hyperliquid data source using the public Info API.
#[derive(Debug, Clone)]
pub struct HyperliquidDataSource {
    client: Client,
    base_url: String,
    retry_window: Duration,
    fills_page_limit: usize,
}

impl HyperliquidDataSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_window: DEFAULT_RETRY_WINDOW,
            fills_page_limit: FILLS_PAGE_LIMIT,
        }
    }

    /// How long transient failures are retried. Zero makes a single attempt,
    /// for callers that run their own backoff.
    pub fn with_retry_window(mut self, window: Duration) -> Self {
        self.retry_window = window;
        self
    }

    /// Page size at which another `userFillsByTime` page is requested.
    pub fn with_fills_page_limit(mut self, limit: usize) -> Self {
        self.fills_page_limit = limit.max(1);
        self
    }

    async fn post_info(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/info", self.base_url);

        if self.retry_window.is_zero() {
            return self
                .send_info(&url, &payload)
                .await
                .map_err(|e| match e {
                    backoff::Error::Permanent(err) => err,
                    backoff::Error::Transient { err, .. } => err,
                });
        }

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_window),
            ..Default::default()
        };
        retry(backoff, || self.send_info(&url, &payload)).await
    }

    async fn send_info(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, backoff::Error<DataSourceError>> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(DataSourceError::NetworkError(e.to_string())))?;

        let status = response.status();
        if status == 429 {
            return Err(backoff::Error::transient(DataSourceError::RateLimited));
        }
        if status.is_server_error() {
            return Err(backoff::Error::transient(DataSourceError::HttpError {
                status: status.as_u16(),
                message: "Server error".to_string(),
            }));
        }
        if !status.is_success() {
            return Err(backoff::Error::permanent(DataSourceError::HttpError {
                status: status.as_u16(),
                message: "Client error".to_string(),
            }));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
    }
}

/// Collects `userFillsByTime` pages into one history.
///
/// Each page starts at the newest fill time seen so far (inclusive), so fills
/// sharing that millisecond are fetched again and dropped by fill key.
#[derive(Debug)]
struct FillPager {
    page_limit: usize,
    start_time: i64,
    fills: Vec<Fill>,
    seen: HashSet<String>,
}

impl FillPager {
    fn new(page_limit: usize) -> Self {
        Self {
            page_limit,
            start_time: 0,
            fills: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add one page. Returns the next start time, or `None` once a short page
    /// ends the history.
    fn push_page(&mut self, page: Vec<Fill>) -> Result<Option<i64>, DataSourceError> {
        let full = page.len() >= self.page_limit;
        let newest = page.iter().map(|f| f.time_ms.as_i64()).max();

        for fill in page {
            if self.seen.insert(fill.fill_key().to_string()) {
                self.fills.push(fill);
            }
        }

        match newest {
            Some(newest) if full => {
                if newest <= self.start_time {
                    // A whole page inside one millisecond: the cursor cannot move
                    // without skipping fills.
                    return Err(DataSourceError::Incomplete(format!(
                        "more than {} fills at time {}",
                        self.page_limit, newest
                    )));
                }
                self.start_time = newest;
                Ok(Some(newest))
            }
            _ => Ok(None),
        }
    }

    fn into_fills(self) -> Vec<Fill> {
        self.fills
    }
}

#[async_trait]
impl DataSource for HyperliquidDataSource {
    async fn fetch_fills(&self, user: &Address) -> Result<Vec<Fill>, DataSourceError> {
        debug!("Fetching fills for user={}", user);

        let mut pager = FillPager::new(self.fills_page_limit);
        loop {
            let start_time = pager.start_time;
            let payload = serde_json::json!({
                "type": "userFillsByTime",
                "user": user.as_str(),
                "startTime": start_time,
                "aggregateByTime": false,
            });

            let page = parse_fills(self.post_info(payload).await?)?;
            debug!(
                "Fetched {} fills for user={} from startTime={}",
                page.len(),
                user,
                start_time
            );
            if pager.push_page(page)?.is_none() {
                break;
            }
        }

        Ok(pager.into_fills())
    }

    async fn fetch_book(&self, coin: &Coin) -> Result<BookSnapshot, DataSourceError> {
        debug!("Fetching l2 book for coin={}", coin);

        let payload = serde_json::json!({
            "type": "l2Book",
            "coin": coin.as_str(),
        });

        let response = self.post_info(payload).await?;
        parse_book(response, coin)
    }
}

fn parse_fills(response: serde_json::Value) -> Result<Vec<Fill>, DataSourceError> {
    let raw: Vec<RawFill> = serde_json::from_value(response)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid fills response: {}", e)))?;

    raw.into_iter()
        .map(|r| r.into_fill().map_err(DataSourceError::from))
        .collect()
}

fn parse_book(response: serde_json::Value, coin: &Coin) -> Result<BookSnapshot, DataSourceError> {
    // Unknown coins come back as a bare `null`.
    if response.is_null() {
        return Err(DataSourceError::NotFound(format!("No book for {}", coin)));
    }

    let raw: RawBook = serde_json::from_value(response)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid l2Book response: {}", e)))?;

    Ok(raw.into_snapshot()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Side, TimeMs};

    #[test]
    fn test_parse_fills_valid() {
        let response = serde_json::json!([
            {
                "coin": "BTC",
                "px": "50000",
                "sz": "1",
                "side": "B",
                "time": 1000,
                "closedPnl": "0",
                "fee": "10",
                "tid": 123,
                "oid": 456
            },
            {
                "coin": "BTC",
                "px": "51000",
                "sz": "1",
                "side": "A",
                "time": 2000,
                "closedPnl": "1000",
                "fee": "10",
                "tid": 124,
                "oid": 457
            }
        ]);

        let fills = parse_fills(response).unwrap();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].side, Side::Buy);
        assert_eq!(fills[0].time_ms, TimeMs::new(1000));
        assert_eq!(fills[1].side, Side::Sell);
        assert_eq!(
            fills[1].closed_pnl,
            Decimal::from_str_canonical("1000").unwrap()
        );
    }

    #[test]
    fn test_parse_fills_fails_on_bad_record() {
        let response = serde_json::json!([
            {"coin": "BTC", "px": "1", "sz": "1", "side": "B", "time": 1},
            {"coin": "BTC", "px": "1", "sz": "1", "side": "Z", "time": 2}
        ]);
        assert!(matches!(
            parse_fills(response),
            Err(DataSourceError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_fills_rejects_non_array() {
        let response = serde_json::json!({"error": "nope"});
        assert!(matches!(
            parse_fills(response),
            Err(DataSourceError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_book_null_is_not_found() {
        let coin = Coin::new("NOPE".to_string());
        assert!(matches!(
            parse_book(serde_json::Value::Null, &coin),
            Err(DataSourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_book_valid() {
        let coin = Coin::new("ETH".to_string());
        let response = serde_json::json!({
            "coin": "ETH",
            "time": 99,
            "levels": [[{"px": "1999.5", "sz": "3", "n": 4}], [{"px": "2000.5", "sz": "1", "n": 1}]]
        });
        let book = parse_book(response, &coin).unwrap();
        assert_eq!(book.timestamp, TimeMs::new(99));
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 1);
    }

    fn page_fill(time_ms: i64, tid: i64) -> Fill {
        Fill::new(
            TimeMs::new(time_ms),
            Coin::new("BTC".to_string()),
            Side::Buy,
            Decimal::from_str_canonical("1").unwrap(),
            Decimal::from_str_canonical("1").unwrap(),
            Decimal::zero(),
            Decimal::zero(),
            Some(tid),
            None,
        )
    }

    #[test]
    fn test_fill_pager_follows_full_pages() {
        let mut pager = FillPager::new(2);
        assert_eq!(
            pager
                .push_page(vec![page_fill(10, 1), page_fill(20, 2)])
                .unwrap(),
            Some(20)
        );
        // The boundary fill comes back and is dropped.
        assert_eq!(
            pager
                .push_page(vec![page_fill(20, 2), page_fill(30, 3)])
                .unwrap(),
            Some(30)
        );
        assert_eq!(pager.push_page(vec![page_fill(30, 3)]).unwrap(), None);

        let tids: Vec<_> = pager.into_fills().iter().map(|f| f.tid).collect();
        assert_eq!(tids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_fill_pager_empty_page_ends_history() {
        let mut pager = FillPager::new(2);
        assert_eq!(pager.push_page(vec![]).unwrap(), None);
        assert!(pager.into_fills().is_empty());
    }

    #[test]
    fn test_fill_pager_stuck_cursor_is_incomplete() {
        let mut pager = FillPager::new(2);
        pager
            .push_page(vec![page_fill(5, 1), page_fill(7, 2)])
            .unwrap();
        assert!(matches!(
            pager.push_page(vec![page_fill(7, 3), page_fill(7, 4)]),
            Err(DataSourceError::Incomplete(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ds = HyperliquidDataSource::new("http://localhost:1234/".to_string());
        assert_eq!(ds.base_url, "http://localhost:1234");
        assert_eq!(ds.retry_window, DEFAULT_RETRY_WINDOW);
        assert_eq!(ds.fills_page_limit, FILLS_PAGE_LIMIT);
    }
}
