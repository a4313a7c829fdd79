//! Feed channels and pull pagination
//!
//! A running strategy produces ten independent feeds. The tester pulls them
//! page by page; each response reports, per channel, the index the next pull
//! should start from. `FeedsRequest` is an immutable value: the successor
//! request is derived from the previous one plus the response it produced.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as JsonValue;

use super::RunId;
use super::status::LifeCycleStatus;

/// Page length used to request "everything that is left"
pub const UNBOUNDED_LENGTH: i64 = i32::MAX as i64;

/// Default page length for the regular polling requests
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// One of the feed channels exposed by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedChannel {
    Portfolios,
    BenchmarkPortfolios,
    Positions,
    Risks,
    Trades,
    Orders,
    Logs,
    Plots,
    PortfolioGrids,
    RiskGrids,
}

impl FeedChannel {
    pub const ALL: [FeedChannel; 10] = [
        FeedChannel::Portfolios,
        FeedChannel::BenchmarkPortfolios,
        FeedChannel::Positions,
        FeedChannel::Risks,
        FeedChannel::Trades,
        FeedChannel::Orders,
        FeedChannel::Logs,
        FeedChannel::Plots,
        FeedChannel::PortfolioGrids,
        FeedChannel::RiskGrids,
    ];

    /// Channels subscribed by the first pull of every run
    pub const INITIAL: [FeedChannel; 5] = [
        FeedChannel::Portfolios,
        FeedChannel::BenchmarkPortfolios,
        FeedChannel::Positions,
        FeedChannel::Risks,
        FeedChannel::Trades,
    ];

    /// Key used in both the request `feeds-params` and the response `results`
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Portfolios => "portfolios",
            Self::BenchmarkPortfolios => "benchmark-portfolios",
            Self::Positions => "positions",
            Self::Risks => "risks",
            Self::Trades => "trades",
            Self::Orders => "orders",
            Self::Logs => "logs",
            Self::Plots => "plots",
            Self::PortfolioGrids => "portfolio-grids",
            Self::RiskGrids => "risk-grids",
        }
    }

    /// Portfolio the channel is addressed to
    pub fn portfolio_name(self) -> &'static str {
        match self {
            Self::BenchmarkPortfolios => "b",
            _ => "p",
        }
    }

    /// Array key inside a paged slice; grids come back as bare arrays
    pub fn slice_key(self) -> Option<&'static str> {
        match self {
            Self::Portfolios | Self::BenchmarkPortfolios => Some("Portfolios"),
            Self::Positions => Some("Positions"),
            Self::Risks => Some("PortfolioRisks"),
            Self::Trades => Some("Trades"),
            Self::Orders => Some("Orders"),
            Self::Logs => Some("Logs"),
            Self::Plots => Some("Plots"),
            Self::PortfolioGrids | Self::RiskGrids => None,
        }
    }

    pub fn is_grid(self) -> bool {
        self.slice_key().is_none()
    }
}

impl fmt::Display for FeedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

/// Requested window of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start_index: i64,
    pub length: i64,
}

impl PageRequest {
    pub fn new(start_index: i64, length: i64) -> Self {
        Self {
            start_index,
            length,
        }
    }
}

/// A pull request for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedsRequest {
    run_id: RunId,
    pages: BTreeMap<FeedChannel, PageRequest>,
}

impl FeedsRequest {
    /// Empty request for `run_id`
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            pages: BTreeMap::new(),
        }
    }

    /// First pull of a run: the first five channels from index 0
    pub fn initial(run_id: RunId, page_size: i64) -> Self {
        FeedChannel::INITIAL
            .iter()
            .fold(Self::new(run_id), |req, &channel| {
                req.with_page(channel, PageRequest::new(0, page_size))
            })
    }

    /// Returns a copy with `channel` subscribed at `page`
    pub fn with_page(mut self, channel: FeedChannel, page: PageRequest) -> Self {
        self.pages.insert(channel, page);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn page(&self, channel: FeedChannel) -> Option<&PageRequest> {
        self.pages.get(&channel)
    }

    /// Subscribed channels with their windows, in channel order
    pub fn pages(&self) -> impl Iterator<Item = (FeedChannel, &PageRequest)> {
        self.pages.iter().map(|(channel, page)| (*channel, page))
    }

    /// The follow-up pull for a still running strategy
    ///
    /// Every subscribed channel restarts from the server-reported next index
    /// (or 0 when absent or negative) with its previous page length.
    pub fn next_request(&self, returns: &FeedsReturns) -> Self {
        let pages = self
            .pages
            .iter()
            .map(|(&channel, page)| {
                (
                    channel,
                    PageRequest::new(returns.resume_index(channel), page.length),
                )
            })
            .collect();

        Self {
            run_id: self.run_id,
            pages,
        }
    }

    /// The final pull after `NormalExit`, fetching whatever was not pulled yet
    ///
    /// Grid channels are only produced by full runs, so they are requested
    /// from the start when `include_grids` is set.
    pub fn drain_request(&self, returns: &FeedsReturns, include_grids: bool) -> Self {
        let mut pages: BTreeMap<FeedChannel, PageRequest> = self
            .pages
            .keys()
            .filter(|channel| !channel.is_grid())
            .map(|&channel| {
                (
                    channel,
                    PageRequest::new(returns.resume_index(channel), UNBOUNDED_LENGTH),
                )
            })
            .collect();

        if include_grids {
            pages.insert(
                FeedChannel::RiskGrids,
                PageRequest::new(0, UNBOUNDED_LENGTH),
            );
            pages.insert(
                FeedChannel::PortfolioGrids,
                PageRequest::new(0, UNBOUNDED_LENGTH),
            );
        }

        Self {
            run_id: self.run_id,
            pages,
        }
    }
}

/// One channel's part of a pull response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSlice {
    pub next_index: Option<i64>,
    pub feeds: Vec<JsonValue>,
}

/// Everything a pull response carried
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedsReturns {
    pub status: Option<String>,
    pub slices: BTreeMap<FeedChannel, FeedSlice>,
}

impl FeedsReturns {
    /// Parsed lifecycle; a response without status counts as still running
    pub fn lifecycle(&self) -> LifeCycleStatus {
        match &self.status {
            Some(raw) => LifeCycleStatus::parse(raw),
            None => LifeCycleStatus::Running(String::new()),
        }
    }

    pub fn slice(&self, channel: FeedChannel) -> Option<&FeedSlice> {
        self.slices.get(&channel)
    }

    /// Where the next pull of `channel` has to start
    pub fn resume_index(&self, channel: FeedChannel) -> i64 {
        self.slices
            .get(&channel)
            .and_then(|slice| slice.next_index)
            .filter(|index| *index >= 0)
            .unwrap_or(0)
    }

    /// Total number of feed items in this response
    pub fn feed_count(&self) -> usize {
        self.slices.values().map(|slice| slice.feeds.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns_with(entries: &[(FeedChannel, Option<i64>)]) -> FeedsReturns {
        let mut returns = FeedsReturns {
            status: Some("Running".to_string()),
            ..Default::default()
        };
        for (channel, next_index) in entries {
            returns.slices.insert(
                *channel,
                FeedSlice {
                    next_index: *next_index,
                    feeds: Vec::new(),
                },
            );
        }
        returns
    }

    #[test]
    fn test_initial_request_subscribes_first_five_channels() {
        let req = FeedsRequest::initial(42, DEFAULT_PAGE_SIZE);
        let channels: Vec<_> = req.pages().map(|(c, _)| c).collect();
        assert_eq!(channels, FeedChannel::INITIAL.to_vec());
        assert!(req.pages().all(|(_, p)| *p == PageRequest::new(0, 100)));
        assert_eq!(req.run_id(), 42);
    }

    #[test]
    fn test_next_request_follows_next_index() {
        let req = FeedsRequest::initial(1, 100);
        let returns = returns_with(&[
            (FeedChannel::Portfolios, Some(12)),
            (FeedChannel::Trades, Some(3)),
        ]);

        let next = req.next_request(&returns);
        assert_eq!(
            next.page(FeedChannel::Portfolios),
            Some(&PageRequest::new(12, 100))
        );
        assert_eq!(
            next.page(FeedChannel::Trades),
            Some(&PageRequest::new(3, 100))
        );
        // channels absent from the response restart at 0
        assert_eq!(
            next.page(FeedChannel::Positions),
            Some(&PageRequest::new(0, 100))
        );
        assert_ne!(next, req);
    }

    #[test]
    fn test_negative_next_index_restarts_at_zero() {
        let req = FeedsRequest::initial(1, 100);
        let returns = returns_with(&[(FeedChannel::Risks, Some(-1))]);
        let next = req.next_request(&returns);
        assert_eq!(next.page(FeedChannel::Risks), Some(&PageRequest::new(0, 100)));
        assert_eq!(next, req);
    }

    #[test]
    fn test_next_request_keeps_page_length() {
        let req = FeedsRequest::new(9).with_page(FeedChannel::Logs, PageRequest::new(0, 7));
        let returns = returns_with(&[(FeedChannel::Logs, Some(7))]);
        let next = req.next_request(&returns);
        assert_eq!(next.page(FeedChannel::Logs), Some(&PageRequest::new(7, 7)));
        assert_eq!(next.pages().count(), 1);
    }

    #[test]
    fn test_drain_request_with_grids() {
        let req = FeedsRequest::initial(5, 100);
        let returns = returns_with(&[(FeedChannel::Positions, Some(40))]);
        let drain = req.drain_request(&returns, true);

        assert_eq!(
            drain.page(FeedChannel::Positions),
            Some(&PageRequest::new(40, UNBOUNDED_LENGTH))
        );
        assert_eq!(
            drain.page(FeedChannel::Portfolios),
            Some(&PageRequest::new(0, UNBOUNDED_LENGTH))
        );
        assert_eq!(
            drain.page(FeedChannel::PortfolioGrids),
            Some(&PageRequest::new(0, UNBOUNDED_LENGTH))
        );
        assert_eq!(
            drain.page(FeedChannel::RiskGrids),
            Some(&PageRequest::new(0, UNBOUNDED_LENGTH))
        );
        assert_eq!(drain.pages().count(), 7);
    }

    #[test]
    fn test_drain_request_without_grids() {
        let req = FeedsRequest::initial(5, 100);
        let drain = req.drain_request(&FeedsReturns::default(), false);
        assert!(drain.page(FeedChannel::PortfolioGrids).is_none());
        assert!(drain.page(FeedChannel::RiskGrids).is_none());
        assert_eq!(drain.pages().count(), 5);
    }

    #[test]
    fn test_missing_status_is_running() {
        assert_eq!(FeedsReturns::default().lifecycle().terminal(), None);
    }

    #[test]
    fn test_channel_wire_names() {
        assert_eq!(FeedChannel::BenchmarkPortfolios.portfolio_name(), "b");
        assert_eq!(FeedChannel::Trades.portfolio_name(), "p");
        assert_eq!(FeedChannel::Risks.slice_key(), Some("PortfolioRisks"));
        assert!(FeedChannel::RiskGrids.is_grid());
        assert_eq!(FeedChannel::ALL.len(), 10);
    }
}
