//! Search view state owned by a single controller.
//!
//! Every outgoing search is tagged with a sequence number. Only the response
//! for the most recently issued ticket is applied; older responses are
//! discarded regardless of arrival order.

use crate::catalog::SearchPage;
use crate::errors::AppError;
use crate::models::BookRecord;

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
    pub start_index: u32,
    pub page_size: u32,
    pub load_more: bool,
}

/// Accumulated results for the active query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResultPage {
    pub query: String,
    pub items: Vec<BookRecord>,
    pub total_available: u64,
    /// Upstream start index of the next page.
    pub offset: u32,
}

/// Failure shown to the user until dismissed or retried.
#[derive(Debug, Clone, PartialEq)]
struct SearchFailure {
    message: String,
    /// Request to repeat, present only when resubmitting may succeed.
    retry: Option<SearchTicket>,
}

#[derive(Debug)]
pub struct SearchSession {
    page_size: u32,
    next_seq: u64,
    latest: Option<u64>,
    in_flight: bool,
    has_more: bool,
    error: Option<SearchFailure>,
    results: SearchResultPage,
}

impl SearchSession {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            next_seq: 0,
            latest: None,
            in_flight: false,
            has_more: false,
            error: None,
            results: SearchResultPage::default(),
        }
    }

    /// Start a fresh search. Previous results are cleared immediately.
    pub fn begin_search(&mut self, query: &str) -> SearchTicket {
        self.results = SearchResultPage {
            query: query.trim().to_string(),
            ..SearchResultPage::default()
        };
        self.has_more = false;
        self.error = None;
        self.issue(0, false)
    }

    /// Request the next page of the active query, if there is one.
    pub fn begin_load_more(&mut self) -> Option<SearchTicket> {
        if self.results.query.is_empty() || !self.has_more || self.in_flight {
            return None;
        }
        self.error = None;
        Some(self.issue(self.results.offset, true))
    }

    /// Apply a successful response. Returns false if the ticket is stale.
    pub fn apply(&mut self, ticket: &SearchTicket, page: SearchPage) -> bool {
        if !self.is_latest(ticket) {
            tracing::debug!("Discarding stale search response #{}", ticket.seq);
            return false;
        }
        self.in_flight = false;

        if ticket.load_more {
            self.results.items.extend(page.books);
        } else {
            self.results.items = page.books;
        }
        self.results.total_available = page.total_items;
        self.results.offset = page.next_start_index;
        self.has_more = page.has_more;
        true
    }

    /// Record a failure for the latest ticket. Returns false if the ticket is stale.
    pub fn fail(&mut self, ticket: &SearchTicket, error: &AppError) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.in_flight = false;
        self.error = Some(SearchFailure {
            message: error.message(),
            retry: error.is_retryable().then(|| ticket.clone()),
        });
        true
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Whether the current failure offers a retry action.
    pub fn can_retry(&self) -> bool {
        self.error.as_ref().is_some_and(|f| f.retry.is_some())
    }

    /// Reissue the request that failed, under a new sequence number.
    pub fn retry(&mut self) -> Option<SearchTicket> {
        let failed = self.error.as_ref()?.retry.clone()?;
        self.error = None;
        Some(self.issue(failed.start_index, failed.load_more))
    }

    /// Forget the query and results. Responses still in flight will be discarded.
    pub fn reset(&mut self) {
        self.latest = None;
        self.in_flight = false;
        self.has_more = false;
        self.error = None;
        self.results = SearchResultPage::default();
    }

    pub fn results(&self) -> &SearchResultPage {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|f| f.message.as_str())
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn has_searched(&self) -> bool {
        !self.results.query.is_empty()
    }

    fn issue(&mut self, start_index: u32, load_more: bool) -> SearchTicket {
        self.next_seq += 1;
        self.latest = Some(self.next_seq);
        self.in_flight = true;
        SearchTicket {
            seq: self.next_seq,
            query: self.results.query.clone(),
            start_index,
            page_size: self.page_size,
            load_more,
        }
    }

    fn is_latest(&self, ticket: &SearchTicket) -> bool {
        self.latest == Some(ticket.seq)
    }
}
