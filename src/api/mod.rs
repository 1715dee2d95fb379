//! Backend access for the ticket list and consignment timelines.
//!
//! The view and its helpers talk to the backend only through
//! [`TicketSource`], so tests can substitute a scripted source.

pub mod error;
pub mod http;

use std::future::Future;

use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::types::{ActivityRecord, PageResult, Ticket};

pub use error::ApiError;
pub use http::HttpTicketSource;

/// One `/api/tickets` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub criteria: FilterCriteria,
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(criteria: FilterCriteria, page: u32, limit: u32) -> Self {
        Self {
            criteria,
            page,
            limit,
        }
    }

    /// Query parameters: `page` and `limit` first, then the filter fields.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        pairs.extend(self.criteria.query_pairs());
        pairs
    }
}

/// Common interface for ticket backends
pub trait TicketSource: Send + Sync {
    /// Fetch one filtered page plus the server-computed statistics
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResult>> + Send;

    /// Fetch the activity timeline for a tracking identifier
    fn fetch_activity(
        &self,
        gr_no: &str,
    ) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send;

    /// Fetch every ticket matching `criteria`, up to `limit`
    fn export(
        &self,
        criteria: &FilterCriteria,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Ticket>>> + Send;
}

/// Export the full filtered set: one page request to learn the total, then
/// an export request sized to it.
pub async fn export_all<S: TicketSource>(
    source: &S,
    criteria: &FilterCriteria,
) -> Result<Vec<Ticket>> {
    let probe = source
        .fetch_page(&PageRequest::new(criteria.clone(), 1, 1))
        .await?;
    if probe.total == 0 {
        return Ok(Vec::new());
    }
    source.export(criteria, probe.total).await
}
