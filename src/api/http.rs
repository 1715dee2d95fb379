//! `reqwest`-backed [`TicketSource`] for the dashboard backend.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{DeskError, Result};
use crate::filter::FilterCriteria;
use crate::types::{ActivityRecord, ConsignmentResponse, ExportResult, PageResult, Ticket};

use super::{ApiError, PageRequest, TicketSource};

/// HTTP client for `/api/tickets` and `/api/consignments`
#[derive(Debug, Clone)]
pub struct HttpTicketSource {
    client: Client,
    base_url: Url,
}

impl HttpTicketSource {
    /// Create a client for `base_url` with a total request timeout.
    ///
    /// The timeout is the only bound on a hung request; callers do not cancel.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DeskError::Config(format!(
                "API URL '{base_url}' cannot be used as a base URL"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DeskError::Config(format!("invalid API URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn tickets_url(&self, request: &PageRequest) -> Result<Url> {
        let mut url = self.endpoint(&["api", "tickets"])?;
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        Ok(url)
    }

    pub(crate) fn export_url(&self, criteria: &FilterCriteria, limit: u64) -> Result<Url> {
        let mut url = self.endpoint(&["api", "tickets", "export"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .extend_pairs(criteria.query_pairs());
        Ok(url)
    }

    pub(crate) fn consignment_url(&self, gr_no: &str) -> Result<Url> {
        let gr_no = gr_no.trim();
        if gr_no.is_empty() {
            return Err(DeskError::InvalidInput(
                "tracking number cannot be empty".to_string(),
            ));
        }
        self.endpoint(&["api", "consignments", gr_no])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_response(status, &headers, &body).into());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl TicketSource for HttpTicketSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult> {
        let url = self.tickets_url(request)?;
        self.get_json(url).await
    }

    async fn fetch_activity(&self, gr_no: &str) -> Result<Vec<ActivityRecord>> {
        let url = self.consignment_url(gr_no)?;
        let response: ConsignmentResponse = self.get_json(url).await?;
        Ok(response.into_activities())
    }

    async fn export(&self, criteria: &FilterCriteria, limit: u64) -> Result<Vec<Ticket>> {
        let url = self.export_url(criteria, limit)?;
        let response: ExportResult = self.get_json(url).await?;
        Ok(response.tickets)
    }
}
