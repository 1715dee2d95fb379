//! In-memory [`TicketSource`] for unit tests.
//!
//! Filters, counts and paginates like the backend does, and records every
//! call so tests can assert on request counts and fetch concurrency.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::api::{PageRequest, TicketSource};
use crate::error::{DeskError, Result};
use crate::filter::FilterCriteria;
use crate::types::{
    ActivityRecord, ColorStats, PageResult, PriorityColor, StatusStats, Ticket, TicketStats,
    TicketStatus,
};

#[derive(Default)]
pub(crate) struct ScriptedSource {
    tickets: Mutex<Vec<Ticket>>,
    timelines: Mutex<HashMap<String, Vec<ActivityRecord>>>,
    failing_activity: Mutex<HashSet<String>>,
    fail_pages: AtomicBool,
    page_delays: Mutex<VecDeque<Duration>>,
    activity_gate: Option<Arc<Semaphore>>,

    page_requests: Mutex<Vec<PageRequest>>,
    activity_requests: Mutex<Vec<String>>,
    active_fetches: AtomicUsize,
    max_active_fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets: Mutex::new(tickets),
            ..Default::default()
        }
    }

    /// Activity fetches wait for a permit from `gate`; each fetch consumes one.
    pub fn with_activity_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.activity_gate = Some(gate);
        self
    }

    pub fn with_timeline(self, gr_no: &str, records: usize) -> Self {
        self.timelines
            .lock()
            .insert(gr_no.to_string(), activity_records(records));
        self
    }

    pub fn set_tickets(&self, tickets: Vec<Ticket>) {
        *self.tickets.lock() = tickets;
    }

    pub fn set_fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activity(&self, gr_no: &str) {
        self.failing_activity.lock().insert(gr_no.to_string());
    }

    pub fn heal_activity(&self, gr_no: &str) {
        self.failing_activity.lock().remove(gr_no);
    }

    /// Delay the next page responses, in request order
    pub fn push_page_delay(&self, delay: Duration) {
        self.page_delays.lock().push_back(delay);
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.page_requests.lock().clone()
    }

    pub fn page_calls(&self) -> usize {
        self.page_requests.lock().len()
    }

    pub fn activity_calls(&self) -> usize {
        self.activity_requests.lock().len()
    }

    pub fn activity_calls_for(&self, gr_no: &str) -> usize {
        self.activity_requests
            .lock()
            .iter()
            .filter(|k| k.as_str() == gr_no)
            .count()
    }

    pub fn activity_order(&self) -> Vec<String> {
        self.activity_requests.lock().clone()
    }

    pub fn max_active_fetches(&self) -> usize {
        self.max_active_fetches.load(Ordering::SeqCst)
    }

    fn page(&self, request: &PageRequest) -> PageResult {
        let matching: Vec<Ticket> = self
            .tickets
            .lock()
            .iter()
            .filter(|t| matches_criteria(t, &request.criteria))
            .cloned()
            .collect();

        let mut status = StatusStats {
            total: matching.len() as u64,
            ..Default::default()
        };
        let mut color = ColorStats::default();
        for ticket in &matching {
            match ticket.status() {
                Some(TicketStatus::Open) => status.open += 1,
                Some(TicketStatus::Working) => status.working += 1,
                Some(TicketStatus::Closed) => status.closed += 1,
                Some(TicketStatus::Satisfied) => status.satisfied += 1,
                None => {}
            }
            match ticket.color() {
                Some(PriorityColor::Yellow) => color.yellow += 1,
                Some(PriorityColor::Orange) => color.orange += 1,
                Some(PriorityColor::Red) => color.red += 1,
                Some(PriorityColor::Green) => color.green += 1,
                None => {}
            }
        }

        let limit = request.limit.max(1) as usize;
        let skip = (request.page.max(1) as usize - 1) * limit;
        PageResult {
            total: matching.len() as u64,
            tickets: matching.into_iter().skip(skip).take(limit).collect(),
            stats: TicketStats { status, color },
        }
    }
}

impl TicketSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult> {
        self.page_requests.lock().push(request.clone());
        let delay = self.page_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(DeskError::Api("503 Service Unavailable".to_string()));
        }
        Ok(self.page(request))
    }

    async fn fetch_activity(&self, gr_no: &str) -> Result<Vec<ActivityRecord>> {
        self.activity_requests.lock().push(gr_no.to_string());
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_fetches.fetch_max(active, Ordering::SeqCst);

        if let Some(gate) = &self.activity_gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }

        self.active_fetches.fetch_sub(1, Ordering::SeqCst);
        if self.failing_activity.lock().contains(gr_no) {
            return Err(DeskError::Api("502 Bad Gateway".to_string()));
        }
        Ok(self
            .timelines
            .lock()
            .get(gr_no)
            .cloned()
            .unwrap_or_default())
    }

    async fn export(&self, criteria: &FilterCriteria, limit: u64) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.lock();
        Ok(tickets
            .iter()
            .filter(|t| matches_criteria(t, criteria))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

fn matches_criteria(ticket: &Ticket, criteria: &FilterCriteria) -> bool {
    if criteria.status.is_some() && ticket.status() != criteria.status {
        return false;
    }
    if criteria.color.is_some() && ticket.color() != criteria.color {
        return false;
    }
    if !contains(ticket.origin.as_deref(), &criteria.origin)
        || !contains(ticket.destination.as_deref(), &criteria.destination)
    {
        return false;
    }
    if criteria.delay.wire_value().is_some() && ticket.delay_bucket() != Some(criteria.delay) {
        return false;
    }
    let search = criteria.search.trim().to_lowercase();
    search.is_empty()
        || [
            Some(ticket.ticket_number.as_str()),
            Some(ticket.title.as_str()),
            ticket.tracking_number.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&search))
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty() || field.is_some_and(|f| f.to_lowercase().contains(&needle))
}

pub(crate) fn activity_records(n: usize) -> Vec<ActivityRecord> {
    (0..n)
        .map(|i| ActivityRecord {
            activity: Some(format!("Scan {}", i + 1)),
            date: Some(format!("2024-03-{:02}", i + 1)),
            details: Some("Hub".to_string()),
            documentno: None,
        })
        .collect()
}

/// `count` tickets cycling through every status and color, numbered from 1.
pub(crate) fn sample_tickets(count: usize) -> Vec<Ticket> {
    const STATUSES: [&str; 4] = ["open", "working", "closed", "satisfied"];
    const COLORS: [&str; 4] = ["yellow", "orange", "red", "green"];
    (0..count)
        .map(|i| Ticket {
            id: format!("id-{}", i + 1),
            ticket_number: format!("TKT-{:03}", i + 1),
            title: format!("Shipment issue {}", i + 1),
            raw_status: Some(STATUSES[i % 4].to_string()),
            raw_priority: Some(COLORS[(i / 4) % 4].to_string()),
            tracking_number: Some(format!("GRL-{:05}", i + 1)),
            origin: Some(if i % 2 == 0 { "Delhi" } else { "Mumbai" }.to_string()),
            destination: Some("Pune".to_string()),
            delay_duration_minutes: Some((i as i64) * 500),
            ..Default::default()
        })
        .collect()
}
