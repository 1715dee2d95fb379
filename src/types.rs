//! Ticket, statistics and activity records as the backend serves them.
//!
//! The backend payloads are loosely typed: most fields may be missing and a
//! few (document numbers, delays) arrive as either strings or numbers. Every
//! such field is an `Option` here, and rendering code goes through the
//! accessors which fall back to [`PLACEHOLDER`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DeskError, Result};

/// Rendered in place of any missing field.
pub const PLACEHOLDER: &str = "—";

pub const VALID_STATUSES: &[&str] = &["open", "working", "closed", "satisfied"];
pub const VALID_COLORS: &[&str] = &["yellow", "orange", "red", "green"];
pub const VALID_DELAYS: &[&str] = &["all", "<24h", "24-72h", ">72h"];

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Working,
    Closed,
    Satisfied,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::Working,
        TicketStatus::Closed,
        TicketStatus::Satisfied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Working => "working",
            TicketStatus::Closed => "closed",
            TicketStatus::Satisfied => "satisfied",
        }
    }

    /// Human label used on stats cards
    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Working => "In Progress",
            TicketStatus::Closed => "Closed",
            TicketStatus::Satisfied => "Satisfied",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "working" | "in_progress" | "in-progress" => Ok(TicketStatus::Working),
            "closed" => Ok(TicketStatus::Closed),
            "satisfied" => Ok(TicketStatus::Satisfied),
            _ => Err(DeskError::InvalidStatus(s.to_string())),
        }
    }
}

/// Priority color assigned to a ticket by the backend's escalation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityColor {
    Yellow,
    Orange,
    Red,
    Green,
}

impl PriorityColor {
    pub const ALL: [PriorityColor; 4] = [
        PriorityColor::Yellow,
        PriorityColor::Orange,
        PriorityColor::Red,
        PriorityColor::Green,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityColor::Yellow => "yellow",
            PriorityColor::Orange => "orange",
            PriorityColor::Red => "red",
            PriorityColor::Green => "green",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityColor::Yellow => "Yellow",
            PriorityColor::Orange => "Orange",
            PriorityColor::Red => "Red",
            PriorityColor::Green => "Green",
        }
    }
}

impl fmt::Display for PriorityColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityColor {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yellow" => Ok(PriorityColor::Yellow),
            "orange" => Ok(PriorityColor::Orange),
            "red" => Ok(PriorityColor::Red),
            "green" => Ok(PriorityColor::Green),
            _ => Err(DeskError::InvalidColor(s.to_string())),
        }
    }
}

/// Delay bucket filter. `Any` is the "all delays" default and is never sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelayBucket {
    #[default]
    #[serde(rename = "all")]
    Any,
    #[serde(rename = "<24h")]
    Under24h,
    #[serde(rename = "24-72h")]
    Between24And72h,
    #[serde(rename = ">72h")]
    Over72h,
}

impl DelayBucket {
    /// Query parameter value, `None` for [`DelayBucket::Any`]
    pub fn wire_value(self) -> Option<&'static str> {
        match self {
            DelayBucket::Any => None,
            DelayBucket::Under24h => Some("<24h"),
            DelayBucket::Between24And72h => Some("24-72h"),
            DelayBucket::Over72h => Some(">72h"),
        }
    }

    /// Bucket a delay given in minutes. Boundaries belong to the longer bucket.
    pub fn classify(minutes: i64) -> DelayBucket {
        if minutes < MINUTES_PER_DAY {
            DelayBucket::Under24h
        } else if minutes < 3 * MINUTES_PER_DAY {
            DelayBucket::Between24And72h
        } else {
            DelayBucket::Over72h
        }
    }
}

impl fmt::Display for DelayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value().unwrap_or("all"))
    }
}

impl FromStr for DelayBucket {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "any" => Ok(DelayBucket::Any),
            "<24h" | "lt24h" => Ok(DelayBucket::Under24h),
            "24-72h" => Ok(DelayBucket::Between24And72h),
            ">72h" | "gt72h" => Ok(DelayBucket::Over72h),
            _ => Err(DeskError::InvalidDelay(s.to_string())),
        }
    }
}

/// A support ticket as returned by `/api/tickets`.
///
/// `status` and `priority` are kept as raw strings so an unexpected value from
/// the backend does not fail the whole page; use [`Ticket::status`] and
/// [`Ticket::color`] for the typed view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub ticket_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "status")]
    pub raw_status: Option<String>,
    #[serde(default, rename = "priority", alias = "color")]
    pub raw_priority: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_i64")]
    pub delay_duration_minutes: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Ticket {
    pub fn status(&self) -> Option<TicketStatus> {
        self.raw_status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn color(&self) -> Option<PriorityColor> {
        self.raw_priority.as_deref().and_then(|s| s.parse().ok())
    }

    /// Tracking identifier, ignoring blank values
    pub fn gr_no(&self) -> Option<&str> {
        self.tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn delay_bucket(&self) -> Option<DelayBucket> {
        self.delay_duration_minutes.map(DelayBucket::classify)
    }

    /// Row key: the backend id, or the ticket number for payloads without one
    pub fn row_key(&self) -> &str {
        if self.id.is_empty() {
            &self.ticket_number
        } else {
            &self.id
        }
    }

    /// Last modification time, falling back to creation time
    pub fn last_activity(&self) -> Option<jiff::Timestamp> {
        self.updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.created_at.as_deref().and_then(parse_timestamp))
    }
}

/// Sort tickets newest first by update (or creation) time; undated tickets go last.
pub fn sort_by_recent(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
}

pub fn parse_timestamp(s: &str) -> Option<jiff::Timestamp> {
    s.parse::<jiff::Timestamp>().ok()
}

/// Per-status counts over the filtered result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub open: u64,
    #[serde(default)]
    pub working: u64,
    #[serde(default)]
    pub closed: u64,
    #[serde(default)]
    pub satisfied: u64,
}

impl StatusStats {
    pub fn count(&self, status: TicketStatus) -> u64 {
        match status {
            TicketStatus::Open => self.open,
            TicketStatus::Working => self.working,
            TicketStatus::Closed => self.closed,
            TicketStatus::Satisfied => self.satisfied,
        }
    }

    pub fn sum(&self) -> u64 {
        TicketStatus::ALL.iter().map(|s| self.count(*s)).sum()
    }
}

/// Per-priority-color counts over the filtered result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorStats {
    #[serde(default)]
    pub yellow: u64,
    #[serde(default)]
    pub orange: u64,
    #[serde(default)]
    pub red: u64,
    #[serde(default)]
    pub green: u64,
}

impl ColorStats {
    pub fn count(&self, color: PriorityColor) -> u64 {
        match color {
            PriorityColor::Yellow => self.yellow,
            PriorityColor::Orange => self.orange,
            PriorityColor::Red => self.red,
            PriorityColor::Green => self.green,
        }
    }

    pub fn sum(&self) -> u64 {
        PriorityColor::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStats {
    #[serde(default, rename = "statusStats")]
    pub status: StatusStats,
    #[serde(default, rename = "colorStats")]
    pub color: ColorStats,
}

impl TicketStats {
    /// Both breakdowns must add up to the filtered total.
    pub fn is_consistent(&self, total: u64) -> bool {
        self.status.sum() == total && self.color.sum() == total
    }
}

/// One page of `/api/tickets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub stats: TicketStats,
}

/// Body of `/api/tickets/export`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportResult {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

/// One entry in a consignment's activity timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub documentno: Option<String>,
}

impl ActivityRecord {
    pub fn label(&self) -> &str {
        or_placeholder(self.activity.as_deref())
    }

    pub fn date(&self) -> &str {
        or_placeholder(self.date.as_deref())
    }

    pub fn details(&self) -> &str {
        or_placeholder(self.details.as_deref())
    }

    pub fn document_no(&self) -> Option<&str> {
        self.documentno.as_deref().filter(|s| !s.is_empty())
    }
}

/// Body of `/api/consignments/:grNo`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsignmentResponse {
    #[serde(default, rename = "trackingRaw")]
    pub tracking_raw: Option<TrackingRaw>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingRaw {
    #[serde(default, deserialize_with = "deserialize_activity_list")]
    pub consignmentactivitylist: Vec<ActivityRecord>,
}

impl ConsignmentResponse {
    pub fn into_activities(self) -> Vec<ActivityRecord> {
        self.tracking_raw
            .map(|raw| raw.consignmentactivitylist)
            .unwrap_or_default()
    }
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

fn deserialize_loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_loose_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A `null` activity list is treated as empty.
fn deserialize_activity_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<ActivityRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ActivityRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
