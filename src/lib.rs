pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detail;
pub mod display;
pub mod error;
pub mod filter;
pub mod list;
pub mod logging;
pub mod pagination;
pub mod stats;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{HttpTicketSource, PageRequest, TicketSource};
pub use config::Config;
pub use detail::{DetailCache, DetailQueue};
pub use error::{DeskError, Result};
pub use filter::{FilterCriteria, FilterPipeline};
pub use list::{FetchState, ListController};
pub use pagination::Pagination;
pub use types::{ActivityRecord, DelayBucket, PriorityColor, Ticket, TicketStatus};
pub use view::{TicketView, ViewAction, ViewConfig};
