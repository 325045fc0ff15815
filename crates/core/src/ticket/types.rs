//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a ticket.
///
/// Serialized by variant name ("Open" / "Closed") both on the wire and in the
/// database, so the textual form is identical everywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(TicketStatus::Open),
            "Closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

/// A support ticket.
///
/// `id`, `created_at` and `updated_at` are storage-assigned; only
/// `description` and `status` are client-mutable, and only through
/// [`TicketStore::update`](super::TicketStore::update).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Storage-assigned identifier, immutable after creation.
    pub id: i64,
    /// Freeform description, never empty.
    pub description: String,
    /// Current status; new tickets always start Open.
    pub status: TicketStatus,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update. Always >= `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// One page of tickets plus the total row count.
///
/// Ephemeral projection - derived values like `total_pages` are computed by
/// the caller, not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult {
    /// Page content, ordered by `updated_at` descending.
    pub tickets: Vec<Ticket>,
    /// Count of all tickets, not just this page.
    pub total_count: i64,
}

impl PagedResult {
    /// Number of pages needed to cover `total_count` at the given page size.
    pub fn total_pages(&self, page_size: i64) -> i64 {
        if self.total_count == 0 {
            0
        } else {
            (self.total_count + page_size - 1) / page_size
        }
    }
}
