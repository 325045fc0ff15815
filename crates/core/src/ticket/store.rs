//! Ticket storage trait and types.

use thiserror::Error;

use crate::ticket::{PagedResult, Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// No ticket with this id.
    #[error("Ticket not found: {0}")]
    NotFound(i64),

    /// A concurrent writer held the row; the caller decides whether the row
    /// still exists.
    #[error("Write conflict on ticket {0}")]
    Conflict(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new ticket.
///
/// Status and timestamps are always server-assigned, so the description is
/// the only client-supplied field.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    pub description: String,
}

/// Client-mutable fields for an update.
#[derive(Debug, Clone)]
pub struct UpdateTicketRequest {
    pub description: String,
    pub status: TicketStatus,
}

/// A one-based page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-based page number.
    pub page_number: i64,
    /// Rows per page.
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Row offset of the first ticket on this page.
    pub fn offset(&self) -> i64 {
        (self.page_number - 1) * self.page_size
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket with status Open and fresh timestamps.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by id.
    fn get(&self, id: i64) -> Result<Option<Ticket>, TicketError>;

    /// List one page of tickets, most recently updated first, along with the
    /// total row count. Out-of-range pages return an empty page.
    fn list_page(&self, page: &PageRequest) -> Result<PagedResult, TicketError>;

    /// Overwrite description and status, refreshing `updated_at`.
    fn update(&self, id: i64, request: UpdateTicketRequest) -> Result<Ticket, TicketError>;

    /// Permanently delete a ticket.
    fn delete(&self, id: i64) -> Result<(), TicketError>;

    /// Check whether a ticket exists, without loading it.
    fn exists(&self, id: i64) -> Result<bool, TicketError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(2, 10).offset(), 10);
        assert_eq!(PageRequest::new(3, 7).offset(), 14);
    }
}
