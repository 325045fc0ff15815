//! Ticket model and storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{
    CreateTicketRequest, PageRequest, TicketError, TicketStore, UpdateTicketRequest,
};
pub use types::{PagedResult, Ticket, TicketStatus};
