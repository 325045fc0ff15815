//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};

use super::{
    CreateTicketRequest, PageRequest, PagedResult, Ticket, TicketError, TicketStatus, TicketStore,
    UpdateTicketRequest,
};

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Open' CHECK (status IN ('Open', 'Closed')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_updated_at ON tickets(updated_at DESC);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: i64 = row.get(0)?;
        let description: String = row.get(1)?;
        let status_str: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;
        let updated_at_str: String = row.get(4)?;

        // Parse timestamps - use current time if parsing fails (shouldn't happen with valid data)
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        // The CHECK constraint keeps this from ever holding anything else
        let status = status_str.parse().unwrap_or(TicketStatus::Open);

        Ok(Ticket {
            id,
            description,
            status,
            created_at,
            updated_at,
        })
    }

    /// Map a write failure, surfacing SQLite's own locking as a conflict.
    fn write_error(id: i64, e: rusqlite::Error) -> TicketError {
        match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::DatabaseBusy || err.code == ErrorCode::DatabaseLocked =>
            {
                TicketError::Conflict(id)
            }
            other => TicketError::Database(other.to_string()),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let now = Utc::now();
        let status = TicketStatus::Open;

        conn.execute(
            "INSERT INTO tickets (description, status, created_at, updated_at) VALUES (?, ?, ?, ?)",
            params![
                request.description,
                status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id: conn.last_insert_rowid(),
            description: request.description,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, description, status, created_at, updated_at FROM tickets WHERE id = ?",
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn list_page(&self, page: &PageRequest) -> Result<PagedResult, TicketError> {
        let conn = self.conn.lock().unwrap();

        let total_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, description, status, created_at, updated_at FROM tickets \
                 ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![page.page_size, page.offset()], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(PagedResult {
            tickets,
            total_count,
        })
    }

    fn update(&self, id: i64, request: UpdateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        // Load first so the returned ticket keeps its original created_at
        let current = conn.query_row(
            "SELECT id, description, status, created_at, updated_at FROM tickets WHERE id = ?",
            params![id],
            Self::row_to_ticket,
        );

        let current_ticket = match current {
            Ok(ticket) => ticket,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(TicketError::NotFound(id));
            }
            Err(e) => return Err(TicketError::Database(e.to_string())),
        };

        let now = Utc::now();

        conn.execute(
            "UPDATE tickets SET description = ?, status = ?, updated_at = ? WHERE id = ?",
            params![
                request.description,
                request.status.as_str(),
                now.to_rfc3339(),
                id
            ],
        )
        .map_err(|e| Self::write_error(id, e))?;

        Ok(Ticket {
            description: request.description,
            status: request.status,
            updated_at: now,
            ..current_ticket
        })
    }

    fn delete(&self, id: i64) -> Result<(), TicketError> {
        let conn = self.conn.lock().unwrap();

        let affected = conn
            .execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| Self::write_error(id, e))?;

        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }

        Ok(())
    }

    fn exists(&self, id: i64) -> Result<bool, TicketError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = ?)",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }
}
