//! Ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tickets_core::{
    CreateTicketRequest, PageRequest, Ticket, TicketError, TicketStatus, UpdateTicketRequest,
};

use crate::state::AppState;

/// Default page number for ticket listings
const DEFAULT_PAGE_NUMBER: i64 = 1;

/// Default page size for ticket listings
const DEFAULT_PAGE_SIZE: i64 = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket.
///
/// Fields are optional so missing ones surface as 400s with a descriptive
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketBody {
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
}

/// Request body for updating a ticket. Unknown fields (e.g. timestamps echoed
/// back by the client) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketBody {
    pub id: Option<i64>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsParams {
    /// 1-based page number
    pub page_number: Option<i64>,
    /// Tickets per page
    pub page_size: Option<i64>,
}

/// Wire representation of a ticket
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: i64,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            description: ticket.description,
            status: ticket.status,
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsResponse {
    pub data: Vec<TicketResponse>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata attached to every listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_count: i64,
    pub page_size: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

fn internal_error(e: TicketError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(TicketErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// List tickets, one page at a time, most recently updated first
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Response {
    let page_number = params.page_number.unwrap_or(DEFAULT_PAGE_NUMBER);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page_number < 1 || page_size < 1 {
        return (
            StatusCode::BAD_REQUEST,
            "Page number and page size must be greater than zero.",
        )
            .into_response();
    }

    let page = PageRequest::new(page_number, page_size);

    match state.ticket_store().list_page(&page) {
        Ok(result) => {
            let pagination = PaginationMeta {
                total_count: result.total_count,
                page_size,
                current_page: page_number,
                total_pages: result.total_pages(page_size),
            };

            Json(ListTicketsResponse {
                data: result.tickets.into_iter().map(TicketResponse::from).collect(),
                pagination,
            })
            .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// Get a ticket by id
pub async fn get_ticket(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.ticket_store().get(id) {
        Ok(Some(ticket)) => Json(TicketResponse::from(ticket)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Response {
    let description = match body.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => {
            return (StatusCode::BAD_REQUEST, "The description field is required.")
                .into_response();
        }
    };

    // Status must be present, but new tickets always start Open regardless of
    // the submitted value
    if body.status.is_none() {
        return (StatusCode::BAD_REQUEST, "The status field is required.").into_response();
    }

    match state.ticket_store().create(CreateTicketRequest { description }) {
        Ok(ticket) => {
            let location = format!("/api/tickets/{}", ticket.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(TicketResponse::from(ticket)),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// Update a ticket's description and status
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTicketBody>,
) -> Response {
    if body.id != Some(id) {
        return (StatusCode::BAD_REQUEST, "Path id and ticket id do not match.").into_response();
    }

    let description = match body.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => {
            return (StatusCode::BAD_REQUEST, "The description field is required.")
                .into_response();
        }
    };

    let status = match body.status {
        Some(status) => status,
        None => {
            return (StatusCode::BAD_REQUEST, "The status field is required.").into_response();
        }
    };

    match state
        .ticket_store()
        .update(id, UpdateTicketRequest { description, status })
    {
        Ok(_) => (StatusCode::OK, "Updated successfully").into_response(),
        Err(TicketError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(TicketError::Conflict(_)) => {
            // A concurrent writer got in the way; if the row is gone the
            // conflict was a delete
            match state.ticket_store().exists(id) {
                Ok(false) => StatusCode::NOT_FOUND.into_response(),
                Ok(true) => (
                    StatusCode::CONFLICT,
                    Json(TicketErrorResponse {
                        error: format!("Ticket {} was modified concurrently", id),
                    }),
                )
                    .into_response(),
                Err(e) => internal_error(e),
            }
        }
        Err(e) => internal_error(e),
    }
}

/// Delete a ticket
pub async fn delete_ticket(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.ticket_store().exists(id) {
        Ok(true) => {}
        Ok(false) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal_error(e),
    }

    match state.ticket_store().delete(id) {
        Ok(()) => (StatusCode::OK, "Deleted successfully").into_response(),
        // Deleted by someone else between the check and the delete
        Err(TicketError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}
