//! `GET /api/tickets`.

use {
    axum::{
        extract::{Query, State},
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use {
    ticketscope_portal::{RequestError, ScrapeRequest},
    ticketscope_records::TicketRecord,
};

use crate::state::AppState;

/// Raw query string parameters; all four are required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQuery {
    pub ticket_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub radio: Option<String>,
}

impl TicketQuery {
    /// Validate into a [`ScrapeRequest`]. A parameter that is absent or blank
    /// is reported as [`RequestError::Missing`].
    pub fn into_request(self) -> Result<ScrapeRequest, RequestError> {
        let ticket_type = required("ticketType", self.ticket_type)?;
        let start_date = required("startDate", self.start_date)?;
        let end_date = required("endDate", self.end_date)?;
        let radio = required("radio", self.radio)?;
        ScrapeRequest::parse(&ticket_type, &start_date, &end_date, &radio)
    }
}

/// Success body. Serialized directly so each record keeps its column order.
#[derive(Debug, Serialize)]
struct TicketsResponse {
    success: bool,
    data: Vec<TicketRecord>,
}

fn required(name: &'static str, value: Option<String>) -> Result<String, RequestError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(RequestError::Missing(name))
}

pub async fn tickets_handler(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> Response {
    let request = match query.into_request() {
        Ok(request) => request,
        Err(RequestError::Missing(param)) => {
            debug!(param, "rejected ticket query");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Missing query parameters" })),
            )
                .into_response();
        },
        Err(e) => {
            debug!(error = %e, "rejected ticket query");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid query parameters",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        },
    };

    match state.source.fetch(&request).await {
        Ok(records) => Json(TicketsResponse {
            success: true,
            data: records,
        })
        .into_response(),
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "ticket query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Scraping failed",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        },
    }
}
