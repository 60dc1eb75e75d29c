//! Person REST API Routes
//!
//! Validation always runs before a command is published: a 400 here is a
//! pure no-op. Reads are served from the cache and never block on the
//! worker; writes block on the correlated worker response and return it
//! verbatim (HTTP status = envelope code).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use motorid_channel::{Command, CommandBus, ResponseMessage};
use motorid_core::{Person, PersonDraft, ViewUpdate};

use crate::{
    error::{ApiError, ApiResult},
    state::SharedCache,
    types::{RefreshRequest, SetVerifiedRequest},
    validation::{ValidateNonEmpty, ValidateNonEmptyList},
};

/// Render a worker response verbatim: its code becomes the HTTP status,
/// its data or message becomes the JSON body.
fn worker_response(response: ResponseMessage) -> Response {
    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.data {
        Some(data) => (status, Json(data)).into_response(),
        None => {
            let message = response.message.unwrap_or_default();
            (status, Json(serde_json::json!({ "message": message }))).into_response()
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/persons - batch create-or-merge
#[utoipa::path(
    post,
    path = "/api/v1/persons",
    tag = "Persons",
    request_body = Vec<PersonDraft>,
    responses(
        (status = 200, description = "Per-record summaries, in input order"),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "identity_no raced with another writer", body = ApiError),
    )
)]
pub async fn create_person(
    State(bus): State<CommandBus>,
    Json(drafts): Json<Vec<PersonDraft>>,
) -> ApiResult<Response> {
    drafts.validate_non_empty_list("people")?;
    for (i, draft) in drafts.iter().enumerate() {
        draft.name.validate_non_empty(&format!("people[{i}].name"))?;
        draft
            .identity_no
            .validate_non_empty(&format!("people[{i}].identity_no"))?;
    }

    let response = bus.dispatch(Command::CreatePerson { drafts }).await?;
    Ok(worker_response(response))
}

/// GET /api/v1/persons/{id} - cache-only lookup
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}",
    tag = "Persons",
    params(
        ("id" = Uuid, Path, description = "Person ID")
    ),
    responses(
        (status = 200, description = "Full person snapshot", body = Person),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Person not found", body = ApiError),
    )
)]
pub async fn get_person(
    State(cache): State<SharedCache>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Person>> {
    let person = cache
        .get(id)
        .await
        .map_err(|e| ApiError::internal_error(format!("Cache error: {e}")))?
        .ok_or_else(|| ApiError::person_not_found(id))?;
    Ok(Json(person))
}

/// POST /api/v1/persons/views - attach document images
#[utoipa::path(
    post,
    path = "/api/v1/persons/views",
    tag = "Persons",
    request_body = Vec<ViewUpdate>,
    responses(
        (status = 200, description = "List of updated ids"),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Unknown pid", body = ApiError),
    )
)]
pub async fn update_views(
    State(bus): State<CommandBus>,
    Json(updates): Json<Vec<ViewUpdate>>,
) -> ApiResult<Response> {
    updates.validate_non_empty_list("updates")?;
    for (i, update) in updates.iter().enumerate() {
        if !update.has_any_view() {
            return Err(ApiError::invalid_input(format!(
                "updates[{i}] must set at least one view field"
            )));
        }
    }

    let response = bus.dispatch(Command::UpdateViews { updates }).await?;
    Ok(worker_response(response))
}

/// POST /api/v1/persons/verification - set the verified flag
#[utoipa::path(
    post,
    path = "/api/v1/persons/verification",
    tag = "Persons",
    request_body = SetVerifiedRequest,
    responses(
        (status = 200, description = "Flag updated"),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Unknown identity_no", body = ApiError),
    )
)]
pub async fn set_verified(
    State(bus): State<CommandBus>,
    Json(req): Json<SetVerifiedRequest>,
) -> ApiResult<Response> {
    req.identity_no.validate_non_empty("identity_no")?;

    let response = bus
        .dispatch(Command::SetVerified {
            identity_no: req.identity_no,
            flag: req.flag,
        })
        .await?;
    Ok(worker_response(response))
}

/// POST /api/v1/persons/refresh - on-demand cache refresh
#[utoipa::path(
    post,
    path = "/api/v1/persons/refresh",
    tag = "Persons",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Cache refreshed"),
        (status = 500, description = "Refresh failed", body = ApiError),
    )
)]
pub async fn refresh(
    State(bus): State<CommandBus>,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Response> {
    let id = body.and_then(|Json(req)| req.id);
    let response = bus.dispatch(Command::Refresh { id }).await?;
    Ok(worker_response(response))
}
