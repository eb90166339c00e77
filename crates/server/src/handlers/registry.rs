//! Mirror client registry management.

use super::mirror::read_body;
use crate::auth::require_admin;
use crate::backup::{parse_backup, render_backup};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use granary_core::{MIRROR_CLIENTS_GROUP, UserId};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct MirrorerList {
    pub user_ids: Vec<Uuid>,
}

fn parse_user_id(raw: &str) -> ApiResult<Uuid> {
    let id = UserId::parse(raw)
        .map_err(|_| ApiError::BadRequest(format!("invalid user id: {raw}")))?;
    Ok(*id.as_uuid())
}

/// GET /v1/mirrorers
#[instrument(skip(state, req))]
pub async fn list_mirrorers(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<MirrorerList>> {
    require_admin(&req)?;
    let members = state.metadata.group_members(MIRROR_CLIENTS_GROUP).await?;
    Ok(Json(MirrorerList {
        user_ids: members.into_iter().map(|m| m.user_id).collect(),
    }))
}

/// PUT /v1/mirrorers/{user_id}
///
/// Idempotent: authorizing an already-authorized client is a no-op.
#[instrument(skip(state, req), fields(user_id = %user_id))]
pub async fn add_mirrorer(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    require_admin(&req)?;
    let user_id = parse_user_id(&user_id)?;
    state
        .metadata
        .add_group_member(MIRROR_CLIENTS_GROUP, user_id)
        .await?;
    info!(%user_id, "mirror client authorized");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/mirrorers/{user_id}
///
/// Idempotent: revoking an absent client is a no-op. Takes effect on the
/// next upload request.
#[instrument(skip(state, req), fields(user_id = %user_id))]
pub async fn remove_mirrorer(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    require_admin(&req)?;
    let user_id = parse_user_id(&user_id)?;
    state
        .metadata
        .remove_group_member(MIRROR_CLIENTS_GROUP, user_id)
        .await?;
    info!(%user_id, "mirror client revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/mirrorers/backup
///
/// The full registry as a CSV document suitable for `restore_mirrorers`.
#[instrument(skip(state, req))]
pub async fn backup_mirrorers(State(state): State<AppState>, req: Request) -> ApiResult<Response> {
    require_admin(&req)?;
    let members = state.metadata.group_members(MIRROR_CLIENTS_GROUP).await?;
    let ids: Vec<Uuid> = members.into_iter().map(|m| m.user_id).collect();
    Ok((
        [(CONTENT_TYPE, "text/csv; charset=utf-8")],
        render_backup(&ids),
    )
        .into_response())
}

/// POST /v1/mirrorers/restore
///
/// Replaces the whole registry with the uploaded CSV. The document is parsed
/// in full before anything changes, so a malformed row leaves the current
/// membership untouched.
#[instrument(skip(state, req))]
pub async fn restore_mirrorers(State(state): State<AppState>, req: Request) -> ApiResult<StatusCode> {
    require_admin(&req)?;

    let body = read_body(&state, req).await?;
    let text = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("backup document is not UTF-8".to_string()))?;

    let user_ids = parse_backup(text)?;
    state
        .metadata
        .replace_group_members(MIRROR_CLIENTS_GROUP, &user_ids)
        .await?;
    info!(count = user_ids.len(), "mirror client registry restored");
    Ok(StatusCode::NO_CONTENT)
}
