//! Admin endpoints: accounts and package lineages.

use crate::auth::{hash_token, require_admin};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use granary_core::PackageName;
use granary_metadata::{AccountRow, PackageRow, TokenRow};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

/// Maximum request body size for admin requests (1 MiB).
const MAX_ADMIN_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub user_id: Uuid,
    pub username: String,
    /// The plaintext API token, returned exactly once.
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePackageResponse {
    pub name: String,
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_ADMIN_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Generate a random token secret using cryptographically secure RNG.
fn generate_token_secret() -> String {
    use base64::Engine;
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// POST /v1/admin/accounts
///
/// Create an account and its first API token. The plaintext token appears
/// only in this response; the store keeps its hash.
#[instrument(skip(state, req))]
pub async fn create_account(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CreateAccountResponse>)> {
    require_admin(&req)?;
    let body: CreateAccountRequest = read_json(req).await?;

    let username = body.username.trim();
    if username.is_empty() || username.len() > 64 {
        return Err(ApiError::BadRequest(
            "username must be 1-64 characters".to_string(),
        ));
    }

    let now = OffsetDateTime::now_utc();
    let account = AccountRow {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        is_admin: body.is_admin,
        created_at: now,
    };
    state.metadata.create_account(&account).await?;

    let secret = generate_token_secret();
    let token = TokenRow {
        token_id: Uuid::new_v4(),
        user_id: account.user_id,
        token_hash: hash_token(&secret),
        description: Some(format!("initial token for {username}")),
        created_at: now,
        revoked_at: None,
        last_used_at: None,
    };
    state.metadata.create_token(&token).await?;

    info!(user_id = %account.user_id, username = %account.username, "account created");
    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            user_id: account.user_id,
            username: account.username,
            token: secret,
        }),
    ))
}

/// POST /v1/admin/packages
///
/// Register a package lineage. Uploads are only accepted for registered
/// packages.
#[instrument(skip(state, req))]
pub async fn create_package(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CreatePackageResponse>)> {
    require_admin(&req)?;
    let body: CreatePackageRequest = read_json(req).await?;

    let name = PackageName::new(&body.name)
        .map_err(|e| ApiError::BadRequest(format!("invalid package name: {e}")))?;

    state
        .metadata
        .create_package(&PackageRow {
            package_name: name.as_str().to_string(),
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(package = %name.as_str(), "package registered");
    Ok((
        StatusCode::CREATED,
        Json(CreatePackageResponse {
            name: name.as_str().to_string(),
        }),
    ))
}
