//! Mirror ingestion handlers: tarball and descriptor uploads.

use crate::auth::{AuthenticatedUser, require_auth};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, Request, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use granary_core::tarball::unpack_tarball;
use granary_core::{
    Descriptor, MIRROR_CLIENTS_GROUP, PackageId, PackageRevision, TarballEntry, UploadProvenance,
};
use granary_storage::AddWithError;
use tracing::{instrument, warn};

/// Resolve the target package from the URL segment.
///
/// Both an unparsable identifier and an untracked package name look the same
/// to the caller: there is no such package lineage here.
async fn resolve_target(state: &AppState, package: &str) -> ApiResult<PackageId> {
    let id = PackageId::parse(package)
        .map_err(|_| ApiError::NotFound(format!("no such package: {package}")))?;
    if !state.metadata.package_exists(id.name().as_str()).await? {
        return Err(ApiError::NotFound(format!(
            "no such package: {}",
            id.name()
        )));
    }
    Ok(id)
}

/// Authorize a mirror upload. Membership is checked against the registry on
/// every request so a revocation takes effect immediately.
///
/// Takes the already-extracted user rather than the request: holding a
/// request borrow across the await would make the handler future non-Send.
async fn require_mirror_client(
    state: &AppState,
    user: &AuthenticatedUser,
) -> ApiResult<granary_core::UserId> {
    let member = state
        .metadata
        .is_group_member(MIRROR_CLIENTS_GROUP, *user.user_id.as_uuid())
        .await?;
    if !member {
        return Err(ApiError::Forbidden(format!(
            "account '{}' is not an authorized mirror client",
            user.username
        )));
    }
    Ok(user.user_id)
}

fn content_type(req: &Request) -> Option<&str> {
    req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn content_encoding(req: &Request) -> Option<&str> {
    req.headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
}

/// Validate tarball framing: either a gzip-encoded tar, or a gzip body sent
/// as its own media type.
fn check_tarball_framing(req: &Request) -> ApiResult<()> {
    let media_type = content_type(req)
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());
    let encoding = content_encoding(req).map(|v| v.trim().to_ascii_lowercase());

    let ok = match (media_type.as_deref(), encoding.as_deref()) {
        (Some("application/x-tar"), Some("gzip")) => true,
        (Some("application/x-gzip"), None) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType(
            "expected application/x-tar or x-gzip".to_string(),
        ))
    }
}

/// Validate descriptor framing: plain text, no transfer compression.
fn check_descriptor_framing(req: &Request) -> ApiResult<()> {
    let media_type = content_type(req)
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());

    if media_type.as_deref() == Some("text/plain") && content_encoding(req).is_none() {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType(
            "expected text/plain".to_string(),
        ))
    }
}

/// Whether a body-read error is the configured length cap firing, as opposed
/// to a transport failure.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

pub(crate) async fn read_body(state: &AppState, req: Request) -> ApiResult<bytes::Bytes> {
    let limit = state.config.server.max_body_size;
    axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|err| {
            if is_length_limit(&err) {
                ApiError::PayloadTooLarge { limit }
            } else {
                ApiError::BadRequest(format!("failed to read body: {err}"))
            }
        })
}

fn warnings_response(warnings: Vec<String>) -> Response {
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        warnings.join("\n"),
    )
        .into_response()
}

/// PUT /v1/packages/{package}/tarball
///
/// Ingest a gzip-compressed source tarball: store the compressed body and
/// its decompressed form content-addressed, then hand a revision to the
/// merge coordinator. On any validation failure nothing is retained.
#[instrument(skip(state, req), fields(package = %package))]
pub async fn put_package_tarball(
    State(state): State<AppState>,
    Path(package): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    let user = require_auth(&req)?.clone();
    let uploader = require_mirror_client(&state, &user).await?;
    let target = resolve_target(&state, &package).await?;
    check_tarball_framing(&req)?;

    let body = read_body(&state, req).await?;
    let provenance = UploadProvenance::now(uploader);

    // The unpack runs before anything is stored; an invalid archive leaves
    // no trace in the blob store.
    let (compressed, unpacked) = state
        .blobs
        .add_with(body, |raw| unpack_tarball(&target, raw))
        .await
        .map_err(|e| match e {
            AddWithError::Transform(archive) => ApiError::Core(archive.into()),
            AddWithError::Storage(storage) => ApiError::Storage(storage),
        })?;

    let decompressed = match state.blobs.add(unpacked.decompressed.clone()).await {
        Ok(stored) => stored,
        Err(e) => {
            // Roll back the compressed blob unless it predates this request:
            // a deduplicated blob belongs to an earlier, complete ingestion.
            if compressed.was_new {
                if let Err(cleanup) = state.blobs.remove(&compressed.blob_ref).await {
                    warn!(
                        blob = %compressed.blob_ref,
                        error = %cleanup,
                        "failed to roll back compressed blob"
                    );
                }
            }
            return Err(e.into());
        }
    };

    let revision = PackageRevision::with_tarball(
        target,
        unpacked.descriptor,
        unpacked.descriptor_raw,
        TarballEntry {
            compressed: compressed.blob_ref,
            decompressed: decompressed.blob_ref,
            provenance,
        },
        provenance,
    );
    state.merge.merge_package(revision).await?;

    Ok(warnings_response(unpacked.warnings))
}

/// PUT /v1/packages/{package}/descriptor
///
/// Ingest a standalone descriptor revision, without any tarball content.
#[instrument(skip(state, req), fields(package = %package))]
pub async fn put_package_descriptor(
    State(state): State<AppState>,
    Path(package): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    let user = require_auth(&req)?.clone();
    let uploader = require_mirror_client(&state, &user).await?;
    let target = resolve_target(&state, &package).await?;
    check_descriptor_framing(&req)?;

    let body = read_body(&state, req).await?;
    let provenance = UploadProvenance::now(uploader);

    let (descriptor, warnings) = Descriptor::parse(&body).map_err(granary_core::Error::from)?;
    if descriptor.package_id() != target {
        return Err(ApiError::BadRequest(format!(
            "descriptor declares {}, expected {target}",
            descriptor.package_id()
        )));
    }

    let descriptor_file = target.descriptor_filename();
    let warnings = warnings
        .iter()
        .map(|w| format!("{descriptor_file}: {w}"))
        .collect();

    let revision = PackageRevision::descriptor_only(target, descriptor, body, provenance);
    state.merge.merge_package(revision).await?;

    Ok(warnings_response(warnings))
}
