//! Backup and restore of the mirror client registry.
//!
//! The backup format is a one-column CSV named by convention `clients.csv`:
//! a `user_id` header followed by one user ID per line, sorted. Restore is
//! all-or-nothing: any malformed row rejects the whole document and the
//! registry keeps its previous membership.

use crate::error::{ApiError, ApiResult};
use granary_core::UserId;
use uuid::Uuid;

const HEADER: &str = "user_id";

/// Render the registry membership as a CSV document.
pub fn render_backup(user_ids: &[Uuid]) -> String {
    let mut ids: Vec<String> = user_ids.iter().map(|id| id.to_string()).collect();
    ids.sort();

    let mut out = String::with_capacity((ids.len() + 1) * 37);
    out.push_str(HEADER);
    out.push('\n');
    for id in ids {
        out.push_str(&id);
        out.push('\n');
    }
    out
}

/// Parse a backup CSV document into the membership list it describes.
///
/// Parsing is strict: the header must be exactly `user_id` and every
/// non-empty row must be a valid user ID. Errors carry the 1-based line
/// number of the offending row.
pub fn parse_backup(raw: &str) -> ApiResult<Vec<Uuid>> {
    let mut lines = raw.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.trim() == HEADER => {}
        Some((_, header)) => {
            return Err(ApiError::BadRequest(format!(
                "line 1: expected '{HEADER}' header, got '{}'",
                header.trim()
            )));
        }
        None => {
            return Err(ApiError::BadRequest(format!(
                "empty document: expected '{HEADER}' header"
            )));
        }
    }

    let mut user_ids = Vec::new();
    for (index, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let user_id = UserId::parse(line).map_err(|_| {
            ApiError::BadRequest(format!("line {}: invalid user id '{line}'", index + 1))
        })?;
        user_ids.push(*user_id.as_uuid());
    }

    Ok(user_ids)
}
