//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}

/// API token record. The plaintext token is never stored; only the
/// SHA-256 hex of it.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
}

/// Named group of accounts.
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub group_name: String,
    pub title: String,
    pub created_at: OffsetDateTime,
}

/// Group membership record.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberRow {
    pub group_name: String,
    pub user_id: Uuid,
    pub added_at: OffsetDateTime,
}

/// Package record. Packages are created ahead of time; uploads target an
/// existing package.
#[derive(Debug, Clone, FromRow)]
pub struct PackageRow {
    pub package_name: String,
    pub created_at: OffsetDateTime,
}

/// One accepted upload of a package.
#[derive(Debug, Clone, FromRow)]
pub struct PackageRevisionRow {
    pub revision_id: Uuid,
    pub package_name: String,
    pub version: String,
    /// Position in the package's revision history, starting at 0.
    pub revision_index: i64,
    pub descriptor_raw: Vec<u8>,
    /// Content reference for the compressed tarball, when one was uploaded.
    pub tarball_compressed_ref: Option<String>,
    /// Content reference for the decompressed archive.
    pub tarball_decompressed_ref: Option<String>,
    pub uploaded_at: OffsetDateTime,
    pub uploader_id: Uuid,
}
