//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{AccountRepo, GroupRepo, PackageRepo, RevisionRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: AccountRepo + GroupRepo + PackageRepo + RevisionRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under server concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;

        // The mirror client registry group always exists, even when empty.
        sqlx::query(
            "INSERT OR IGNORE INTO groups (group_name, title, created_at) VALUES (?, ?, ?)",
        )
        .bind(granary_core::MIRROR_CLIENTS_GROUP)
        .bind("Authorized mirror clients")
        .bind(time::OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl AccountRepo for SqliteStore {
        async fn create_account(&self, account: &AccountRow) -> MetadataResult<()> {
            if self
                .get_account_by_username(&account.username)
                .await?
                .is_some()
            {
                return Err(MetadataError::AlreadyExists(format!(
                    "username '{}' already exists",
                    account.username
                )));
            }

            sqlx::query(
                "INSERT INTO accounts (user_id, username, is_admin, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(account.user_id)
            .bind(&account.username)
            .bind(account.is_admin)
            .bind(account.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_account(&self, user_id: Uuid) -> MetadataResult<Option<AccountRow>> {
            let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_account_by_username(
            &self,
            username: &str,
        ) -> MetadataResult<Option<AccountRow>> {
            let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_accounts(&self) -> MetadataResult<Vec<AccountRow>> {
            let rows = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts ORDER BY username")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO tokens (token_id, user_id, token_hash, description, created_at, revoked_at, last_used_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.token_id)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(&token.description)
            .bind(token.created_at)
            .bind(token.revoked_at)
            .bind(token.last_used_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>> {
            let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
            sqlx::query("UPDATE tokens SET last_used_at = ? WHERE token_id = ?")
                .bind(used_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn revoke_token(
            &self,
            token_id: Uuid,
            revoked_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE tokens SET revoked_at = ? WHERE token_id = ? AND revoked_at IS NULL",
            )
            .bind(revoked_at)
            .bind(token_id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "active token {token_id} not found"
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl GroupRepo for SqliteStore {
        async fn ensure_group(&self, group: &GroupRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT OR IGNORE INTO groups (group_name, title, created_at) VALUES (?, ?, ?)",
            )
            .bind(&group.group_name)
            .bind(&group.title)
            .bind(group.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_group(&self, group_name: &str) -> MetadataResult<Option<GroupRow>> {
            let row = sqlx::query_as::<_, GroupRow>("SELECT * FROM groups WHERE group_name = ?")
                .bind(group_name)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn group_members(&self, group_name: &str) -> MetadataResult<Vec<GroupMemberRow>> {
            let rows = sqlx::query_as::<_, GroupMemberRow>(
                "SELECT * FROM group_members WHERE group_name = ? ORDER BY user_id",
            )
            .bind(group_name)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn is_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<bool> {
            let row: Option<(i32,)> = sqlx::query_as(
                "SELECT 1 FROM group_members WHERE group_name = ? AND user_id = ?",
            )
            .bind(group_name)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.is_some())
        }

        async fn add_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<()> {
            sqlx::query(
                "INSERT OR IGNORE INTO group_members (group_name, user_id, added_at) VALUES (?, ?, ?)",
            )
            .bind(group_name)
            .bind(user_id)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn remove_group_member(&self, group_name: &str, user_id: Uuid) -> MetadataResult<()> {
            sqlx::query("DELETE FROM group_members WHERE group_name = ? AND user_id = ?")
                .bind(group_name)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn replace_group_members(
            &self,
            group_name: &str,
            user_ids: &[Uuid],
        ) -> MetadataResult<()> {
            // Wholesale replacement must be all-or-nothing so a failed restore
            // leaves the previous membership intact.
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM group_members WHERE group_name = ?")
                .bind(group_name)
                .execute(&mut *tx)
                .await?;

            let added_at = OffsetDateTime::now_utc();
            for user_id in user_ids {
                sqlx::query(
                    "INSERT OR IGNORE INTO group_members (group_name, user_id, added_at) VALUES (?, ?, ?)",
                )
                .bind(group_name)
                .bind(user_id)
                .bind(added_at)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl PackageRepo for SqliteStore {
        async fn create_package(&self, package: &PackageRow) -> MetadataResult<()> {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO packages (package_name, created_at) VALUES (?, ?)",
            )
            .bind(&package.package_name)
            .bind(package.created_at)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::AlreadyExists(format!(
                    "package '{}' already exists",
                    package.package_name
                )));
            }
            Ok(())
        }

        async fn get_package(&self, package_name: &str) -> MetadataResult<Option<PackageRow>> {
            let row =
                sqlx::query_as::<_, PackageRow>("SELECT * FROM packages WHERE package_name = ?")
                    .bind(package_name)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        }

        async fn package_exists(&self, package_name: &str) -> MetadataResult<bool> {
            let row: Option<(i32,)> =
                sqlx::query_as("SELECT 1 FROM packages WHERE package_name = ?")
                    .bind(package_name)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row.is_some())
        }

        async fn list_packages(&self) -> MetadataResult<Vec<PackageRow>> {
            let rows =
                sqlx::query_as::<_, PackageRow>("SELECT * FROM packages ORDER BY package_name")
                    .fetch_all(&self.pool)
                    .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl RevisionRepo for SqliteStore {
        async fn append_revision(&self, revision: &PackageRevisionRow) -> MetadataResult<i64> {
            // Computing the index inside the insert keeps read and write in
            // one statement, so two concurrent appends can never both claim
            // the same index.
            let index: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO package_revisions (
                    revision_id, package_name, version, revision_index,
                    descriptor_raw, tarball_compressed_ref, tarball_decompressed_ref,
                    uploaded_at, uploader_id
                )
                SELECT ?, ?, ?,
                       COALESCE((SELECT MAX(revision_index) + 1 FROM package_revisions WHERE package_name = ?), 0),
                       ?, ?, ?, ?, ?
                RETURNING revision_index
                "#,
            )
            .bind(revision.revision_id)
            .bind(&revision.package_name)
            .bind(&revision.version)
            .bind(&revision.package_name)
            .bind(&revision.descriptor_raw)
            .bind(&revision.tarball_compressed_ref)
            .bind(&revision.tarball_decompressed_ref)
            .bind(revision.uploaded_at)
            .bind(revision.uploader_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(index)
        }

        async fn list_revisions(
            &self,
            package_name: &str,
        ) -> MetadataResult<Vec<PackageRevisionRow>> {
            let rows = sqlx::query_as::<_, PackageRevisionRow>(
                "SELECT * FROM package_revisions WHERE package_name = ? ORDER BY revision_index",
            )
            .bind(package_name)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn latest_revision(
            &self,
            package_name: &str,
        ) -> MetadataResult<Option<PackageRevisionRow>> {
            let row = sqlx::query_as::<_, PackageRevisionRow>(
                "SELECT * FROM package_revisions WHERE package_name = ? ORDER BY revision_index DESC LIMIT 1",
            )
            .bind(package_name)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }
    }
}

/// Database schema.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    user_id BLOB PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tokens (
    token_id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES accounts(user_id),
    token_hash TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT NOT NULL,
    revoked_at TEXT,
    last_used_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);

CREATE TABLE IF NOT EXISTS groups (
    group_name TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Membership is an authorization list of user ids; ids are not required to
-- resolve to local accounts, so a restored list survives account churn.
CREATE TABLE IF NOT EXISTS group_members (
    group_name TEXT NOT NULL REFERENCES groups(group_name),
    user_id BLOB NOT NULL,
    added_at TEXT NOT NULL,
    PRIMARY KEY (group_name, user_id)
);

CREATE TABLE IF NOT EXISTS packages (
    package_name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_revisions (
    revision_id BLOB PRIMARY KEY,
    package_name TEXT NOT NULL REFERENCES packages(package_name),
    version TEXT NOT NULL,
    revision_index INTEGER NOT NULL,
    descriptor_raw BLOB NOT NULL,
    tarball_compressed_ref TEXT,
    tarball_decompressed_ref TEXT,
    uploaded_at TEXT NOT NULL,
    uploader_id BLOB NOT NULL REFERENCES accounts(user_id),
    UNIQUE (package_name, revision_index)
);

CREATE INDEX IF NOT EXISTS idx_revisions_package ON package_revisions(package_name);
"#;
