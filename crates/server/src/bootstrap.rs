//! Admin account and token initialization.

use anyhow::{Result, bail};
use granary_core::config::AdminConfig;
use granary_metadata::{AccountRow, MetadataStore, TokenRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Ensure the configured admin account and token exist.
///
/// The admin token is configured as a SHA-256 hash so the plaintext never
/// appears in config files. Re-running with the same hash is a no-op.
pub async fn ensure_admin_token(metadata: &dyn MetadataStore, config: &AdminConfig) -> Result<()> {
    // Normalize to lowercase to match hash_token(), which emits lowercase hex.
    let hash = config
        .token_hash
        .strip_prefix("sha256:")
        .unwrap_or(&config.token_hash)
        .to_lowercase();
    if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid admin token_hash: expected 64 hex chars");
    }

    if let Some(existing) = metadata.get_token_by_hash(&hash).await? {
        if existing.revoked_at.is_some() {
            bail!(
                "admin token hash matches a revoked token (id={}); use a new token hash",
                existing.token_id
            );
        }
        tracing::debug!("Admin token already exists");
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    let account = match metadata.get_account_by_username(&config.username).await? {
        Some(account) => {
            if !account.is_admin {
                bail!(
                    "account '{}' exists but is not an admin account",
                    config.username
                );
            }
            account
        }
        None => {
            let account = AccountRow {
                user_id: Uuid::new_v4(),
                username: config.username.clone(),
                is_admin: true,
                created_at: now,
            };
            metadata.create_account(&account).await?;
            tracing::info!(username = %account.username, "Admin account created");
            account
        }
    };

    let token = TokenRow {
        token_id: Uuid::new_v4(),
        user_id: account.user_id,
        token_hash: hash,
        description: Some("bootstrap admin token".to_string()),
        created_at: now,
        revoked_at: None,
        last_used_at: None,
    };
    metadata.create_token(&token).await?;
    tracing::info!(token_id = %token.token_id, "Admin token created");

    Ok(())
}
