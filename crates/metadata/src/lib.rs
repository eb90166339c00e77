//! Metadata layer: accounts, tokens, groups, packages, revision history.
//!
//! Repository traits per concern, composed into [`MetadataStore`], with a
//! SQLite implementation.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{
    AccountRow, GroupMemberRow, GroupRow, PackageRevisionRow, PackageRow, TokenRow,
};
pub use repos::{AccountRepo, GroupRepo, PackageRepo, RevisionRepo};
pub use store::{MetadataStore, SqliteStore};
