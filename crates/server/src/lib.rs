//! HTTP API server for the package mirror write path.
//!
//! This crate provides the HTTP control plane:
//! - Tarball and descriptor ingestion
//! - Mirror client registry management with CSV backup/restore
//! - Admin endpoints (accounts, package registration)
//! - Merge coordination for accepted revisions

pub mod auth;
pub mod backup;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod routes;
pub mod state;

pub use auth::TraceId;
pub use error::ApiError;
pub use merge::{DbMergeCoordinator, MergeCoordinator, MergeError};
pub use routes::create_router;
pub use state::AppState;
