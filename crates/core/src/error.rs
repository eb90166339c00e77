//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("descriptor parse error: {0}")]
    DescriptorParse(#[from] crate::descriptor::DescriptorError),

    #[error("archive error: {0}")]
    Archive(#[from] crate::tarball::ArchiveError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
