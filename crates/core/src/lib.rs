//! Core domain types and shared logic for the granary mirror write path.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Package identifiers and versions
//! - The package descriptor format and its parser
//! - Content hashes and blob references
//! - Package revision records and upload provenance
//! - Tarball unpacking for the mirror ingestion pipeline
//! - Accounts and API tokens

pub mod account;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hash;
pub mod package;
pub mod revision;
pub mod tarball;

pub use account::{Account, UserId};
pub use descriptor::{Descriptor, DescriptorError, DescriptorWarning};
pub use error::{Error, Result};
pub use hash::{BlobRef, ContentHash};
pub use package::{PackageId, PackageName, Version};
pub use revision::{PackageRevision, TarballEntry, UploadProvenance};
pub use tarball::{ArchiveError, UnpackedTarball, unpack_tarball};

/// Default maximum request body size: 256 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 256 * 1024 * 1024;

/// The group that holds authorized mirror clients.
pub const MIRROR_CLIENTS_GROUP: &str = "mirror-clients";
