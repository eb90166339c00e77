//! Tarball unpacking for the mirror ingestion pipeline.
//!
//! An uploaded tarball is a gzip-compressed tar archive that must contain the
//! package descriptor at its canonical path (`name-version/name.pkg`). The
//! unpack step validates all of that in one pass and hands back both the
//! parsed descriptor and the decompressed archive bytes, so the caller can
//! store the compressed and decompressed forms without a second pass.

use crate::descriptor::{Descriptor, DescriptorError};
use crate::package::PackageId;
use bytes::Bytes;
use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;

/// Cap on the decompressed archive size (1 GiB). Bounds memory against
/// decompression bombs; the compressed body is already capped upstream.
const MAX_DECOMPRESSED_SIZE: u64 = 1024 * 1024 * 1024;

/// Errors from unpacking an uploaded tarball.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid gzip data: {0}")]
    Gzip(String),

    #[error("decompressed archive exceeds {MAX_DECOMPRESSED_SIZE} bytes")]
    TooLarge,

    #[error("invalid tar archive: {0}")]
    Tar(String),

    #[error("archive does not contain {expected}")]
    MissingDescriptor { expected: String },

    #[error("archive contains more than one entry at {path}")]
    DuplicateDescriptor { path: String },

    #[error("{path}: {source}")]
    Descriptor {
        path: String,
        source: DescriptorError,
    },

    #[error("descriptor declares {found}, expected {expected}")]
    IdMismatch { expected: String, found: String },
}

/// The validated contents of one uploaded tarball.
#[derive(Clone, Debug)]
pub struct UnpackedTarball {
    pub descriptor: Descriptor,
    /// The descriptor entry's exact bytes as found in the archive.
    pub descriptor_raw: Bytes,
    /// Parse warnings, already formatted with the entry path as context.
    pub warnings: Vec<String>,
    /// The gunzipped tar bytes.
    pub decompressed: Bytes,
}

/// Unpack and validate a gzip-compressed tar archive for the target package.
///
/// Fails if the gzip or tar framing is invalid, if the canonical descriptor
/// entry is missing or duplicated, if the descriptor does not parse, or if
/// the descriptor's identifier disagrees with `target`.
pub fn unpack_tarball(target: &PackageId, body: &[u8]) -> Result<UnpackedTarball, ArchiveError> {
    let mut decompressed = Vec::new();
    let mut decoder = GzDecoder::new(body).take(MAX_DECOMPRESSED_SIZE + 1);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ArchiveError::Gzip(e.to_string()))?;
    if decompressed.len() as u64 > MAX_DECOMPRESSED_SIZE {
        return Err(ArchiveError::TooLarge);
    }

    let entry_path = target.descriptor_entry_path();
    let mut descriptor_raw: Option<Vec<u8>> = None;

    let mut archive = tar::Archive::new(decompressed.as_slice());
    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::Tar(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::Tar(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| ArchiveError::Tar(e.to_string()))?
            .to_string_lossy()
            .into_owned();
        if path == entry_path {
            if descriptor_raw.is_some() {
                return Err(ArchiveError::DuplicateDescriptor { path });
            }
            let mut raw = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut raw)
                .map_err(|e| ArchiveError::Tar(e.to_string()))?;
            descriptor_raw = Some(raw);
        }
    }

    let descriptor_raw = descriptor_raw.ok_or(ArchiveError::MissingDescriptor {
        expected: entry_path.clone(),
    })?;

    let (descriptor, warnings) =
        Descriptor::parse(&descriptor_raw).map_err(|source| ArchiveError::Descriptor {
            path: entry_path.clone(),
            source,
        })?;

    if descriptor.package_id() != *target {
        return Err(ArchiveError::IdMismatch {
            expected: target.to_string(),
            found: descriptor.package_id().to_string(),
        });
    }

    let warnings = warnings
        .iter()
        .map(|w| format!("{entry_path}: {w}"))
        .collect();

    Ok(UnpackedTarball {
        descriptor,
        descriptor_raw: Bytes::from(descriptor_raw),
        warnings,
        decompressed: Bytes::from(decompressed),
    })
}
