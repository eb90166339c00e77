//! Package revision records and upload provenance.

use crate::account::UserId;
use crate::descriptor::Descriptor;
use crate::hash::BlobRef;
use crate::package::PackageId;
use bytes::Bytes;
use time::OffsetDateTime;

/// The (timestamp, uploader) pair recorded with each accepted revision.
///
/// Captured at the moment a request is accepted and never mutated afterward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProvenance {
    pub at: OffsetDateTime,
    pub uploader: UserId,
}

impl UploadProvenance {
    /// Capture provenance for the given uploader at the current time.
    pub fn now(uploader: UserId) -> Self {
        Self {
            at: OffsetDateTime::now_utc(),
            uploader,
        }
    }
}

/// Both stored representations of one uploaded tarball.
///
/// The compressed blob is the request body verbatim; the decompressed blob is
/// its gunzipped form, stored separately so read paths never re-decompress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TarballEntry {
    pub compressed: BlobRef,
    pub decompressed: BlobRef,
    pub provenance: UploadProvenance,
}

/// The unit handed to the merge coordinator: one accepted upload.
///
/// Constructed once per successful ingestion and handed off immediately; the
/// coordinator owns all subsequent lifecycle (versioning, storage, indexing).
/// `descriptor_raw` holds the exact submitted bytes, never a reserialization.
#[derive(Clone, Debug)]
pub struct PackageRevision {
    pub id: PackageId,
    pub descriptor: Descriptor,
    pub descriptor_raw: Bytes,
    pub tarball: Option<TarballEntry>,
    pub provenance: UploadProvenance,
    /// Historical revisions. The ingestion pipelines never backfill history;
    /// this stays empty and only the current revision is appended downstream.
    pub history: Vec<PackageRevision>,
}

impl PackageRevision {
    /// Assemble a revision record for a tarball upload.
    pub fn with_tarball(
        id: PackageId,
        descriptor: Descriptor,
        descriptor_raw: Bytes,
        tarball: TarballEntry,
        provenance: UploadProvenance,
    ) -> Self {
        Self {
            id,
            descriptor,
            descriptor_raw,
            tarball: Some(tarball),
            provenance,
            history: Vec::new(),
        }
    }

    /// Assemble a revision record for a standalone descriptor upload.
    pub fn descriptor_only(
        id: PackageId,
        descriptor: Descriptor,
        descriptor_raw: Bytes,
        provenance: UploadProvenance,
    ) -> Self {
        Self {
            id,
            descriptor,
            descriptor_raw,
            tarball: None,
            provenance,
            history: Vec::new(),
        }
    }
}
