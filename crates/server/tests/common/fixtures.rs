//! Test data builders and request helpers.

use super::server::TestServer;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use flate2::Compression;
use flate2::write::GzEncoder;
use granary_core::MIRROR_CLIENTS_GROUP;
use granary_metadata::{AccountRow, PackageRow, TokenRow};
use sha2::{Digest, Sha256};
use std::io::Write;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

/// Build a gzip-compressed tar archive from (path, contents) pairs.
#[allow(dead_code)]
pub fn make_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    let tar_bytes = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

/// A well-formed tarball for `foo-1.0`.
#[allow(dead_code)]
pub fn foo_tarball() -> Vec<u8> {
    make_tarball(&[
        ("foo-1.0/foo.pkg", b"name: foo\nversion: 1.0\n"),
        ("foo-1.0/src/lib.c", b"int foo(void) { return 0; }\n"),
    ])
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Create an account with a usable token; returns (user_id, plaintext token).
#[allow(dead_code)]
pub async fn create_account(server: &TestServer, username: &str) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let raw_token = format!("test-token-{}", Uuid::new_v4());
    let now = OffsetDateTime::now_utc();

    server
        .metadata()
        .create_account(&AccountRow {
            user_id,
            username: username.to_string(),
            is_admin: false,
            created_at: now,
        })
        .await
        .expect("Failed to create account");

    server
        .metadata()
        .create_token(&TokenRow {
            token_id: Uuid::new_v4(),
            user_id,
            token_hash: sha256_hex(raw_token.as_bytes()),
            description: None,
            created_at: now,
            revoked_at: None,
            last_used_at: None,
        })
        .await
        .expect("Failed to create token");

    (user_id, raw_token)
}

/// Create an account that is already an authorized mirror client.
#[allow(dead_code)]
pub async fn create_mirrorer(server: &TestServer, username: &str) -> (Uuid, String) {
    let (user_id, token) = create_account(server, username).await;
    server
        .metadata()
        .add_group_member(MIRROR_CLIENTS_GROUP, user_id)
        .await
        .expect("Failed to authorize mirror client");
    (user_id, token)
}

/// Register a package lineage directly in the metadata store.
#[allow(dead_code)]
pub async fn register_package(server: &TestServer, name: &str) {
    server
        .metadata()
        .create_package(&PackageRow {
            package_name: name.to_string(),
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("Failed to register package");
}

/// Send a request and collect (status, body bytes).
#[allow(dead_code)]
pub async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

/// PUT a tarball with standard framing headers.
#[allow(dead_code)]
pub async fn put_tarball(
    router: &axum::Router,
    package: &str,
    token: &str,
    body: Vec<u8>,
) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/packages/{package}/tarball"))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/x-gzip")
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

/// PUT a descriptor with standard framing headers.
#[allow(dead_code)]
pub async fn put_descriptor(
    router: &axum::Router,
    package: &str,
    token: &str,
    body: &str,
) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/packages/{package}/descriptor"))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}
