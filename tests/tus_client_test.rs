//! Integration tests for the tus client against a mock server

use mockito::{Matcher, Server};
use sfm_importer::adapters::tus::{ResumableTransferClient, TusClient};
use sfm_importer::config::{secret_string, UploadConfig};
use sfm_importer::domain::{ImporterError, TransferError};
use std::io::Write;
use tempfile::NamedTempFile;

fn client() -> TusClient {
    let config = UploadConfig {
        token: Some(secret_string("test-token".to_string())),
        timeout_seconds: 5,
        ..UploadConfig::default()
    };
    TusClient::new(&config).unwrap()
}

fn file_with(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_create_returns_absolute_location() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/files/")
        .match_header("tus-resumable", "1.0.0")
        .match_header("authorization", "Bearer test-token")
        .match_header("upload-length", "11")
        .match_header(
            "upload-metadata",
            "name MDAwMS5wYXQ=,FileType UGF0aWVudEZpbGU=",
        )
        .with_status(201)
        .with_header("location", "/files/abc123")
        .create_async()
        .await;

    let metadata = vec![
        ("name".to_string(), "0001.pat".to_string()),
        ("FileType".to_string(), "PatientFile".to_string()),
    ];
    let token = client()
        .create(&format!("{}/files/", server.url()), 11, &metadata)
        .await
        .unwrap();

    assert_eq!(token, format!("{}/files/abc123", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_rejected() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/files/")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let result = client()
        .create(&format!("{}/files/", server.url()), 11, &[])
        .await;

    assert!(matches!(
        result,
        Err(ImporterError::Transfer(TransferError::CreateFailed { status: 403, .. }))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_without_location() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/files/")
        .with_status(201)
        .create_async()
        .await;

    let result = client()
        .create(&format!("{}/files/", server.url()), 11, &[])
        .await;

    assert!(matches!(
        result,
        Err(ImporterError::Transfer(TransferError::MissingLocation))
    ));
}

#[tokio::test]
async fn test_upload_sends_chunks_from_zero() {
    let mut server = Server::new_async().await;
    let file = file_with(b"hello world");

    let head = server
        .mock("HEAD", "/files/abc")
        .match_header("tus-resumable", "1.0.0")
        .with_status(200)
        .with_header("upload-offset", "0")
        .with_header("upload-length", "11")
        .create_async()
        .await;
    let mut patches = Vec::new();
    for (offset, body, next) in [("0", "hello ", "6"), ("6", "world", "11")] {
        patches.push(
            server
                .mock("PATCH", "/files/abc")
                .match_header("upload-offset", offset)
                .match_header("content-type", "application/offset+octet-stream")
                .match_header("authorization", "Bearer test-token")
                .match_body(Matcher::Exact(body.to_string()))
                .with_status(204)
                .with_header("upload-offset", next)
                .create_async()
                .await,
        );
    }

    client()
        .upload(&format!("{}/files/abc", server.url()), file.path(), 6)
        .await
        .unwrap();

    head.assert_async().await;
    for patch in patches {
        patch.assert_async().await;
    }
}

#[tokio::test]
async fn test_upload_resumes_from_server_offset() {
    let mut server = Server::new_async().await;
    let file = file_with(b"hello world");

    server
        .mock("HEAD", "/files/abc")
        .with_status(200)
        .with_header("upload-offset", "6")
        .with_header("upload-length", "11")
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/files/abc")
        .match_header("upload-offset", "6")
        .match_body(Matcher::Exact("world".to_string()))
        .with_status(204)
        .with_header("upload-offset", "11")
        .expect(1)
        .create_async()
        .await;

    client()
        .upload(&format!("{}/files/abc", server.url()), file.path(), 1024)
        .await
        .unwrap();

    patch.assert_async().await;
}

#[tokio::test]
async fn test_upload_already_complete_sends_nothing() {
    let mut server = Server::new_async().await;
    let file = file_with(b"hello world");

    server
        .mock("HEAD", "/files/abc")
        .with_status(200)
        .with_header("upload-offset", "11")
        .with_header("upload-length", "11")
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/files/abc")
        .expect(0)
        .create_async()
        .await;

    client()
        .upload(&format!("{}/files/abc", server.url()), file.path(), 1024)
        .await
        .unwrap();

    patch.assert_async().await;
}

#[tokio::test]
async fn test_upload_detects_offset_mismatch() {
    let mut server = Server::new_async().await;
    let file = file_with(b"hello world");

    server
        .mock("HEAD", "/files/abc")
        .with_status(200)
        .with_header("upload-offset", "0")
        .create_async()
        .await;
    server
        .mock("PATCH", "/files/abc")
        .with_status(204)
        .with_header("upload-offset", "3")
        .create_async()
        .await;

    let result = client()
        .upload(&format!("{}/files/abc", server.url()), file.path(), 1024)
        .await;

    assert!(matches!(
        result,
        Err(ImporterError::Transfer(TransferError::OffsetMismatch {
            expected: 11,
            actual: 3
        }))
    ));
}

#[tokio::test]
async fn test_upload_of_expired_resource_fails() {
    let mut server = Server::new_async().await;
    let file = file_with(b"hello world");

    server
        .mock("HEAD", "/files/gone")
        .with_status(404)
        .create_async()
        .await;

    let result = client()
        .upload(&format!("{}/files/gone", server.url()), file.path(), 1024)
        .await;

    assert!(matches!(
        result,
        Err(ImporterError::Transfer(TransferError::OffsetQueryFailed { status: 404, .. }))
    ));
}
