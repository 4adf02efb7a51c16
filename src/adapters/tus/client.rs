//! tus 1.0.0 client
//!
//! Implements the creation and core protocol: `POST` to create an upload,
//! `HEAD` to read the current offset, `PATCH` to append chunks.

use super::ResumableTransferClient;
use crate::config::{SecretString, UploadConfig};
use crate::domain::{Result, TransferError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use url::Url;

/// Protocol version sent in `Tus-Resumable`
pub const TUS_VERSION: &str = "1.0.0";

/// Default PATCH body size (512 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

const OFFSET_CONTENT_TYPE: &str = "application/offset+octet-stream";

/// tus client for the import API
///
/// Every request carries `Tus-Resumable` and, when a token is configured,
/// `Authorization: Bearer <token>`.
pub struct TusClient {
    client: Client,
    token: Option<SecretString>,
}

impl TusClient {
    /// Build a client from the upload configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &UploadConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                TransferError::ConnectionFailed(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header("Tus-Resumable", TUS_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret().as_ref()),
            None => request,
        }
    }

    /// Ask the server how many bytes of the upload it already holds
    async fn query_offset(&self, resume_token: &str) -> Result<(u64, Option<u64>)> {
        let resp = self
            .request(Method::HEAD, resume_token)
            .send()
            .await
            .map_err(|e| TransferError::ConnectionFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransferError::OffsetQueryFailed {
                status: status.as_u16(),
                message: format!("HEAD {resume_token} returned {status}"),
            }
            .into());
        }

        let offset = header_u64(resp.headers(), "Upload-Offset")?.ok_or_else(|| {
            TransferError::InvalidResponse("HEAD response is missing Upload-Offset".to_string())
        })?;
        let length = header_u64(resp.headers(), "Upload-Length")?;

        Ok((offset, length))
    }
}

#[async_trait]
impl ResumableTransferClient for TusClient {
    async fn create(
        &self,
        address: &str,
        byte_length: u64,
        metadata: &[(String, String)],
    ) -> Result<String> {
        let base = Url::parse(address)
            .map_err(|e| TransferError::InvalidResponse(format!("Invalid upload address: {e}")))?;

        let resp = self
            .request(Method::POST, address)
            .header("Upload-Length", byte_length.to_string())
            .header("Upload-Metadata", encode_metadata(metadata))
            .header(CONTENT_LENGTH, "0")
            .send()
            .await
            .map_err(|e| TransferError::ConnectionFailed(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransferError::CreateFailed {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .ok_or(TransferError::MissingLocation)?
            .to_str()
            .map_err(|e| TransferError::InvalidResponse(format!("Invalid Location header: {e}")))?;

        let resolved = base
            .join(location)
            .map_err(|e| TransferError::InvalidResponse(format!("Invalid Location header: {e}")))?;

        tracing::debug!(
            address = %address,
            byte_length = byte_length,
            remote_url = %resolved,
            "Created remote upload"
        );

        Ok(resolved.to_string())
    }

    async fn upload(&self, resume_token: &str, file: &Path, chunk_size: usize) -> Result<()> {
        let chunk_size = chunk_size.max(1);
        let length = tokio::fs::metadata(file)
            .await
            .map_err(TransferError::from)?
            .len();

        let (mut offset, remote_length) = self.query_offset(resume_token).await?;

        if let Some(remote_length) = remote_length {
            if remote_length != length {
                return Err(TransferError::InvalidResponse(format!(
                    "Remote upload expects {remote_length} bytes but {} has {length}",
                    file.display()
                ))
                .into());
            }
        }
        if offset > length {
            return Err(TransferError::OffsetMismatch {
                expected: length,
                actual: offset,
            }
            .into());
        }

        if offset > 0 {
            tracing::info!(
                remote_url = %resume_token,
                offset = offset,
                length = length,
                "Resuming upload"
            );
        }

        let mut handle = tokio::fs::File::open(file)
            .await
            .map_err(TransferError::from)?;
        handle
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(TransferError::from)?;

        let mut buffer = vec![0u8; chunk_size];
        while offset < length {
            let len = (length - offset).min(chunk_size as u64) as usize;
            handle
                .read_exact(&mut buffer[..len])
                .await
                .map_err(TransferError::from)?;

            let resp = self
                .request(Method::PATCH, resume_token)
                .header("Upload-Offset", offset.to_string())
                .header(CONTENT_TYPE, OFFSET_CONTENT_TYPE)
                .body(buffer[..len].to_vec())
                .send()
                .await
                .map_err(|e| TransferError::ConnectionFailed(e.to_string()))?;

            let status = resp.status();
            if status != StatusCode::NO_CONTENT {
                let body = resp.text().await.unwrap_or_default();
                return Err(TransferError::UploadFailed {
                    status: status.as_u16(),
                    message: body,
                }
                .into());
            }

            let expected = offset + len as u64;
            let actual = header_u64(resp.headers(), "Upload-Offset")?.ok_or_else(|| {
                TransferError::InvalidResponse(
                    "PATCH response is missing Upload-Offset".to_string(),
                )
            })?;
            if actual != expected {
                return Err(TransferError::OffsetMismatch { expected, actual }.into());
            }

            offset = actual;
            tracing::trace!(remote_url = %resume_token, offset = offset, length = length, "Chunk accepted");
        }

        Ok(())
    }
}

/// Encode `Upload-Metadata`: comma-separated `key base64(value)` pairs
fn encode_metadata(metadata: &[(String, String)]) -> String {
    metadata
        .iter()
        .map(|(key, value)| format!("{key} {}", general_purpose::STANDARD.encode(value.as_bytes())))
        .collect::<Vec<_>>()
        .join(",")
}

fn header_u64(headers: &HeaderMap, name: &str) -> std::result::Result<Option<u64>, TransferError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| TransferError::InvalidResponse(format!("Invalid {name} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_encode_metadata() {
        let metadata = vec![
            ("name".to_string(), "0001.pat".to_string()),
            ("contentType".to_string(), "application/octet-stream".to_string()),
        ];
        assert_eq!(
            encode_metadata(&metadata),
            "name MDAwMS5wYXQ=,contentType YXBwbGljYXRpb24vb2N0ZXQtc3RyZWFt"
        );
        assert_eq!(encode_metadata(&[]), "");
    }

    #[test]
    fn test_header_u64() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_u64(&headers, "Upload-Offset").unwrap(), None);

        headers.insert("Upload-Offset", HeaderValue::from_static("1024"));
        assert_eq!(header_u64(&headers, "Upload-Offset").unwrap(), Some(1024));

        headers.insert("Upload-Offset", HeaderValue::from_static("abc"));
        assert!(header_u64(&headers, "Upload-Offset").is_err());
    }

    #[test]
    fn test_client_builds_without_token() {
        let config = UploadConfig::default();
        assert!(TusClient::new(&config).is_ok());
    }
}
