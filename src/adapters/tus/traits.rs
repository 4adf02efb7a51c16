//! Resumable transfer client trait
//!
//! The scheduler only depends on this trait, so tests can drive it with an
//! in-memory implementation while production uses the tus client.

use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Client for a resumable (tus-style) upload protocol
///
/// A transfer is created once and then uploaded any number of times. The
/// returned resume token identifies the remote upload and lets a later run
/// continue from the server's current offset.
///
/// # Example
///
/// ```no_run
/// use sfm_importer::adapters::tus::ResumableTransferClient;
/// use std::path::Path;
///
/// # async fn example(client: &dyn ResumableTransferClient) -> sfm_importer::domain::Result<()> {
/// let metadata = vec![("name".to_string(), "0001.pat".to_string())];
/// let token = client
///     .create("https://sfm.example.com/files/", 1024, &metadata)
///     .await?;
/// client.upload(&token, Path::new("/export/Patients/0001.pat"), 512 * 1024).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ResumableTransferClient: Send + Sync {
    /// Create a remote upload of `byte_length` bytes and return its resume token
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the creation or cannot be reached.
    async fn create(
        &self,
        address: &str,
        byte_length: u64,
        metadata: &[(String, String)],
    ) -> Result<String>;

    /// Upload the file behind `resume_token`, continuing from the remote offset
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any chunk is rejected.
    async fn upload(&self, resume_token: &str, file: &Path, chunk_size: usize) -> Result<()>;
}
