//! Resumable upload adapter
//!
//! - [`ResumableTransferClient`] - the seam the scheduler talks to
//! - [`TusClient`] - tus 1.0.0 implementation over `reqwest`

pub mod client;
pub mod traits;

pub use client::{TusClient, DEFAULT_CHUNK_SIZE, TUS_VERSION};
pub use traits::ResumableTransferClient;
