// SFM Importer - resumable upload of exported record files to SFM
// Copyright (c) 2025 SFM Importer Contributors
// Licensed under the MIT License

//! # SFM Importer
//!
//! Uploads the files of an export folder to the SFM import API over a
//! resumable (tus) protocol, keeping a durable per-folder ledger so an
//! interrupted import continues where it stopped.
//!
//! ## Overview
//!
//! - **Reconciling** a working folder into a `.ledger` of export files
//! - **Uploading** the organization file first, then patient and report files
//!   on a pool of workers
//! - **Resuming** partially uploaded files from the server's offset
//! - **Reporting** progress events and a run summary
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Ledger store, reconciliation, upload scheduling
//! - [`adapters`] - Resumable transfer client
//! - [`domain`] - Ledger model, identifiers, errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sfm_importer::adapters::tus::TusClient;
//! use sfm_importer::config::load_config;
//! use sfm_importer::core::ledger::{LedgerReconciler, LedgerStore};
//! use sfm_importer::core::upload::{ProgressReporter, SchedulerConfig, UploadScheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sfm-importer.toml")?;
//!
//!     let store = Arc::new(LedgerStore::new());
//!     LedgerReconciler::new(store.clone()).open("/data/export").await?;
//!
//!     let client = Arc::new(TusClient::new(&config.upload)?);
//!     let scheduler =
//!         UploadScheduler::new(store, client, SchedulerConfig::from_config(&config.upload));
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let summary = scheduler.run(shutdown_rx, ProgressReporter::disabled()).await?;
//!
//!     println!("Uploaded {} of {} files", summary.completed, summary.total_entries);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! The library returns [`domain::ImporterError`] for all errors. Failures of
//! individual file uploads are not errors: they are recorded in the ledger
//! and counted in the run summary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
