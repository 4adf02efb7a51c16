//! Core business logic for the importer.
//!
//! # Modules
//!
//! - [`ledger`] - Ledger persistence and folder reconciliation
//! - [`upload`] - Upload scheduling, progress reporting, and run summaries
//!
//! # Upload Workflow
//!
//! 1. **Open**: Load or create the `.ledger` of the working folder
//! 2. **Reconcile**: Add newly exported files as `NotStarted` entries
//! 3. **Organization**: Upload `ExportData.dat` before anything else
//! 4. **Workers**: Upload remaining entries concurrently
//! 5. **Report**: Emit a terminal event and return a summary
//!
//! # Example
//!
//! ```rust,no_run
//! use sfm_importer::adapters::tus::TusClient;
//! use sfm_importer::config::load_config;
//! use sfm_importer::core::ledger::{LedgerReconciler, LedgerStore};
//! use sfm_importer::core::upload::{ProgressReporter, SchedulerConfig, UploadScheduler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sfm-importer.toml")?;
//!
//! let store = Arc::new(LedgerStore::new());
//! LedgerReconciler::new(store.clone()).open("/data/export").await?;
//!
//! let client = Arc::new(TusClient::new(&config.upload)?);
//! let scheduler = UploadScheduler::new(store, client, SchedulerConfig::from_config(&config.upload));
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let summary = scheduler.run(shutdown_rx, ProgressReporter::disabled()).await?;
//!
//! println!("Completed: {}", summary.completed);
//! println!("Failed: {}", summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod upload;
