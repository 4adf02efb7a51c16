//! Ledger persistence and reconciliation
//!
//! - [`LedgerStore`] owns the ledger of the selected working folder and is the
//!   only writer of the `.ledger` file
//! - [`LedgerReconciler`] adds newly exported files to the ledger

pub mod reconciler;
pub mod store;

pub use reconciler::{LedgerReconciler, ReconcileReport};
pub use store::LedgerStore;
