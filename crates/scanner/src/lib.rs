#![allow(clippy::collapsible_if)]
pub mod media;
pub mod reconcile;
pub mod walk;

pub use reconcile::{ReconcileReport, Reconciler, ScanError};
pub use walk::{FolderScan, ScanCandidate, scan_folder};
