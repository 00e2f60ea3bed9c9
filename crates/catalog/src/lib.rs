#![allow(clippy::collapsible_if)]
pub mod admin;
pub mod cache;
pub mod catalog;
pub mod events;
pub mod maintenance;
pub mod metrics;
pub mod sessions;

use mediacat_core::identity::IdentityError;
use mediacat_db::DbError;
use mediacat_scanner::ScanError;
use thiserror::Error;

pub use cache::{Snapshot, VideoCache};
pub use catalog::{CacheRefresh, Catalog, ReloadSummary};
pub use events::VideoUpdate;
pub use maintenance::{MaintenanceConfig, MaintenanceHandle};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("video update channel closed")]
    ChannelClosed,
}
