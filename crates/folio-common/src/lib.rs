//! folio-common: configuration, errors and logging setup shared by the folio crates.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::{Config, DownloadConfig, FileStore, Loader, Saver, default_config_path};
pub use crate::error::FolioError;
