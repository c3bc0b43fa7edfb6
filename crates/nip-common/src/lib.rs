pub mod config;
pub mod error;
pub mod filestore;
pub mod region;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::Config;
pub use error::{NipError, Result, SerDeError, StorageError};
pub use filestore::{FileStore, HtmlStatus, storage_key};
pub use region::Region;
pub use smol_str::SmolStr;
