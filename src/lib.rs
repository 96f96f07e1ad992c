//! A Rust client for the GRiD AOI-management API.
//!
//! Every call is built by a [`RequestFactory`] that resolves a relative API
//! path against the configured base URL and runs a chain of [`Decorator`]s
//! (HTTP Basic auth, the `source` API key, request logging). Responses are
//! classified into an [`Outcome`] before being decoded, since GRiD sometimes
//! reports errors inside a `200 OK` body.
//!
//! ## Quick start
//! - Run `grid configure` once, or write `~/.grid/config.json` yourself
//!   (`{"auth": "<base64 user:pass>", "key": "<api key>"}`).
//! - Build a [`Client`] with [`Client::from_env`] and use the service façades.
//!
//! ```no_run
//! use gridapi::Client;
//!
//! fn main() -> gridapi::Result<()> {
//!     let client = Client::from_env()?;
//!     for aoi in client.aois().list(None)?.aoi_list {
//!         println!("{} {}", aoi.pk, aoi.name);
//!     }
//!
//!     let details = client.pk_details(42);
//!     if let Ok(export) = &details.export {
//!         for file in &export.export_files {
//!             client.download_file(file.pk, std::path::Path::new("."))?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod aoi;
mod client;
mod config;
mod download;
mod error;
mod export;
mod geonames;
mod request;
mod response;
mod task;
mod transport;
mod util;

#[cfg(test)]
mod testing;

pub use aoi::{
    AoiDetail, AoiList, AoiSummary, Aois, FileExportMode, GeneratedExport, PointcloudDataset,
    PointcloudExportOptions, RasterDataset, Terrain,
};
pub use client::{Client, PkDetails};
pub use config::{
    ClientConfig, CredentialSource, Credentials, DEFAULT_BASE_URL, config_path,
    encode_basic_auth, load_config, update_api_key, update_base_url,
};
pub use download::DownloadedFile;
pub use error::{GridError, Result};
pub use export::{Export, ExportDetail, ExportFile, Exports, Tda};
pub use geonames::{Geoname, Geonames};
pub use request::{
    API_KEY_PARAM, ApiKeyQuery, BasicAuth, Decorator, GridRequest, RequestFactory, RequestLogger,
    StaticBaseUrl,
};
pub use response::{Outcome, classify, classify_body};
pub use task::{TaskDetail, Tasks};
pub use transport::{Transport, TransportConfig};
