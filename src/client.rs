use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use crate::aoi::{AoiDetail, Aois};
use crate::config::{ClientConfig, CredentialSource, load_config};
use crate::error::Result;
use crate::export::{ExportDetail, Exports};
use crate::geonames::Geonames;
use crate::request::{ApiKeyQuery, BasicAuth, Decorator, GridRequest, RequestFactory, RequestLogger};
use crate::response::{Outcome, classify};
use crate::task::Tasks;
use crate::transport::Transport;

/// Entry point for every GRiD API call.
///
/// Holds the request factory (with its decorator chain) and the single shared
/// transport. Cheap to share by reference across threads.
#[derive(Debug)]
pub struct Client {
    pub(crate) factory: RequestFactory,
    pub(crate) transport: Transport,
    pub(crate) credentials: Arc<CredentialSource>,
    pub(crate) progress: bool,
}

/// Both halves of a primary-key lookup. GRiD primary keys are not typed, so a
/// key is looked up as an AOI and as an export at the same time; each leg keeps
/// its own outcome.
#[derive(Debug)]
pub struct PkDetails {
    pub pk: i64,
    pub aoi: Result<AoiDetail>,
    pub export: Result<ExportDetail>,
}

impl PkDetails {
    pub fn both_failed(&self) -> bool {
        self.aoi.is_err() && self.export.is_err()
    }
}

impl Client {
    /// Creates a client from the environment and `~/.grid/config.json`.
    pub fn from_env() -> Result<Self> {
        Self::new(load_config(None, None, CredentialSource::from_env()?)?)
    }

    /// Builds the request factory with the standard decorators (Basic auth,
    /// API key, request logging) and the shared transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut factory = RequestFactory::new(&config.url)?;
        factory.add_decorator(BasicAuth::new(config.credentials.clone()));
        factory.add_decorator(ApiKeyQuery::new(config.credentials.clone()));
        if config.log_requests {
            factory.add_decorator(RequestLogger);
        }

        let transport = Transport::new(&config.transport)?;

        Ok(Self {
            factory,
            transport,
            credentials: config.credentials,
            progress: true,
        })
    }

    /// Show a progress bar on stderr while downloading.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Appends a decorator after the standard ones.
    pub fn add_decorator(&mut self, decorator: impl Decorator + 'static) {
        self.factory.add_decorator(decorator);
    }

    pub fn base_url(&self) -> &Url {
        self.factory.base_url()
    }

    pub fn credentials(&self) -> &CredentialSource {
        &self.credentials
    }

    pub fn aois(&self) -> Aois<'_> {
        Aois::new(self)
    }

    pub fn exports(&self) -> Exports<'_> {
        Exports::new(self)
    }

    pub fn geonames(&self) -> Geonames<'_> {
        Geonames::new(self)
    }

    pub fn tasks(&self) -> Tasks<'_> {
        Tasks::new(self)
    }

    /// A fully decorated request for `path`, relative to the base URL.
    pub fn request(&self, method: Method, path: &str) -> Result<GridRequest> {
        self.factory.new_request(method, path)
    }

    /// Sends `request` and classifies the response.
    pub fn execute(&self, request: GridRequest) -> Outcome {
        classify(self.transport.send(request))
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        self.execute(request).decode()
    }

    /// Fetches AOI detail and export detail for `pk` concurrently.
    pub fn pk_details(&self, pk: i64) -> PkDetails {
        std::thread::scope(|s| {
            let aoi = s.spawn(|| self.aois().get(pk));
            let export = s.spawn(|| self.exports().get(pk));

            let aoi = aoi.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            let export = export.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            PkDetails { pk, aoi, export }
        })
    }
}
