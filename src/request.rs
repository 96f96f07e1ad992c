//! Request construction: resolve a relative API path against the base URL, then
//! run it through an ordered chain of [`Decorator`]s.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use url::Url;

use crate::config::CredentialSource;
use crate::error::{GridError, Result};

/// Query parameter GRiD expects the API key in.
pub const API_KEY_PARAM: &str = "source";

/// An outgoing request, mutable only while decorators run.
#[derive(Debug, Clone)]
pub struct GridRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl GridRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    pub(crate) fn into_body(self) -> Option<Vec<u8>> {
        self.body
    }

    /// Replaces any existing value, so repeated calls leave a single header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// All query pairs, decoded, in URL order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Sets `name` to exactly one `value`.
    ///
    /// The first existing occurrence is updated in place and later duplicates of
    /// `name` are dropped; every other parameter keeps its position and value.
    pub fn set_query_param(&mut self, name: &str, value: &str) {
        let mut pairs = self.query_pairs();
        let mut seen = false;
        pairs.retain_mut(|(k, v)| {
            if k != name {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.to_string();
            true
        });
        if !seen {
            pairs.push((name.to_string(), value.to_string()));
        }

        self.url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// A single request mutation. Implementations must be idempotent.
pub trait Decorator: Send + Sync {
    fn decorate(&self, request: &mut GridRequest) -> Result<()>;
}

/// Re-roots requests onto a fixed scheme, host and port.
#[derive(Debug, Clone)]
pub struct StaticBaseUrl {
    base: Url,
}

impl StaticBaseUrl {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| GridError::config(format!("invalid base URL {base:?}: {e}")))?;
        if base.host_str().is_none() {
            return Err(GridError::config(format!("base URL {base} has no host")));
        }
        Ok(Self { base })
    }
}

impl Decorator for StaticBaseUrl {
    fn decorate(&self, request: &mut GridRequest) -> Result<()> {
        let url = request.url_mut();
        let failed = |what: &str| GridError::config(format!("cannot apply base URL {}: {what}", self.base));

        url.set_scheme(self.base.scheme())
            .map_err(|()| failed("scheme"))?;
        url.set_host(self.base.host_str())
            .map_err(|e| failed(&e.to_string()))?;
        url.set_port(self.base.port()).map_err(|()| failed("port"))?;
        Ok(())
    }
}

/// `Authorization: Basic <auth>` from the stored credentials.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    source: Arc<CredentialSource>,
}

impl BasicAuth {
    pub fn new(source: Arc<CredentialSource>) -> Self {
        Self { source }
    }
}

impl Decorator for BasicAuth {
    fn decorate(&self, request: &mut GridRequest) -> Result<()> {
        let creds = self.source.get()?;
        let auth = creds.auth.trim();
        if auth.is_empty() {
            return Err(GridError::config(
                "no username/password stored; run `grid configure`",
            ));
        }

        let mut value = HeaderValue::from_str(&format!("Basic {auth}"))
            .map_err(|e| GridError::config(format!("stored auth token is not a valid header: {e}")))?;
        value.set_sensitive(true);
        request.set_header(AUTHORIZATION, value);
        Ok(())
    }
}

/// The API key as the `source` query parameter.
#[derive(Debug, Clone)]
pub struct ApiKeyQuery {
    source: Arc<CredentialSource>,
}

impl ApiKeyQuery {
    pub fn new(source: Arc<CredentialSource>) -> Self {
        Self { source }
    }
}

impl Decorator for ApiKeyQuery {
    fn decorate(&self, request: &mut GridRequest) -> Result<()> {
        let key = self.source.get()?.key.trim();
        if key.is_empty() {
            return Err(GridError::config(
                "no API key stored; run `grid configure -k <key>`",
            ));
        }
        request.set_query_param(API_KEY_PARAM, key);
        Ok(())
    }
}

/// Logs the rendered request at debug level, with the API key masked.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger;

impl Decorator for RequestLogger {
    fn decorate(&self, request: &mut GridRequest) -> Result<()> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let headers: Vec<&str> = request.headers().keys().map(HeaderName::as_str).collect();
            tracing::debug!(
                method = %request.method(),
                url = %redacted_url(request.url()),
                headers = ?headers,
                "outgoing GRiD request"
            );
        }
        Ok(())
    }
}

pub(crate) fn redacted_url(url: &Url) -> Url {
    let mut out = url.clone();
    if out.query().is_none() {
        return out;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == API_KEY_PARAM { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Builds decorated requests relative to one base URL.
pub struct RequestFactory {
    base: Url,
    decorators: Vec<Box<dyn Decorator>>,
}

impl std::fmt::Debug for RequestFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestFactory")
            .field("base", &self.base.as_str())
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

impl RequestFactory {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| GridError::config(format!("invalid base URL {base:?}: {e}")))?;
        Ok(Self {
            base,
            decorators: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn add_decorator(&mut self, decorator: impl Decorator + 'static) {
        self.decorators.push(Box::new(decorator));
    }

    pub fn with_decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.add_decorator(decorator);
        self
    }

    /// Resolves `relative` (RFC 3986) against the base and applies every
    /// decorator in registration order. The first decorator error aborts.
    pub fn new_request(&self, method: Method, relative: &str) -> Result<GridRequest> {
        let url = self.base.join(relative).map_err(|e| {
            GridError::validation(format!("invalid request path {relative:?}: {e}"))
        })?;

        let mut request = GridRequest::new(method, url);
        for decorator in &self.decorators {
            decorator.decorate(&mut request)?;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    const BASE: &str = "https://grid.example/te_ba/";

    fn source(auth: &str, key: &str) -> Arc<CredentialSource> {
        Arc::new(CredentialSource::from_credentials(Credentials {
            auth: auth.into(),
            key: key.into(),
            ..Credentials::default()
        }))
    }

    fn factory(src: &Arc<CredentialSource>) -> RequestFactory {
        RequestFactory::new(BASE)
            .expect("factory")
            .with_decorator(BasicAuth::new(src.clone()))
            .with_decorator(ApiKeyQuery::new(src.clone()))
            .with_decorator(RequestLogger)
    }

    #[test]
    fn relative_paths_resolve_under_the_base() {
        let req = RequestFactory::new(BASE)
            .expect("factory")
            .new_request(Method::GET, "api/v2/aoi/12")
            .expect("request");
        assert_eq!(req.url().as_str(), "https://grid.example/te_ba/api/v2/aoi/12");
    }

    #[test]
    fn absolute_paths_replace_the_base_path() {
        let req = RequestFactory::new(BASE)
            .expect("factory")
            .new_request(Method::GET, "/other/thing")
            .expect("request");
        assert_eq!(req.url().as_str(), "https://grid.example/other/thing");
    }

    #[test]
    fn own_query_survives_decoration() {
        let src = source("dXNlcjpwdw==", "KEY");
        let req = factory(&src)
            .new_request(Method::GET, "api/v2/aoi/1/generate/pointcloud?products=a&products=b&hsrs=4326")
            .expect("request");

        assert_eq!(
            req.query_pairs(),
            vec![
                ("products".to_string(), "a".to_string()),
                ("products".to_string(), "b".to_string()),
                ("hsrs".to_string(), "4326".to_string()),
                ("source".to_string(), "KEY".to_string()),
            ]
        );
        assert_eq!(req.headers()[AUTHORIZATION], "Basic dXNlcjpwdw==");
    }

    #[test]
    fn decorators_are_idempotent() {
        let src = source("YTpi", "KEY");
        let mut req = factory(&src)
            .new_request(Method::GET, "api/v2/geoname?geom=POINT(1%202)")
            .expect("request");
        let once = req.clone();

        BasicAuth::new(src.clone()).decorate(&mut req).expect("auth");
        ApiKeyQuery::new(src.clone()).decorate(&mut req).expect("key");

        assert_eq!(req.url(), once.url());
        assert_eq!(req.headers().get_all(AUTHORIZATION).iter().count(), 1);
        let sources = req.query_pairs().into_iter().filter(|(k, _)| k == "source").count();
        assert_eq!(sources, 1);
    }

    #[test]
    fn existing_source_param_is_replaced_not_duplicated() {
        let src = source("YTpi", "KEY");
        let req = factory(&src)
            .new_request(Method::GET, "api/v2/aoi?source=old&geom=x&source=older")
            .expect("request");
        assert_eq!(
            req.query_pairs(),
            vec![
                ("source".to_string(), "KEY".to_string()),
                ("geom".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn failing_decorator_aborts_construction() {
        let src = source("", "KEY");
        let err = factory(&src)
            .new_request(Method::GET, "api/v2/aoi")
            .expect_err("missing auth must abort");
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let src = source("YTpi", "  ");
        let err = factory(&src)
            .new_request(Method::GET, "api/v2/aoi")
            .expect_err("missing key must abort");
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn static_base_url_reroots_origin() {
        let mut req = GridRequest::new(
            Method::GET,
            Url::parse("https://grid.example/te_ba/api/v2/aoi?geom=x").expect("url"),
        );
        let deco = StaticBaseUrl::new("http://localhost:8081/").expect("base");
        deco.decorate(&mut req).expect("decorate");
        deco.decorate(&mut req).expect("decorate twice");
        assert_eq!(req.url().as_str(), "http://localhost:8081/te_ba/api/v2/aoi?geom=x");
    }

    #[test]
    fn redaction_masks_only_the_key() {
        let url = Url::parse("https://h/api?geom=x&source=SECRET").expect("url");
        let shown = redacted_url(&url).to_string();
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("geom=x"));
    }
}
