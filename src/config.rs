use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GridError, Result};
use crate::transport::TransportConfig;

/// Base URL used when neither the environment nor the credentials file names one.
pub const DEFAULT_BASE_URL: &str = "https://gridte.rsgis.erdc.dren.mil/te_ba/";

const CONFIG_DIR: &str = ".grid";
const CONFIG_FILE: &str = "config.json";

/// Contents of `~/.grid/config.json`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Base64 encoded `username:password`.
    #[serde(default)]
    pub auth: String,
    /// GRiD API key, sent as the `source` query parameter.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Skip TLS certificate verification for this installation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth", &redact(&self.auth))
            .field("key", &redact(&self.key))
            .field("url", &self.url)
            .field("insecure", &self.insecure)
            .finish()
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() { "" } else { "<redacted>" }
}

impl Credentials {
    pub fn from_login(username: &str, password: &str, key: &str, url: &str) -> Self {
        Self {
            auth: encode_basic_auth(username, password),
            key: key.trim().to_string(),
            url: url.trim().to_string(),
            insecure: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GridError::config(format!(
                "failed to read credentials file {}: {e}; run `grid configure`",
                path.display()
            ))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            GridError::config(format!(
                "credentials file {} is not valid JSON: {e}",
                path.display()
            ))
        })
    }

    /// Writes the credentials, creating the parent directory when needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GridError::io(format!("failed to create directory {}", parent.display()), e)
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GridError::config(format!("failed to encode credentials: {e}")))?;
        std::fs::write(path, json + "\n")
            .map_err(|e| GridError::io(format!("failed to write {}", path.display()), e))?;
        restrict_permissions(path)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| GridError::io(format!("failed to restrict {}", path.display()), e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

pub fn encode_basic_auth(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", username.trim(), password))
}

/// Location of the credentials file: `GRID_CONFIG`, else `~/.grid/config.json`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("GRID_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .ok_or_else(|| GridError::config("cannot determine home directory (set GRID_CONFIG)"))
}

/// Rewrites the credentials file, changing only the base URL.
pub fn update_base_url(path: &Path, url: &str) -> Result<Credentials> {
    let mut creds = Credentials::load(path)?;
    creds.url = url.trim().to_string();
    creds.save(path)?;
    Ok(creds)
}

/// Rewrites the credentials file, changing only the API key.
pub fn update_api_key(path: &Path, key: &str) -> Result<Credentials> {
    let mut creds = Credentials::load(path)?;
    creds.key = key.trim().to_string();
    creds.save(path)?;
    Ok(creds)
}

/// Credentials loaded at most once, on first use, and shared by every decorator
/// that needs them.
pub struct CredentialSource {
    path: Option<PathBuf>,
    auth_override: Option<String>,
    key_override: Option<String>,
    cell: OnceCell<Credentials>,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("path", &self.path)
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}

impl CredentialSource {
    /// Reads `path` lazily.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            auth_override: None,
            key_override: None,
            cell: OnceCell::new(),
        }
    }

    /// Uses credentials already in memory; never touches the filesystem.
    pub fn from_credentials(creds: Credentials) -> Self {
        Self {
            path: None,
            auth_override: None,
            key_override: None,
            cell: OnceCell::with_value(creds),
        }
    }

    /// The default file location, with `GRID_AUTH` / `GRID_KEY` taking precedence
    /// over the stored values.
    pub fn from_env() -> Result<Self> {
        let mut source = Self::from_path(config_path()?);
        source.auth_override = non_empty_env("GRID_AUTH");
        source.key_override = non_empty_env("GRID_KEY");
        Ok(source)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Result<&Credentials> {
        self.cell.get_or_try_init(|| self.load())
    }

    fn load(&self) -> Result<Credentials> {
        let overrides_complete = self.auth_override.is_some() && self.key_override.is_some();
        let mut creds = match &self.path {
            Some(path) if path.exists() => Credentials::load(path)?,
            Some(_) | None if overrides_complete => Credentials::default(),
            Some(path) => {
                return Err(GridError::config(format!(
                    "no credentials at {}; run `grid configure`",
                    path.display()
                )));
            }
            None => return Err(GridError::config("no credentials provided")),
        };

        if let Some(auth) = &self.auth_override {
            creds.auth = auth.clone();
        }
        if let Some(key) = &self.key_override {
            creds.key = key.clone();
        }
        tracing::debug!(path = ?self.path, "loaded GRiD credentials");
        Ok(creds)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Everything a [`crate::Client`] needs, resolved once at start-up.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every relative API path is resolved against. Always ends in `/`.
    pub url: String,
    pub credentials: Arc<CredentialSource>,
    pub transport: TransportConfig,
    /// Log every outgoing request at debug level.
    pub log_requests: bool,
}

impl ClientConfig {
    pub fn new(url: &str, credentials: CredentialSource) -> Self {
        Self {
            url: normalize_base_url(url),
            credentials: Arc::new(credentials),
            transport: TransportConfig::default(),
            log_requests: true,
        }
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.transport.verify_tls = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }
}

/// Resolves configuration with precedence: explicit argument, environment
/// (`GRID_URL`, `GRID_INSECURE`), credentials file, built-in default.
pub fn load_config(
    url: Option<String>,
    verify: Option<bool>,
    source: CredentialSource,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| non_empty_env("GRID_URL"));
    let mut verify = match verify {
        Some(verify) => Some(verify),
        None => non_empty_env("GRID_INSECURE")
            .map(|v| insecure_flag(&v).map(|insecure| !insecure))
            .transpose()?,
    };

    if url.is_none() || verify.is_none() {
        let creds = source.get()?;
        if url.is_none() && !creds.url.trim().is_empty() {
            url = Some(creds.url.clone());
        }
        if verify.is_none() {
            verify = Some(!creds.insecure);
        }
    }

    let url = url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    url::Url::parse(&url)
        .map_err(|e| GridError::config(format!("invalid base URL {url:?}: {e}")))?;

    Ok(ClientConfig::new(&url, source).with_verify_tls(verify.unwrap_or(true)))
}

/// Value of `GRID_INSECURE`. Only an explicit yes turns verification off.
fn insecure_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GridError::config(format!(
            "GRID_INSECURE must be one of 1/true/yes/on or 0/false/no/off, got {other:?}"
        ))),
    }
}

/// Relative paths only resolve *under* a base that ends in a slash.
pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Credentials {
        Credentials::from_login("alice", "s3cret", " KEY123 ", "https://grid.example/te_ba/")
    }

    #[test]
    fn login_is_base64_encoded() {
        let creds = sample();
        assert_eq!(creds.auth, "YWxpY2U6czNjcmV0");
        assert_eq!(creds.key, "KEY123");
    }

    #[test]
    fn save_then_load() -> Result<()> {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".grid").join("config.json");
        sample().save(&path)?;
        assert_eq!(Credentials::load(&path)?, sample());
        Ok(())
    }

    #[test]
    fn update_flows_touch_one_field() -> Result<()> {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        sample().save(&path)?;

        let updated = update_api_key(&path, "NEWKEY")?;
        assert_eq!(updated.key, "NEWKEY");
        assert_eq!(updated.auth, sample().auth);

        let updated = update_base_url(&path, "https://other.example/")?;
        assert_eq!(updated.url, "https://other.example/");
        assert_eq!(Credentials::load(&path)?.key, "NEWKEY");
        Ok(())
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let creds: Credentials = serde_json::from_str(r#"{"auth":"abc"}"#).expect("json");
        assert_eq!(creds.key, "");
        assert_eq!(creds.url, "");
        assert!(!creds.insecure);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = TempDir::new().expect("tempdir");
        let source = CredentialSource::from_path(dir.path().join("absent.json"));
        let err = source.get().expect_err("should fail");
        assert!(matches!(err, GridError::Config(_)));
        assert!(err.to_string().contains("grid configure"));
    }

    #[test]
    fn source_loads_once() -> Result<()> {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        sample().save(&path)?;

        let source = CredentialSource::from_path(&path);
        assert!(!source.is_loaded());
        assert_eq!(source.get()?.key, "KEY123");

        std::fs::remove_file(&path).expect("remove");
        assert_eq!(source.get()?.key, "KEY123");
        Ok(())
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("YWxpY2U6czNjcmV0"));
        assert!(!rendered.contains("KEY123"));
    }

    #[test]
    fn explicit_arguments_skip_the_file() -> Result<()> {
        let dir = TempDir::new().expect("tempdir");
        let source = CredentialSource::from_path(dir.path().join("absent.json"));
        let cfg = load_config(Some("https://grid.example/te_ba".into()), Some(true), source)?;
        assert_eq!(cfg.url, "https://grid.example/te_ba/");
        assert!(cfg.transport.verify_tls);
        assert!(!cfg.credentials.is_loaded());
        Ok(())
    }

    #[test]
    fn file_supplies_url_and_tls_opt_out() -> Result<()> {
        let mut creds = sample();
        creds.insecure = true;
        let cfg = load_config(None, None, CredentialSource::from_credentials(creds));
        // GRID_URL may be set in the developer's shell; only assert when it is not.
        if std::env::var("GRID_URL").is_err() && std::env::var("GRID_INSECURE").is_err() {
            let cfg = cfg?;
            assert_eq!(cfg.url, "https://grid.example/te_ba/");
            assert!(!cfg.transport.verify_tls);
        }
        Ok(())
    }

    #[test]
    fn insecure_flag_needs_an_explicit_yes() {
        for yes in ["1", "true", "TRUE", "Yes", "on"] {
            assert!(insecure_flag(yes).expect(yes), "{yes}");
        }
        for no in ["0", "false", "False", "FALSE", "no", "Off"] {
            assert!(!insecure_flag(no).expect(no), "{no}");
        }
    }

    #[test]
    fn unrecognised_insecure_value_is_a_config_error() {
        let err = insecure_flag("maybe").expect_err("must fail");
        assert!(matches!(err, GridError::Config(_)));
        assert!(err.to_string().contains("GRID_INSECURE"));
    }
}
