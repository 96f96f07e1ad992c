use httpmock::MockServer;
use std::time::Duration;

use crate::Client;
use crate::config::{ClientConfig, CredentialSource, Credentials};

/// Base64 of `a:b`.
pub(crate) const AUTH: &str = "YTpi";
pub(crate) const KEY: &str = "KEY";

pub(crate) fn credentials() -> Credentials {
    Credentials {
        auth: AUTH.to_string(),
        key: KEY.to_string(),
        ..Credentials::default()
    }
}

pub(crate) fn mock_server() -> MockServer {
    MockServer::start()
}

pub(crate) fn client_for(server: &MockServer) -> Client {
    let config = ClientConfig::new(
        &server.base_url(),
        CredentialSource::from_credentials(credentials()),
    );
    Client::new(config).expect("client").with_progress(false)
}

/// A client whose base URL refuses connections; any request that reaches the
/// transport fails with `GridError::Transport`.
pub(crate) fn unreachable_client() -> Client {
    let config = ClientConfig::new(
        "http://127.0.0.1:9/",
        CredentialSource::from_credentials(credentials()),
    )
    .with_timeout(Duration::from_secs(2));
    Client::new(config).expect("client").with_progress(false)
}
