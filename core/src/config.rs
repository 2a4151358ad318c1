//! Client configuration.
//!
//! Set once when a client is constructed and read-only afterwards.

use serde::Deserialize;

/// Path appended to a bare hostname to reach the versioned API.
pub const API_PATH: &str = "/api/v1";

/// Connection settings for a `TembaClient`.
///
/// `host` is either a bare hostname (`example.com`) or a full URL including
/// scheme (`http://localhost:8000/api/v1`), which is then used as the root
/// URL verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub token: String,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    #[serde(default)]
    pub debug: bool,
}

fn default_use_tls() -> bool {
    true
}

impl ClientConfig {
    pub fn new(host: &str, token: &str) -> Self {
        Self {
            host: host.to_string(),
            token: token.to_string(),
            use_tls: true,
            debug: false,
        }
    }

    /// Selects `https` (the default) or `http` for bare hostnames. Ignored
    /// when `host` already carries a scheme.
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Root URL every endpoint is resolved against.
    ///
    /// A host with an `http://` or `https://` scheme is used as given, except
    /// that one trailing `/` is dropped so endpoint URLs never contain `//`.
    /// Anything else is a bare hostname, even one that begins with "http".
    pub fn root_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.strip_suffix('/').unwrap_or(&self.host).to_string()
        } else {
            let scheme = if self.use_tls { "https" } else { "http" };
            format!("{scheme}://{}{API_PATH}", self.host)
        }
    }
}
