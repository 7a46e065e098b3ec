/// Default API base, matching the server's local development bind.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

/// Where the gateway sends requests and who it sends them as.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the `/api/v1` prefix, without a trailing slash.
    pub api_url: String,
    /// Bearer token for authenticated endpoints.
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: normalize_url(&api_url.into()),
            token,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                         |
    /// |----------------------|---------------------------------|
    /// | `CROWDLABEL_API_URL` | `http://localhost:3000/api/v1`  |
    /// | `CROWDLABEL_TOKEN`   | unset (anonymous)               |
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("CROWDLABEL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let token = std::env::var("CROWDLABEL_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(api_url, token)
    }
}

fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
