use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;

#[serde_as]
#[derive(Deserialize, Eq, PartialEq, Debug, Clone)]
pub struct HttpClientSettings {
    #[serde(rename = "tcp_keepalive_sec", default = "HttpClientSettings::default_tcp_keepalive")]
    #[serde_as(as = "DurationSeconds")]
    pub tcp_keepalive: Duration,
    #[serde(
        rename = "pool_idle_timeout_sec",
        default = "HttpClientSettings::default_pool_idle_timeout"
    )]
    #[serde_as(as = "DurationSeconds")]
    pub pool_idle_timeout: Duration,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the provider's public endpoint, e.g. for a proxy or a local mock.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl HttpClientSettings {
    fn default_tcp_keepalive() -> Duration {
        Duration::from_secs(20)
    }

    fn default_pool_idle_timeout() -> Duration {
        Duration::from_secs(20)
    }

    pub fn client_builder(&self) -> reqwest::ClientBuilder {
        reqwest::ClientBuilder::new()
            .tcp_keepalive(Some(self.tcp_keepalive))
            .pool_idle_timeout(Some(self.pool_idle_timeout))
    }

    /// Base url without a trailing slash, falling back to `default` when none is configured.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_owned()
    }
}

impl TryFrom<&HttpClientSettings> for reqwest::Client {
    type Error = reqwest::Error;

    fn try_from(settings: &HttpClientSettings) -> Result<Self, Self::Error> {
        settings.client_builder().build()
    }
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            tcp_keepalive: Self::default_tcp_keepalive(),
            pool_idle_timeout: Self::default_pool_idle_timeout(),
            api_key: None,
            base_url: None,
        }
    }
}
