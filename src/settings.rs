use std::time::Duration;

use config::{Config, ConfigError};
use http_client::settings::HttpClientSettings;
use serde::{de::DeserializeOwned, Deserialize};
use serde_with::{serde_as, DurationSeconds};

use crate::{
    asset::AssetReference,
    customization::Customization,
    directory::CoinListSettings,
    retry::RetryPolicy,
    telemetry::TracingSettings,
};

pub static DEFAULT_SETTINGS_FILE: &str = "settings.toml";
pub static ENV_PREFIX: &str = "PRICE_OVERLAY";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub tracing: TracingSettings,
    pub coingecko: HttpClientSettings,
    pub dexscreener: HttpClientSettings,
    pub retry: RetryPolicy,
    pub refresh: RefreshSettings,
    pub coin_list: CoinListSettings,
    pub tickers: Vec<AssetReference>,
    pub customization: Customization,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracing: Default::default(),
            coingecko: Default::default(),
            dexscreener: Default::default(),
            retry: Default::default(),
            refresh: Default::default(),
            coin_list: Default::default(),
            tickers: default_tickers(),
            customization: Default::default(),
        }
    }
}

fn default_tickers() -> Vec<AssetReference> {
    vec![
        AssetReference::Ticker("BTC".into()),
        AssetReference::Ticker("ETH".into()),
    ]
}

#[serde_as]
#[derive(Debug, Deserialize, Eq, PartialEq, Clone, Copy)]
pub struct RefreshSettings {
    #[serde(rename = "interval_sec", default = "RefreshSettings::default_interval")]
    #[serde_as(as = "DurationSeconds")]
    pub interval: Duration,
}

impl RefreshSettings {
    fn default_interval() -> Duration {
        Duration::from_secs(120)
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
        }
    }
}

/// Returns settings file name from first argument (args[1]) or a default file name "settings.toml"
pub fn get_settings_file() -> String {
    std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_owned())
}

pub fn try_read_file_config<T, E>(file: &str, env_prefix: &str) -> Result<T, E>
where
    T: DeserializeOwned,
    E: From<ConfigError>,
{
    Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
        .build()
        .and_then(Config::try_deserialize)
        .map_err(Into::into)
}

pub fn read_file_config_or_default<T>(file: &str, env_prefix: &str) -> T
where
    T: DeserializeOwned + Default,
{
    try_read_file_config::<T, ConfigError>(file, env_prefix)
        .map_err(|error| {
            tracing::warn!("config error: {error}, going on with default config...");
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use claims::assert_ok;

    use super::*;

    fn write_settings(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings: Settings = assert_ok!(try_read_file_config::<_, ConfigError>(
            "/nonexistent/price-overlay",
            "PRICE_OVERLAY_TEST_MISSING"
        ));

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh.interval, Duration::from_secs(120));
        assert_eq!(settings.retry, RetryPolicy::default());
    }

    #[test]
    fn reads_toml_sections() {
        let path = write_settings(
            "price-overlay-settings",
            r##"
                tickers = ["sol", "token:0xAAA"]

                [refresh]
                interval_sec = 60

                [retry]
                max_attempts = 3
                initial_delay_ms = 1000

                [coingecko]
                api_key = "secret"

                [coin_list]
                path = "coingecko-ids.json"

                [customization]
                bg_color = "#000"
            "##,
        );

        let settings: Result<Settings, ConfigError> =
            try_read_file_config(path.to_str().unwrap(), "PRICE_OVERLAY_TEST_TOML");
        std::fs::remove_file(&path).unwrap();
        let settings = assert_ok!(settings);

        assert_eq!(settings.tickers, [
            AssetReference::Ticker("SOL".into()),
            AssetReference::Token("0xAAA".into()),
        ]);
        assert_eq!(settings.refresh.interval, Duration::from_secs(60));
        assert_eq!(settings.retry, RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        });
        assert_eq!(settings.coingecko.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.coin_list.path, Some(PathBuf::from("coingecko-ids.json")));
        assert_eq!(settings.customization.bg_color, "#000");
        assert_eq!(settings.customization.font_family, "Arial");
    }

    #[test]
    fn invalid_ticker_falls_back_to_defaults() {
        let path = write_settings("price-overlay-invalid", r#"tickers = ["BTC", "token:"]"#);

        let settings: Settings = read_file_config_or_default(path.to_str().unwrap(), "PRICE_OVERLAY_TEST_INVALID");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings, Settings::default());
    }
}
