//! Tracing setup.
//!
//! Logs go to stderr so stdout stays free for the console display. With `json = true` records
//! are written in bunyan format, otherwise in the human-readable `fmt` format.
//!
//! # Usage
//! ```no_run
//! use price_overlay::telemetry::{Telemetry, TracingSettings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let subscriber = Telemetry::init("price-overlay".into(), &TracingSettings::default());
//! Telemetry::init_subscriber(subscriber)?;
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use serde::Deserialize;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub struct Telemetry;

impl Telemetry {
    /// Compose the layers into a subscriber. `RUST_LOG` takes precedence over `settings.spec`.
    pub fn init(name: String, settings: &TracingSettings) -> impl Subscriber + Sync + Send {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.spec));

        let (json_storage, bunyan, plain) = if settings.json {
            (
                Some(JsonStorageLayer),
                Some(BunyanFormattingLayer::new(name, std::io::stderr)),
                None,
            )
        } else {
            (None, None, Some(fmt::layer().with_writer(std::io::stderr)))
        };

        Registry::default()
            .with(env_filter)
            .with(json_storage)
            .with(bunyan)
            .with(plain)
    }

    /// Register a subscriber as global default to process span data.
    ///
    /// It should only be called once!
    pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
        LogTracer::init().context("Failed to set logger")?;
        set_global_default(subscriber).context("Failed to set subscriber")?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct TracingSettings {
    #[serde(default = "default_spec")]
    pub spec: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            spec: default_spec(),
            json: false,
        }
    }
}

fn default_spec() -> String {
    "info".into()
}
