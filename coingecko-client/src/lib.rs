use std::collections::HashMap;

use anyhow::Context;
use http::{HeaderMap, HeaderName};
use http_client::settings::HttpClientSettings;
use serde_json::Value;
use types::SimplePrice;

pub mod types;

const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

pub struct CoingeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoingeckoClient {
    pub fn new(settings: HttpClientSettings) -> anyhow::Result<Self> {
        let default_base_url = if settings.api_key.is_some() {
            PRO_BASE_URL
        } else {
            PUBLIC_BASE_URL
        };
        let base_url = settings.base_url_or(default_base_url);

        let mut builder = settings.client_builder();

        if let Some(api_key) = settings.api_key {
            builder = builder.default_headers(HeaderMap::from_iter([(
                HeaderName::from_static("x-cg-pro-api-key"),
                api_key.try_into()?,
            )]));
        };

        let client = builder.build().context("Unable to build coingecko client")?;

        Ok(Self { client, base_url })
    }

    fn simple_price_url(&self, ids: &[String]) -> String {
        format!(
            "{base_url}/simple/price?ids={ids}&vs_currencies=usd",
            base_url = self.base_url,
            ids = ids.join(","),
        )
    }

    /// USD quotes for the given coin ids in a single round trip. Ids without a quote are absent.
    pub async fn simple_price_usd(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        let response = self.client.get(self.simple_price_url(ids)).send().await?;

        let response = response.error_for_status()?;

        Ok(response
            .json::<HashMap<String, SimplePrice>>()
            .await?
            .into_iter()
            .filter_map(|(id, price)| price.usd.map(|usd| (id, usd)))
            .collect())
    }

    /// The raw `/coins/list` document. Left untyped so that malformed records can be skipped
    /// one by one instead of failing the whole list.
    pub async fn coins_list(&self) -> anyhow::Result<Value> {
        let response = self
            .client
            .get(format!("{base_url}/coins/list", base_url = self.base_url))
            .send()
            .await?;

        let response = response.error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}
