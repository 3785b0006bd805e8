use anyhow::Context;
use http_client::settings::HttpClientSettings;
use types::{Pair, TokensResponse};

pub mod types;

pub static DEFAULT_URL: &str = "https://api.dexscreener.com/latest/dex";

#[derive(Clone)]
pub struct DexscreenerClient {
    client: reqwest::Client,
    base_url: String,
}

impl DexscreenerClient {
    pub fn new(settings: HttpClientSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::try_from(&settings).context("Unable to build dexscreener client")?;

        Ok(Self {
            client,
            base_url: settings.base_url_or(DEFAULT_URL),
        })
    }

    fn tokens_url(&self, addresses: &[String]) -> String {
        format!(
            "{base_url}/tokens/{addresses}",
            base_url = self.base_url,
            addresses = addresses.join(",")
        )
    }

    /// All pairs known for the given token addresses, fetched in a single round trip.
    pub async fn token_pairs(&self, addresses: &[String]) -> anyhow::Result<Vec<Pair>> {
        let response = self.client.get(self.tokens_url(addresses)).send().await?;

        let response = response.error_for_status()?;

        Ok(response.json::<TokensResponse>().await?.pairs.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_ok};

    use super::*;

    #[test]
    fn tokens_url_joins_addresses() {
        let client = DexscreenerClient::new(HttpClientSettings::default()).unwrap();

        assert_eq!(
            client.tokens_url(&["0xAAA".into(), "0xBBB".into()]),
            "https://api.dexscreener.com/latest/dex/tokens/0xAAA,0xBBB"
        );
    }

    #[test]
    fn deserialize_pairs() {
        let response: TokensResponse = serde_json::from_str(
            r#"{
                "schemaVersion": "1.0.0",
                "pairs": [
                    {
                        "chainId": "ethereum",
                        "baseToken": {"address": "0xAAA", "name": "Foo", "symbol": "FOO"},
                        "quoteToken": {"address": "0xC02", "name": "Wrapped Ether", "symbol": "WETH"},
                        "priceNative": "0.0000012",
                        "priceUsd": "0.0042"
                    },
                    {
                        "baseToken": {"address": "0xAAA", "symbol": "FOO"}
                    }
                ]
            }"#,
        )
        .unwrap();

        let pairs = response.pairs.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].base_token.symbol, "FOO");
        assert_eq!(pairs[0].price_usd.as_deref(), Some("0.0042"));
        assert_none!(&pairs[1].price_usd);
    }

    #[test]
    fn deserialize_null_pairs() {
        let response: TokensResponse = serde_json::from_str(r#"{"schemaVersion": "1.0.0", "pairs": null}"#).unwrap();

        assert_none!(response.pairs);
    }

    #[tokio::test]
    #[ignore = "integration test"]
    async fn fetch_weth_pairs() {
        let client = DexscreenerClient::new(HttpClientSettings::default()).unwrap();

        let pairs = assert_ok!(
            client
                .token_pairs(&["0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".into()])
                .await
        );

        assert!(!pairs.is_empty());
    }
}
