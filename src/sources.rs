use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use coingecko_client::CoingeckoClient;
use dexscreener_client::{types::Pair, DexscreenerClient};
use serde_json::Value;

/// A pair listing for a token address, as reported by an on-chain pair source.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPair {
    pub address: String,
    pub symbol: String,
    pub price_usd: Option<String>,
}

impl From<Pair> for TokenPair {
    fn from(pair: Pair) -> Self {
        Self {
            address: pair.base_token.address,
            symbol: pair.base_token.symbol,
            price_usd: pair.price_usd,
        }
    }
}

/// Aggregate quote source: USD prices keyed by provider id.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn usd_quotes(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>>;
}

/// On-chain pair source: pairs for a batch of token addresses.
#[async_trait]
pub trait PairSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn token_pairs(&self, addresses: &[String]) -> anyhow::Result<Vec<TokenPair>>;
}

/// Supplier of the bulk `{symbol, id}` coin list.
#[async_trait]
pub trait CoinListSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn coin_list(&self) -> anyhow::Result<Value>;
}

#[async_trait]
impl QuoteSource for CoingeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    #[tracing::instrument(skip(self), err)]
    async fn usd_quotes(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        self.simple_price_usd(ids).await
    }
}

#[async_trait]
impl CoinListSource for CoingeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    #[tracing::instrument(skip(self), err)]
    async fn coin_list(&self) -> anyhow::Result<Value> {
        self.coins_list().await
    }
}

#[async_trait]
impl PairSource for DexscreenerClient {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    #[tracing::instrument(skip(self), err)]
    async fn token_pairs(&self, addresses: &[String]) -> anyhow::Result<Vec<TokenPair>> {
        Ok(DexscreenerClient::token_pairs(self, addresses)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

#[async_trait]
impl<T: QuoteSource + ?Sized> QuoteSource for Arc<T> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn usd_quotes(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        self.as_ref().usd_quotes(ids).await
    }
}

#[async_trait]
impl<T: PairSource + ?Sized> PairSource for Arc<T> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn token_pairs(&self, addresses: &[String]) -> anyhow::Result<Vec<TokenPair>> {
        self.as_ref().token_pairs(addresses).await
    }
}
