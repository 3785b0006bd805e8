use std::collections::HashMap;

use crate::{
    asset::AssetReference,
    directory::CoinDirectory,
    error::{ParseError, RefreshError},
    retry::RetryPolicy,
    sources::{PairSource, QuoteSource, TokenPair},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceResult {
    /// Ticker for plain tickers, the pair's base token symbol for token addresses.
    pub symbol: String,
    pub price: f64,
    pub resolved: bool,
}

impl PriceResult {
    fn resolved(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            resolved: true,
        }
    }
}

/// Prices keyed by the requested asset reference, plus whatever went wrong along the way.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub prices: HashMap<AssetReference, PriceResult>,
    pub errors: Vec<RefreshError>,
}

impl FetchOutcome {
    fn merge(&mut self, other: FetchOutcome) {
        self.prices.extend(other.prices);
        self.errors.extend(other.errors);
    }
}

pub struct PriceFetcher<Q, P> {
    quotes: Q,
    pairs: P,
    retry: RetryPolicy,
}

impl<Q: QuoteSource, P: PairSource> PriceFetcher<Q, P> {
    pub fn new(quotes: Q, pairs: P, retry: RetryPolicy) -> Self {
        Self { quotes, pairs, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches USD prices for `requested`: one batched request per source, both in flight at
    /// once. Tickers missing from `directory` are not requested at all.
    #[tracing::instrument(skip_all, fields(requested = requested.len()))]
    pub async fn fetch(&self, requested: &[AssetReference], directory: &CoinDirectory) -> FetchOutcome {
        let mut ids = Vec::new();
        let mut tickers_by_id: HashMap<String, Vec<AssetReference>> = HashMap::new();
        let mut addresses = Vec::new();

        for asset in requested {
            match asset {
                AssetReference::Ticker(symbol) => match directory.resolve(symbol) {
                    Some(id) => {
                        let tickers = tickers_by_id.entry(id.to_owned()).or_insert_with(|| {
                            ids.push(id.to_owned());
                            Vec::new()
                        });
                        if !tickers.contains(asset) {
                            tickers.push(asset.clone());
                        }
                    },
                    None => tracing::debug!(%asset, "no provider id for ticker, skipping"),
                },
                AssetReference::Token(address) => {
                    if !addresses.contains(address) {
                        addresses.push(address.clone());
                    }
                },
            }
        }

        tracing::debug!(?ids, ?addresses, "requesting prices");

        let (mut outcome, pairs) = tokio::join!(
            self.fetch_quotes(&ids, &tickers_by_id),
            self.fetch_pairs(&addresses)
        );
        outcome.merge(pairs);
        outcome
    }

    async fn fetch_quotes(&self, ids: &[String], tickers_by_id: &HashMap<String, Vec<AssetReference>>) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        if ids.is_empty() {
            return outcome;
        }

        match self
            .retry
            .with_retry(self.quotes.name(), || self.quotes.usd_quotes(ids))
            .await
        {
            Ok(quotes) => {
                for (id, price) in quotes {
                    let Some(tickers) = tickers_by_id.get(&id) else {
                        continue;
                    };
                    for asset in tickers {
                        outcome
                            .prices
                            .insert(asset.clone(), PriceResult::resolved(asset.to_string(), price));
                    }
                }
            },
            Err(err) => outcome.errors.push(err.into()),
        }

        outcome
    }

    async fn fetch_pairs(&self, addresses: &[String]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        if addresses.is_empty() {
            return outcome;
        }

        let pairs = match self
            .retry
            .with_retry(self.pairs.name(), || self.pairs.token_pairs(addresses))
            .await
        {
            Ok(pairs) => pairs,
            Err(err) => {
                outcome.errors.push(err.into());
                return outcome;
            },
        };

        // The first listed pair with a usable price wins for each address.
        for TokenPair {
            address,
            symbol,
            price_usd,
        } in pairs
        {
            if !addresses.contains(&address) {
                continue;
            }
            let asset = AssetReference::Token(address);
            if outcome.prices.contains_key(&asset) {
                continue;
            }
            let Some(raw) = price_usd else {
                tracing::debug!(%asset, "pair without USD price");
                continue;
            };

            match parse_price(&raw) {
                Some(price) => {
                    outcome.prices.insert(asset, PriceResult::resolved(symbol, price));
                },
                None => {
                    tracing::warn!(%asset, raw = raw.as_str(), "unable to parse pair price");
                    outcome.errors.push(ParseError { asset, raw }.into());
                },
            }
        }

        outcome
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|price| price.is_finite())
}
