use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    asset::AssetReference,
    error::{DirectoryLoadError, InvalidAssetReference},
    retry::RetryPolicy,
    sources::CoinListSource,
};

/// A `{symbol, id}` record of the bulk coin list. Either field may be missing in the wild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinRecord {
    pub symbol: Option<String>,
    pub id: Option<String>,
}

impl CoinRecord {
    pub fn new(symbol: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            id: Some(id.into()),
        }
    }

    fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_owned);
        Self {
            symbol: field("symbol"),
            id: field("id"),
        }
    }
}

/// Upper-cased ticker symbol to provider id. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinDirectory {
    ids: HashMap<String, String>,
}

impl CoinDirectory {
    /// Builds the directory, skipping incomplete records. When several records share a symbol
    /// the shortest id is kept, and the first one seen on equal length.
    pub fn build(records: impl IntoIterator<Item = CoinRecord>) -> Self {
        let mut ids = HashMap::new();

        for record in records {
            let (Some(symbol), Some(id)) = (record.symbol, record.id) else {
                continue;
            };
            if symbol.is_empty() || id.is_empty() {
                continue;
            }

            match ids.entry(symbol.to_uppercase()) {
                Entry::Vacant(entry) => {
                    entry.insert(id);
                },
                Entry::Occupied(mut entry) if id.len() < entry.get().len() => {
                    entry.insert(id);
                },
                Entry::Occupied(_) => {},
            }
        }

        Self { ids }
    }

    pub fn from_json(value: &Value) -> Result<Self, DirectoryLoadError> {
        match value {
            Value::Null => Err(DirectoryLoadError::Missing),
            Value::Array(coins) => Ok(Self::build(coins.iter().map(CoinRecord::from_value))),
            Value::Bool(_) => Err(DirectoryLoadError::NotASequence("a boolean")),
            Value::Number(_) => Err(DirectoryLoadError::NotASequence("a number")),
            Value::String(_) => Err(DirectoryLoadError::NotASequence("a string")),
            Value::Object(_) => Err(DirectoryLoadError::NotASequence("an object")),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DirectoryLoadError> {
        Self::from_json(&serde_json::from_slice(bytes)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, DirectoryLoadError> {
        Self::from_slice(&std::fs::read(path)?)
    }

    pub fn resolve(&self, symbol: &str) -> Option<&str> {
        self.ids.get(&symbol.to_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.resolve(symbol).is_some()
    }

    /// Accepts a user-entered tracked list only when every plain ticker is listed and no entry
    /// repeats. Token addresses are not checked against the directory.
    pub fn check_tracked(&self, tracked: &[AssetReference]) -> Result<(), InvalidAssetReference> {
        let mut seen = HashSet::new();
        for asset in tracked {
            if !seen.insert(asset) {
                return Err(InvalidAssetReference::Duplicate(asset.to_string()));
            }
            if let AssetReference::Ticker(symbol) = asset {
                if !self.contains(symbol) {
                    return Err(InvalidAssetReference::UnknownTicker(symbol.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoinListSettings {
    /// Bundled coin list document. When unset the list is fetched from the coin list source.
    pub path: Option<PathBuf>,
}

/// Loads the directory from the bundled file when configured, otherwise from `source`.
#[tracing::instrument(skip_all)]
pub async fn load<S: CoinListSource>(
    settings: &CoinListSettings,
    source: &S,
    retry: &RetryPolicy,
) -> Result<CoinDirectory, DirectoryLoadError> {
    let directory = match &settings.path {
        Some(path) => {
            tracing::debug!(?path, "reading bundled coin list");
            CoinDirectory::load_file(path)?
        },
        None => {
            let list = retry.with_retry(source.name(), || source.coin_list()).await?;
            CoinDirectory::from_json(&list)?
        },
    };

    tracing::info!(
        symbols = directory.len(),
        btc = ?directory.resolve("BTC"),
        eth = ?directory.resolve("ETH"),
        "coin list loaded"
    );
    Ok(directory)
}
