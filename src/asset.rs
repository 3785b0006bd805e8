use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidAssetReference;

/// Tag marking a contract-address reference, e.g. `token:0xABC...`.
pub const TOKEN_PREFIX: &str = "token:";

/// An asset the user wants displayed.
///
/// Tickers are stored upper-cased, so two tickers compare equal regardless of the case they were
/// entered in. Token addresses are kept exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssetReference {
    Ticker(String),
    Token(String),
}

impl AssetReference {
    pub fn ticker(symbol: &str) -> Result<Self, InvalidAssetReference> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(InvalidAssetReference::EmptyTicker);
        }
        Ok(Self::Ticker(symbol.to_uppercase()))
    }

    pub fn token(address: &str) -> Result<Self, InvalidAssetReference> {
        let address = address.trim();
        if address.is_empty() {
            return Err(InvalidAssetReference::EmptyAddress(format!("{TOKEN_PREFIX}{address}")));
        }
        Ok(Self::Token(address.to_owned()))
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    /// Parses a comma separated list such as `BTC, eth,token:0xAAA`. Blank items are skipped.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, InvalidAssetReference> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for AssetReference {
    type Err = InvalidAssetReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix(TOKEN_PREFIX) {
            Some(address) => Self::token(address),
            None => Self::ticker(s),
        }
    }
}

impl TryFrom<String> for AssetReference {
    type Error = InvalidAssetReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetReference> for String {
    fn from(value: AssetReference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticker(symbol) => f.write_str(symbol),
            Self::Token(address) => write!(f, "{TOKEN_PREFIX}{address}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err_eq, assert_ok_eq};

    use super::*;

    #[test]
    fn ticker_is_case_insensitive() {
        assert_eq!(AssetReference::from_str("btc"), AssetReference::from_str("BTC"));
        assert_ok_eq!("  eth ".parse::<AssetReference>(), AssetReference::Ticker("ETH".into()));
    }

    #[test]
    fn token_address_keeps_case() {
        let lower: AssetReference = "token:0xabc".parse().unwrap();
        let upper: AssetReference = "token:0xABC".parse().unwrap();

        assert_ne!(lower, upper);
        assert_eq!(upper, AssetReference::Token("0xABC".into()));
        assert!(upper.is_token());
        assert_eq!(upper.to_string(), "token:0xABC");
    }

    #[test]
    fn rejects_empty_references() {
        assert_err_eq!("".parse::<AssetReference>(), InvalidAssetReference::EmptyTicker);
        assert_err_eq!(
            "token:".parse::<AssetReference>(),
            InvalidAssetReference::EmptyAddress("token:".into())
        );
    }

    #[test]
    fn parse_list_skips_blanks() {
        assert_ok_eq!(AssetReference::parse_list("btc, ,token:0xAAA,"), vec![
            AssetReference::Ticker("BTC".into()),
            AssetReference::Token("0xAAA".into()),
        ]);
    }

    #[test]
    fn serde_uses_string_form() {
        let assets: Vec<AssetReference> = serde_json::from_str(r#"["sol", "token:0xAAA"]"#).unwrap();

        assert_eq!(assets[0], AssetReference::Ticker("SOL".into()));
        assert_eq!(
            serde_json::to_string(&assets).unwrap(),
            r#"["SOL","token:0xAAA"]"#
        );
        assert!(serde_json::from_str::<Vec<AssetReference>>(r#"["token:"]"#).is_err());
    }
}
