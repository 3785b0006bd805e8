use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokensResponse {
    /// `null` when none of the requested addresses has a pair.
    #[serde(default)]
    pub pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub base_token: BaseToken,
    /// Decimal string, e.g. `"0.0042"`. Missing for pairs without a USD route.
    #[serde(default)]
    pub price_usd: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BaseToken {
    pub address: String,
    pub symbol: String,
}
