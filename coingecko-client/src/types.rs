use serde::{Deserialize, Serialize};

/// One entry of the `/simple/price` response, keyed by coin id.
/// Coins without a USD quote come back as an empty object.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct SimplePrice {
    #[serde(default)]
    pub usd: Option<f64>,
}
