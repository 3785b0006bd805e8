use std::collections::HashMap;

use crate::{asset::AssetReference, fetcher::PriceResult};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub symbol: AssetReference,
    /// Text shown before the price: the source's symbol when known, the reference otherwise.
    pub label: String,
    pub display: String,
}

/// One row per tracked asset, in tracked order.
pub fn reconcile(tracked: &[AssetReference], results: &HashMap<AssetReference, PriceResult>) -> Vec<DisplayRow> {
    tracked
        .iter()
        .map(|asset| {
            let result = results
                .get(asset)
                .filter(|result| result.resolved && result.price.is_finite());
            DisplayRow {
                symbol: asset.clone(),
                label: result.map_or_else(|| asset.to_string(), |result| result.symbol.clone()),
                display: result.map_or_else(|| NOT_AVAILABLE.to_owned(), |result| format_usd(result.price)),
            }
        })
        .collect()
}

pub fn format_usd(price: f64) -> String {
    format!("${price:.2}")
}
