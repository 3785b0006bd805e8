use serde::Deserialize;

/// Overlay styling. The engine never interprets it, it only hands it to the UI with every update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Customization {
    pub font_family: String,
    pub bg_color: String,
    pub ticker_color: String,
    pub price_color: String,
    pub ticker_size: u32,
    pub price_size: u32,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            font_family: "Arial".into(),
            bg_color: "#333".into(),
            ticker_color: "#ffd700".into(),
            price_color: "#90ee90".into(),
            ticker_size: 20,
            price_size: 20,
        }
    }
}
