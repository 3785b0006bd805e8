use std::io;

use strum_macros::IntoStaticStr;
use thiserror::Error;

use crate::asset::AssetReference;

#[derive(Debug, Error)]
pub enum DirectoryLoadError {
    #[error("coin list is missing")]
    Missing,

    #[error("coin list is not a sequence but {0}")]
    NotASequence(&'static str),

    #[error("unable to read coin list: {0}")]
    Io(#[from] io::Error),

    #[error("unable to parse coin list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unable to fetch coin list: {0}")]
    Fetch(#[from] FetchExhaustedError),
}

/// A price source stayed unreachable for the whole retry budget.
#[derive(Debug, Error)]
#[error("{source_name} unreachable after {attempts} attempts: {last_error:#}")]
pub struct FetchExhaustedError {
    pub source_name: &'static str,
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to parse price {raw:?} for {asset}")]
pub struct ParseError {
    pub asset: AssetReference,
    pub raw: String,
}

/// Recoverable failures of a single refresh cycle.
#[derive(Debug, Error, IntoStaticStr)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchExhaustedError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl RefreshError {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidAssetReference {
    #[error("empty ticker")]
    EmptyTicker,

    #[error("empty token address in {0:?}")]
    EmptyAddress(String),

    #[error("ticker {0} is not in the coin list")]
    UnknownTicker(String),

    #[error("{0} is listed more than once")]
    Duplicate(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("refresh scheduler has stopped")]
pub struct SchedulerClosed;
