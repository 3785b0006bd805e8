pub mod asset;
pub mod customization;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod reconcile;
pub mod retry;
pub mod scheduler;
pub mod settings;
pub mod sources;
pub mod telemetry;

pub use asset::AssetReference;
pub use directory::CoinDirectory;
pub use fetcher::{FetchOutcome, PriceFetcher, PriceResult};
pub use reconcile::{reconcile, DisplayRow};
pub use retry::RetryPolicy;
pub use scheduler::{RefreshScheduler, SchedulerHandle, Session, UiEvent};
