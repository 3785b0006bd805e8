use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::{self, MissedTickBehavior},
};

use crate::{
    asset::AssetReference,
    customization::Customization,
    directory::CoinDirectory,
    error::{RefreshError, SchedulerClosed},
    fetcher::PriceFetcher,
    reconcile::{reconcile, DisplayRow},
    sources::{PairSource, QuoteSource},
};

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Everything a refresh cycle reads. Replaced as a whole on every change notification.
#[derive(Debug, Clone)]
pub struct Session {
    pub directory: Arc<CoinDirectory>,
    pub tracked: Arc<[AssetReference]>,
    pub customization: Customization,
}

impl Session {
    pub fn new(
        directory: impl Into<Arc<CoinDirectory>>,
        tracked: Vec<AssetReference>,
        customization: Customization,
    ) -> Self {
        Self {
            directory: directory.into(),
            tracked: tracked.into(),
            customization,
        }
    }

    fn with(&self, notification: Notification) -> Self {
        let mut next = self.clone();
        match notification {
            Notification::TrackedAssets(tracked) => next.tracked = tracked.into(),
            Notification::Customization(customization) => next.customization = customization,
            Notification::Directory(directory) => next.directory = Arc::new(directory),
        }
        next
    }
}

#[derive(Debug, strum_macros::IntoStaticStr)]
pub enum Notification {
    TrackedAssets(Vec<AssetReference>),
    Customization(Customization),
    Directory(CoinDirectory),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub rows: Vec<DisplayRow>,
    pub customization: Customization,
}

/// What the engine hands to the UI surface.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Render(DisplayUpdate),
    Warning(String),
}

#[derive(Debug)]
pub struct CycleReport {
    pub rows: Vec<DisplayRow>,
    pub errors: Vec<RefreshError>,
}

/// One fetch-and-reconcile pass over `session`.
pub async fn run_cycle<Q: QuoteSource, P: PairSource>(fetcher: &PriceFetcher<Q, P>, session: &Session) -> CycleReport {
    let outcome = fetcher.fetch(&session.tracked, &session.directory).await;
    CycleReport {
        rows: reconcile(&session.tracked, &outcome.prices),
        errors: outcome.errors,
    }
}

/// Sends change notifications to a running [`RefreshScheduler`]. Each one triggers a refresh.
#[derive(Clone)]
pub struct SchedulerHandle {
    notifications: UnboundedSender<Notification>,
}

impl SchedulerHandle {
    fn notify(&self, notification: Notification) -> Result<(), SchedulerClosed> {
        self.notifications.send(notification).map_err(|_| SchedulerClosed)
    }

    pub fn update_tracked(&self, tracked: Vec<AssetReference>) -> Result<(), SchedulerClosed> {
        self.notify(Notification::TrackedAssets(tracked))
    }

    pub fn apply_customization(&self, customization: Customization) -> Result<(), SchedulerClosed> {
        self.notify(Notification::Customization(customization))
    }

    pub fn replace_directory(&self, directory: CoinDirectory) -> Result<(), SchedulerClosed> {
        self.notify(Notification::Directory(directory))
    }
}

/// Refreshes prices on a fixed period and whenever a notification arrives.
///
/// Refreshes never overlap: notifications received while a refresh is in flight are queued and
/// folded into a single trailing refresh once it finishes.
pub struct RefreshScheduler<Q, P> {
    fetcher: PriceFetcher<Q, P>,
    session: Session,
    period: Duration,
    notifications: UnboundedReceiver<Notification>,
    ui: UnboundedSender<UiEvent>,
}

impl<Q: QuoteSource, P: PairSource> RefreshScheduler<Q, P> {
    pub fn new(
        fetcher: PriceFetcher<Q, P>,
        session: Session,
        period: Duration,
        ui: UnboundedSender<UiEvent>,
    ) -> (Self, SchedulerHandle) {
        if period < MIN_PERIOD {
            tracing::warn!(?period, min = ?MIN_PERIOD, "refresh period too short, clamping");
        }
        let (notifications_tx, notifications) = mpsc::unbounded_channel();

        let scheduler = Self {
            fetcher,
            session,
            period: period.max(MIN_PERIOD),
            notifications,
            ui,
        };

        (scheduler, SchedulerHandle {
            notifications: notifications_tx,
        })
    }

    /// Runs until every [`SchedulerHandle`] is dropped or the UI receiver goes away.
    pub async fn run(mut self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => tracing::debug!("periodic refresh"),
                notification = self.notifications.recv() => match notification {
                    Some(notification) => self.apply(notification),
                    None => {
                        tracing::info!("all scheduler handles dropped, stopping");
                        break;
                    },
                },
            }

            while let Ok(notification) = self.notifications.try_recv() {
                self.apply(notification);
            }

            if !self.refresh().await {
                tracing::info!("ui receiver dropped, stopping");
                break;
            }
            interval.reset();
        }
    }

    fn apply(&mut self, notification: Notification) {
        let kind: &'static str = (&notification).into();
        tracing::debug!(kind, "change notification");
        self.session = self.session.with(notification);
    }

    /// Returns `false` once the UI side is gone.
    #[tracing::instrument(skip_all, fields(tracked = self.session.tracked.len()))]
    async fn refresh(&self) -> bool {
        let CycleReport { rows, errors } = run_cycle(&self.fetcher, &self.session).await;

        let update = DisplayUpdate {
            rows,
            customization: self.session.customization.clone(),
        };
        if self.ui.send(UiEvent::Render(update)).is_err() {
            return false;
        }

        for error in errors {
            tracing::warn!(kind = error.kind(), %error, "refresh cycle degraded");
            if self.ui.send(UiEvent::Warning(error.to_string())).is_err() {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::Result;
    use async_trait::async_trait;
    use claims::assert_err_eq;
    use tokio::{sync::Semaphore, time::Instant};

    use super::*;
    use crate::{
        directory::CoinRecord,
        fetcher::tests::{assets, directory, FakePairs, FakeQuotes},
        retry::RetryPolicy,
    };

    const PERIOD: Duration = Duration::from_secs(120);

    /// Quote source that reports each request and then blocks until the test releases it.
    struct GatedQuotes {
        gate: Semaphore,
        requests: UnboundedSender<Vec<String>>,
    }

    #[async_trait]
    impl QuoteSource for GatedQuotes {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn usd_quotes(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
            self.requests.send(ids.to_vec()).unwrap();
            self.gate.acquire().await.unwrap().forget();
            Ok(ids.iter().map(|id| (id.clone(), 1.0)).collect())
        }
    }

    async fn next_render(ui: &mut UnboundedReceiver<UiEvent>) -> DisplayUpdate {
        match ui.recv().await {
            Some(UiEvent::Render(update)) => update,
            other => panic!("expected a render, got {other:?}"),
        }
    }

    fn displays(update: &DisplayUpdate) -> Vec<(String, String)> {
        update
            .rows
            .iter()
            .map(|row| (row.symbol.to_string(), row.display.clone()))
            .collect()
    }

    fn pair(symbol: &str, display: &str) -> (String, String) {
        (symbol.to_owned(), display.to_owned())
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_during_refresh_coalesce_into_one_trailing_refresh() {
        let (requests_tx, mut requests) = mpsc::unbounded_channel();
        let quotes = Arc::new(GatedQuotes {
            gate: Semaphore::new(0),
            requests: requests_tx,
        });
        let fetcher = PriceFetcher::new(quotes.clone(), FakePairs::default(), RetryPolicy::default());
        let session = Session::new(directory(), assets("BTC"), Customization::default());
        let (ui_tx, mut ui) = mpsc::unbounded_channel();
        let (scheduler, handle) = RefreshScheduler::new(fetcher, session, PERIOD, ui_tx);
        let task = tokio::spawn(scheduler.run());

        assert_eq!(requests.recv().await.unwrap(), ["bitcoin"]);

        let customization = Customization {
            bg_color: "#000".into(),
            ..Default::default()
        };
        handle.update_tracked(assets("ETH")).unwrap();
        handle.update_tracked(assets("SOL")).unwrap();
        handle.apply_customization(customization.clone()).unwrap();
        quotes.gate.add_permits(1);

        let first = next_render(&mut ui).await;
        assert_eq!(displays(&first), [pair("BTC", "$1.00")]);
        assert_eq!(first.customization, Customization::default());

        assert_eq!(requests.recv().await.unwrap(), ["solana"]);
        quotes.gate.add_permits(1);

        let second = next_render(&mut ui).await;
        assert_eq!(displays(&second), [pair("SOL", "$1.00")]);
        assert_eq!(second.customization, customization);

        let idle_since = Instant::now();
        assert_eq!(requests.recv().await.unwrap(), ["solana"]);
        assert_eq!(idle_since.elapsed().as_secs(), PERIOD.as_secs());

        drop(handle);
        quotes.gate.add_permits(1);
        next_render(&mut ui).await;
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_reported_as_warnings() {
        let quotes = FakeQuotes {
            unreachable: true,
            ..Default::default()
        };
        let retry = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        let fetcher = PriceFetcher::new(quotes, FakePairs::default(), retry);
        let session = Session::new(directory(), assets("BTC"), Customization::default());
        let (ui_tx, mut ui) = mpsc::unbounded_channel();
        let (scheduler, handle) = RefreshScheduler::new(fetcher, session, PERIOD, ui_tx);
        let task = tokio::spawn(scheduler.run());

        let update = next_render(&mut ui).await;
        assert_eq!(displays(&update), [pair("BTC", "N/A")]);
        match ui.recv().await {
            Some(UiEvent::Warning(message)) => {
                assert!(message.starts_with("fake-quotes unreachable after 1 attempts"), "{message}")
            },
            other => panic!("expected a warning, got {other:?}"),
        }

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_directory_resolves_new_tickers() {
        let fetcher = PriceFetcher::new(
            FakeQuotes::with(&[("dogecoin", 0.1)]),
            FakePairs::default(),
            RetryPolicy::default(),
        );
        let session = Session::new(directory(), assets("DOGE,BTC"), Customization::default());
        let (ui_tx, mut ui) = mpsc::unbounded_channel();
        let (scheduler, handle) = RefreshScheduler::new(fetcher, session, PERIOD, ui_tx);
        let task = tokio::spawn(scheduler.run());

        let before = next_render(&mut ui).await;
        assert_eq!(displays(&before), [pair("DOGE", "N/A"), pair("BTC", "N/A")]);

        handle
            .replace_directory(CoinDirectory::build([CoinRecord::new("doge", "dogecoin")]))
            .unwrap();

        let after = next_render(&mut ui).await;
        assert_eq!(displays(&after), [pair("DOGE", "$0.10"), pair("BTC", "N/A")]);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn handle_fails_once_scheduler_stopped() {
        let fetcher = PriceFetcher::new(FakeQuotes::default(), FakePairs::default(), RetryPolicy::default());
        let session = Session::new(CoinDirectory::default(), assets("BTC"), Customization::default());
        let (ui_tx, ui) = mpsc::unbounded_channel();
        let (scheduler, handle) = RefreshScheduler::new(fetcher, session, Duration::ZERO, ui_tx);

        drop(ui);
        scheduler.run().await;

        assert_err_eq!(handle.update_tracked(assets("ETH")), SchedulerClosed);
    }

    #[test]
    fn session_is_replaced_per_field() {
        let session = Session::new(directory(), assets("BTC"), Customization::default());

        let next = session.with(Notification::TrackedAssets(assets("ETH,token:0xAAA")));

        assert_eq!(&*next.tracked, assets("ETH,token:0xAAA").as_slice());
        assert_eq!(&*session.tracked, assets("BTC").as_slice());
        assert!(Arc::ptr_eq(&next.directory, &session.directory));
        assert_eq!(next.customization, session.customization);
    }
}
