use std::{io, sync::Arc};

use coingecko_client::CoingeckoClient;
use config::ConfigError;
use dexscreener_client::DexscreenerClient;
use price_overlay::{
    directory,
    scheduler::DisplayUpdate,
    settings::{self, Settings},
    telemetry::Telemetry,
    AssetReference, CoinDirectory, PriceFetcher, RefreshScheduler, SchedulerHandle, Session, UiEvent,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

const USAGE: &str = "commands: tickers BTC,ETH,token:0x... | reload | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_file = settings::get_settings_file();
    let (settings, config_error) =
        match settings::try_read_file_config::<Settings, ConfigError>(&settings_file, settings::ENV_PREFIX) {
            Ok(settings) => (settings, None),
            Err(error) => (Settings::default(), Some(error)),
        };

    Telemetry::init_subscriber(Telemetry::init(env!("CARGO_PKG_NAME").into(), &settings.tracing))?;
    if let Some(error) = config_error {
        tracing::warn!(file = %settings_file, "config error: {error}, going on with default config...");
    }

    let Settings {
        coingecko,
        dexscreener,
        retry,
        refresh,
        coin_list,
        tickers,
        customization,
        ..
    } = settings;

    let coingecko = Arc::new(CoingeckoClient::new(coingecko)?);
    let dexscreener = DexscreenerClient::new(dexscreener)?;

    let directory = match directory::load(&coin_list, coingecko.as_ref(), &retry).await {
        Ok(directory) => directory,
        Err(error) => {
            tracing::error!(%error, "unable to load coin list");
            eprintln!("Error loading coin data, tickers will show N/A: {error}");
            CoinDirectory::default()
        },
    };
    warn_unknown_tickers(&directory, &tickers);
    let directory = Arc::new(directory);

    let fetcher = PriceFetcher::new(coingecko, dexscreener, retry);
    let (ui_tx, mut ui) = mpsc::unbounded_channel();
    let (scheduler, handle) = RefreshScheduler::new(
        fetcher,
        Session::new(directory.clone(), tickers, customization),
        refresh.interval,
        ui_tx,
    );
    let scheduler = tokio::spawn(scheduler.run());

    eprintln!("{USAGE}");
    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = ui.recv() => match event {
                Some(event) => show(event),
                None => break,
            },
            line = commands.next_line() => match classify(line)? {
                Input::Line(line) => {
                    if !run_command(&line, &handle, &directory, &settings_file)? {
                        break;
                    }
                },
                Input::Skip => {},
                Input::Eof => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("shutting down");
    drop(handle);
    scheduler.abort();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Skip,
    Eof,
}

/// A line that is not valid UTF-8 is skipped. Other read errors end the session.
fn classify(read: io::Result<Option<String>>) -> io::Result<Input> {
    match read {
        Ok(Some(line)) => Ok(Input::Line(line)),
        Ok(None) => Ok(Input::Eof),
        Err(error) if error.kind() == io::ErrorKind::InvalidData => {
            tracing::warn!(%error, "skipping unreadable command line");
            Ok(Input::Skip)
        },
        Err(error) => Err(error),
    }
}

fn warn_unknown_tickers(directory: &CoinDirectory, tickers: &[AssetReference]) {
    for ticker in tickers {
        if let AssetReference::Ticker(symbol) = ticker {
            if !directory.contains(symbol) {
                tracing::warn!(%ticker, "ticker is not in the coin list, it will show N/A");
            }
        }
    }
}

fn show(event: UiEvent) {
    match event {
        UiEvent::Render(DisplayUpdate { rows, .. }) => {
            for row in rows {
                println!("{}: {}", row.label, row.display);
            }
            println!();
        },
        UiEvent::Warning(message) => eprintln!("Error updating prices, will try again soon: {message}"),
    }
}

/// Validates a user-entered list against the directory. With no directory loaded nothing can
/// be checked, so the list goes through unchanged.
fn accept_tracked(directory: &CoinDirectory, tracked: &[AssetReference]) -> bool {
    if directory.is_empty() {
        tracing::warn!("coin list unavailable, tickers are not validated");
        return true;
    }
    match directory.check_tracked(tracked) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "rejected ticker list");
            eprintln!("Invalid or duplicate ticker: {error}");
            false
        },
    }
}

/// Returns `false` when the user asked to quit.
fn run_command(
    line: &str,
    handle: &SchedulerHandle,
    directory: &CoinDirectory,
    settings_file: &str,
) -> anyhow::Result<bool> {
    let line = line.trim();
    let (command, args) = line.split_once(' ').unwrap_or((line, ""));

    match command {
        "" => {},
        "tickers" => match AssetReference::parse_list(args) {
            Ok(tickers) if accept_tracked(directory, &tickers) => handle.update_tracked(tickers)?,
            Ok(_) => {},
            Err(error) => eprintln!("invalid ticker list: {error}"),
        },
        "reload" => {
            let settings: Settings = settings::read_file_config_or_default(settings_file, settings::ENV_PREFIX);
            handle.apply_customization(settings.customization)?;
            if accept_tracked(directory, &settings.tickers) {
                handle.update_tracked(settings.tickers)?;
            }
        },
        "quit" | "exit" => return Ok(false),
        other => eprintln!("unknown command {other:?}, {USAGE}"),
    }

    Ok(true)
}
