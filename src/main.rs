//! CLI entry point for the SEPTA regional-rail status poller.
//!
//! `watch` runs the polling loop for the life of the process and periodically
//! logs what a reader would be shown. `check` runs a single cycle against a
//! URL or a saved response and prints the result.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use septa_status::{
    config::PollerConfig,
    output::{log_status, print_pretty, status_lines, to_json},
    scheduler::Poller,
    source::{FeedSource, FileSource, SeptaClient},
    staleness::present,
    store::SnapshotStore,
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "septa_status")]
#[command(
    about = "Polls SEPTA regional rail and reports how late the trains are",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed forever and log the current status
    Watch {
        /// Seconds of idle time between polls
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Seconds after which a snapshot is reported as unknown
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..))]
        max_age: Option<i64>,

        /// Seconds between status reports
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        report_interval: Option<u64>,
    },
    /// Run a single poll against a URL or a saved TrainView response
    Check {
        /// Path to file or URL to fetch (defaults to the configured feed URL)
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Print the full snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also print the raw upstream document
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/septa_status.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("septa_status.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut cfg = PollerConfig::load();

    match cli.command {
        Commands::Watch {
            interval,
            max_age,
            report_interval,
        } => {
            if let Some(secs) = interval {
                cfg.poll_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = max_age {
                cfg.max_age_secs = secs;
            }
            if let Some(secs) = report_interval {
                cfg.report_interval = Duration::from_secs(secs);
            }
            watch(&cfg).await?;
        }
        Commands::Check { source, json, raw } => {
            check(&cfg, source.as_deref(), json, raw).await?;
        }
    }

    Ok(())
}

/// Starts the poller and reports the presented status until Ctrl+C.
async fn watch(cfg: &PollerConfig) -> Result<()> {
    let store = Arc::new(SnapshotStore::new());
    let mut poller = Poller::new(cfg.septa_client()?, store.clone(), cfg.poll_interval).start();

    let mut ticker = tokio::time::interval(cfg.report_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        report_interval_secs = cfg.report_interval.as_secs(),
        max_age_secs = cfg.max_age_secs,
        "Watching. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = store.read_current();
                log_status(&present(&snapshot, Utc::now().timestamp(), cfg.max_age_secs));
            }
            result = &mut poller => {
                error!(?result, "Poller exited unexpectedly");
                anyhow::bail!("poller task ended");
            }
            _ = tokio::signal::ctrl_c() => {
                info!(publications = store.publish_count(), "Shutting down");
                poller.abort();
                break;
            }
        }
    }

    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Runs one cycle against a file or URL and prints what a reader would see.
#[tracing::instrument(skip(cfg))]
async fn check(cfg: &PollerConfig, source: Option<&str>, json: bool, raw: bool) -> Result<()> {
    let source: Arc<dyn FeedSource> = match source {
        Some(path) if !is_url(path) => Arc::new(FileSource::new(path)),
        Some(url) => Arc::new(SeptaClient::new(
            cfg.http_client()?,
            url.parse().with_context(|| format!("invalid URL '{url}'"))?,
        )),
        None => Arc::new(cfg.septa_client()?),
    };

    let store = Arc::new(SnapshotStore::new());
    let poller = Poller::new(source, store.clone(), cfg.poll_interval);
    poller.run_cycle().await?;

    let published = store.read_both();
    print_pretty(&published.snapshot);

    if json {
        println!("{}", to_json(&*published.snapshot)?);
    } else {
        let view = present(&published.snapshot, Utc::now().timestamp(), cfg.max_age_secs);
        for line in status_lines(&view) {
            println!("{line}");
        }
    }

    if raw {
        if let Some(doc) = &published.raw {
            println!("{}", to_json(&**doc)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_rejects_zero_intervals() {
        for flag in ["--interval", "--report-interval", "--max-age"] {
            let parsed = Cli::try_parse_from(["septa_status", "watch", flag, "0"]);
            assert!(parsed.is_err(), "{flag} 0 should be rejected");
        }
        assert!(Cli::try_parse_from(["septa_status", "watch", "--interval", "60"]).is_ok());
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://www3.septa.org/api/TrainView/index.php"));
        assert!(is_url("http://localhost:9000/trains"));
        assert!(!is_url("http_dump.json"));
        assert!(!is_url("httpfeeds/trainview.json"));
    }
}
