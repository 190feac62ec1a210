use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xhs_media_fetcher::config::Config;
use xhs_media_fetcher::download::Downloader;
use xhs_media_fetcher::pipeline::{Resolver, TracingProgress};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be installed yet if startup failed early.
        if tracing::dispatcher::has_been_set() {
            error!("Fatal error: {e:#}");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let input = read_input().await?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, cancelling");
        signal_token.cancel();
    });

    let resolver = Resolver::new(Arc::new(TracingProgress))?;
    let media = resolver
        .resolve(&input, &cancel)
        .await
        .context("Resolution aborted")?;

    if config.resolve_only {
        let json = serde_json::to_string_pretty(&media).context("Failed to serialize media")?;
        println!("{json}");
        return Ok(());
    }

    if media.is_empty() {
        info!("Nothing to download");
        return Ok(());
    }

    let downloader = Downloader::new(&config.output_dir, &config.file_prefix)?;
    info!(
        count = media.len(),
        dir = %downloader.output_dir().display(),
        session = %downloader.session(),
        "Starting downloads"
    );

    let results: Vec<_> = stream::iter(&media)
        .map(|item| {
            let downloader = &downloader;
            let cancel = &cancel;
            async move {
                tokio::select! {
                    () = cancel.cancelled() => (item, Err(anyhow::anyhow!("cancelled"))),
                    result = downloader.download(item) => (item, result),
                }
            }
        })
        .buffer_unordered(config.download_concurrency)
        .collect()
        .await;

    let mut failed = 0usize;
    for (item, result) in results {
        match result {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                failed += 1;
                error!(url = %item.url, error = %format!("{e:#}"), "Download failed");
            }
        }
    }

    info!(
        downloaded = media.len() - failed,
        failed = failed,
        "Downloads finished"
    );
    Ok(())
}

/// Share text comes from the arguments, or stdin when there are none.
async fn read_input() -> Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read share text from stdin")?;
    Ok(input)
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,xhs_media_fetcher=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
