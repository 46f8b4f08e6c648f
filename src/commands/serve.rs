use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    Args,
    build::{Builder, FileInfo, FileWatcher},
    config::WebsiteConfig,
};

/// A running watcher and the channel that stops it.
struct WatchHandle {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

pub async fn run(args: &Args) -> Result<(), anyhow::Error> {
    let config = WebsiteConfig::from_root(&args.root_dir())?;

    // Build the site first
    let builder = Builder::new(config.clone());
    let result = builder.build()?;
    let output_dir = result.site.output_dir.clone();

    // Set up file watcher unless disabled
    let watcher = if args.no_watch {
        None
    } else {
        let extensions = vec![config.templates.extension.clone()];
        let watcher = FileWatcher::new(&builder.watch_dirs(), &extensions, &config.dev.watch)
            .context("failed to start file watcher")?;
        tracing::info!(backend = ?config.dev.watch.backend, "watching for changes");

        let (stop, stop_rx) = mpsc::channel();
        let site = result.site;
        let task = tokio::task::spawn_blocking(move || {
            watcher.run(
                |changed: &FileInfo| {
                    tracing::info!(path = %changed.path.display(), "change detected, rebuilding");
                    builder.rebuild(&site).map(|_| ())
                },
                stop_rx,
            );
        });
        Some(WatchHandle { stop, task })
    };

    // Create the static file server
    let serve_dir = ServeDir::new(&output_dir).append_index_html_on_directories(true);
    let app = Router::new()
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http());

    // A bind failure is fatal
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        args.bind.as_str()
    };
    let url = format!("http://{}:{}", display_host, args.port);
    tracing::info!(url = %url, output = %output_dir.display(), "serving site, press Ctrl+C to stop");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::warn!(error = %e, "failed to open browser");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let exited_early = tokio::select! {
        () = shutdown_signal() => None,
        joined = &mut server => Some(joined),
    };

    match exited_early {
        Some(joined) => log_server_exit(joined),
        None => {
            let _ = shutdown_tx.send(());
            let timeout = Duration::from_millis(config.dev.shutdown_timeout_ms);
            match tokio::time::timeout(timeout, &mut server).await {
                Ok(joined) => log_server_exit(joined),
                Err(_) => {
                    tracing::warn!(timeout = ?timeout, "graceful shutdown timed out, aborting server");
                    server.abort();
                }
            }
        }
    }

    if let Some(WatchHandle { stop, task }) = watcher {
        // The watcher also stops when the sender is dropped
        let _ = stop.send(());
        if let Err(e) = task.await {
            tracing::error!(error = %e, "watcher task failed");
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

fn log_server_exit(joined: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "server error"),
        Err(e) => tracing::error!(error = %e, "server task failed"),
    }
}

/// Wait for Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
