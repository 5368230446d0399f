//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: Matrix
//! - Application: Filter, Executor, Notifier, Dispatcher
//!

#![recursion_limit = "256"]

mod application;
mod domain;
mod infrastructure;
mod strings;

use anyhow::{Context, Result};
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::SyncRoomMessageEvent,
    },
};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::dispatcher::Dispatcher;
use crate::application::executor::TriggerExecutor;
use crate::application::filter::EventFilter;
use crate::application::notifier::Notifier;
use crate::domain::config::AppConfig;
use crate::infrastructure::matrix::{MatrixService, inbound_from_event};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 1. Load Configuration
    // Fails fast, naming every missing key, before anything is served.
    let config = AppConfig::from_env()?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!(
        "{log_level},matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn"
    ))
    .context("Invalid LOG_LEVEL")?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    tracing::info!("Starting Tripwire...");

    // 3. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.matrix.homeserver)
        .build()
        .await
        .context("Failed to build Matrix client")?;

    client
        .matrix_auth()
        .login_username(&config.matrix.username, &config.matrix.password)
        .send()
        .await
        .context("Matrix login failed")?;

    tracing::info!("{}", strings::logs::login_success(&config.matrix.username));

    // 4. Trigger Pipeline
    let chat = Arc::new(MatrixService::new(client.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        EventFilter::new(config.trigger.pattern.clone()),
        TriggerExecutor::new(
            config.trigger.script_command.clone(),
            config.trigger.script_timeout,
        ),
        Notifier::new(chat),
    ));

    // Events flow from the sync handler into a channel drained by a single
    // worker, so triggers run one at a time in arrival order and a long
    // script never starves the sync loop.
    let (tx, rx) = mpsc::channel(64);
    let shutdown = CancellationToken::new();

    let worker_dispatcher = dispatcher.clone();
    let worker_shutdown = shutdown.clone();
    let worker = tokio::spawn(async move {
        worker_dispatcher.run(rx, worker_shutdown).await;
    });

    // 5. Event Handlers
    let start_time = std::time::SystemTime::now();
    let loop_tx = tx.clone();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let tx = loop_tx.clone();

        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };

            // Ignore events older than start_time
            let ts = ev.origin_server_ts();
            let event_time =
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
            if event_time < start_time {
                return;
            }

            if original_msg.sender == room.own_user_id() {
                return;
            }

            if let Some(msg) = inbound_from_event(original_msg, &room).await {
                if tx.send(msg).await.is_err() {
                    tracing::warn!("Event worker is gone, dropping message");
                }
            }
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            let _ = room.join().await;
        }
    });

    // 6. Start Loops
    tracing::info!("{}", strings::logs::STARTUP);

    let sync_client = client.clone();
    let mut sync_handle = tokio::spawn(async move { sync_client.sync(SyncSettings::default()).await });

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("{}", strings::logs::SHUTDOWN);
        }
        res = &mut sync_handle => {
            match res {
                Ok(Ok(())) => tracing::info!("Sync loop ended"),
                Ok(Err(err)) => tracing::error!("{}", strings::logs::sync_loop_fail(&err.to_string())),
                Err(err) => tracing::error!("Matrix sync panic: {err}"),
            }
        }
    }

    // Stop taking new events, abandon any in-flight wait, and let the worker
    // observe the cancellation before exiting.
    shutdown.cancel();
    sync_handle.abort();
    drop(tx);
    let _ = worker.await;

    Ok(())
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                tracing::error!("{}", strings::logs::shutdown_fail(&err.to_string()));
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
