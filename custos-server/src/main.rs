use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use custos_core::ports::{AuditRepository, EventBus, UserRepository};
use custos_server::audit::consumer::run_audit_consumer;
use custos_server::audit::publisher::AuditPublisher;
use custos_server::auth::jwt::TokenService;
use custos_server::db::audit_store::PostgresAuditRepository;
use custos_server::db::postgres::{PostgresUserRepository, connect_postgres};
use custos_server::db::redis_bus::RedisEventBus;
use custos_server::infra::config::Config;
use custos_server::{AppState, create_app};
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);
/// How long the audit consumer gets to drain after the server stops.
const CONSUMER_STOP_GRACE: Duration = Duration::from_secs(5);

enum FirstExit {
    Server(anyhow::Result<()>),
    Consumer(anyhow::Result<()>),
    Shutdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = connect_postgres(&config.database_url).await?;
    let bus = Arc::new(RedisEventBus::connect(&config.redis_url).await?);

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let audit_logs: Arc<dyn AuditRepository> = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let event_bus: Arc<dyn EventBus> = bus;

    let state = AppState {
        config: config.clone(),
        users,
        audit_logs: audit_logs.clone(),
        tokens: Arc::new(TokenService::new(&config)),
        audit: AuditPublisher::new(event_bus.clone(), config.user_log_channel.clone()),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT combination")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    let shutdown = CancellationToken::new();
    // The consumer stops on its own token, cancelled only after the listener
    // has drained, so audit events from in-flight requests still land.
    let consumer_shutdown = CancellationToken::new();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_shutdown.cancel();
    });

    let app = create_app(state);
    let server_shutdown = shutdown.clone();
    let mut server_task: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
            .context("HTTP server error")
    });

    let mut consumer_task = tokio::spawn(run_audit_consumer(
        event_bus,
        audit_logs,
        config.user_log_channel.clone(),
        consumer_shutdown.clone(),
    ));

    // Whichever task exits first ends the process; the other gets a bounded
    // window to drain before being aborted.
    let first = tokio::select! {
        result = &mut server_task => FirstExit::Server(flatten(result)),
        result = &mut consumer_task => FirstExit::Consumer(flatten(result)),
        _ = shutdown.cancelled() => FirstExit::Shutdown,
    };
    shutdown.cancel();

    let (server_result, consumer_result) = match first {
        FirstExit::Server(result) => {
            consumer_shutdown.cancel();
            let consumer = drain(&mut consumer_task, CONSUMER_STOP_GRACE, "audit consumer").await;
            (result, consumer)
        }
        FirstExit::Consumer(result) => {
            let server = drain(&mut server_task, SHUTDOWN_GRACE, "HTTP server").await;
            (server, result)
        }
        FirstExit::Shutdown => {
            let server = drain(&mut server_task, SHUTDOWN_GRACE, "HTTP server").await;
            consumer_shutdown.cancel();
            let consumer = drain(&mut consumer_task, CONSUMER_STOP_GRACE, "audit consumer").await;
            (server, consumer)
        }
    };

    pool.close().await;
    info!("shutdown complete");

    server_result.and(consumer_result)
}

/// Waits for a task to finish, aborting it if the grace period runs out.
async fn drain(
    task: &mut JoinHandle<anyhow::Result<()>>,
    grace: Duration,
    name: &str,
) -> anyhow::Result<()> {
    match tokio::time::timeout(grace, &mut *task).await {
        Ok(result) => flatten(result),
        Err(_) => {
            warn!(task = name, "did not stop within grace period, aborting");
            task.abort();
            Ok(())
        }
    }
}

fn flatten(result: Result<anyhow::Result<()>, JoinError>) -> anyhow::Result<()> {
    match result {
        Ok(inner) => inner,
        Err(join) if join.is_cancelled() => Ok(()),
        Err(join) => Err(anyhow::anyhow!("task panicked: {join}")),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
