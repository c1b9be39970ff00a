use std::{process, sync::Arc, time::Duration};

use greeter::{
    application::{
        error::AppError,
        events::LoggingGreetingEventHandler,
        greetings::GreetingService,
        repos::GreetingStore,
    },
    cache::{CacheConfig, build_cache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        events,
        http::{self, HttpState},
        memory::InMemoryGreetingStore,
        telemetry,
    },
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (store, db) = init_store(&settings.database).await?;
    let cache = build_cache(&CacheConfig::from(&settings.cache));

    let (publisher, listener) = events::channel(
        settings.events.channel_capacity,
        settings.events.send_timeout,
    );
    let (stop_listener, mut listener_stopped) = watch::channel(false);
    let listener_handle = tokio::spawn(listener.run_until(
        Arc::new(LoggingGreetingEventHandler),
        async move {
            let _ = listener_stopped.changed().await;
        },
    ));

    let greetings =
        GreetingService::new(store, cache, Arc::new(publisher)).with_cache_ttl(settings.cache.ttl);
    let state = HttpState {
        greetings: Arc::new(greetings),
        db,
    };

    let result = serve_http(&settings.server, state).await;
    // Aborted connections may still hold publisher clones.
    let _ = stop_listener.send(true);
    drain_events(listener_handle, settings.server.graceful_shutdown).await;
    result
}

async fn init_store(
    database: &config::DatabaseSettings,
) -> Result<(Arc<dyn GreetingStore>, Option<Arc<PostgresRepositories>>), AppError> {
    let Some(database_url) = database.url.as_ref() else {
        warn!("no database url configured, greetings are kept in memory");
        let store: Arc<dyn GreetingStore> = Arc::new(InMemoryGreetingStore::new());
        return Ok((store, None));
    };

    let pool = PostgresRepositories::connect(
        database_url,
        database.max_connections.get(),
        database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!("greeting store connected");
    let repositories = Arc::new(PostgresRepositories::new(pool));
    let store: Arc<dyn GreetingStore> = repositories.clone();
    Ok((store, Some(repositories)))
}

async fn serve_http(server: &config::ServerSettings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %server.addr, "greeting service listening");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server_task => return flatten_server_result(joined),
        () = shutdown_signal() => {
            info!("shutdown signal received, draining connections");
            let _ = shutdown_tx.send(true);
        }
    }

    match tokio::time::timeout(server.graceful_shutdown, &mut server_task).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                timeout_secs = server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
            server_task.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

/// Wait for the listener to finish the events buffered before it was stopped.
async fn drain_events(handle: JoinHandle<u64>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(received)) => info!(received, "event listener drained"),
        Ok(Err(err)) => error!(error = %InfraError::listener(err.to_string()), "event listener failed"),
        Err(_) => warn!(
            timeout_secs = timeout.as_secs(),
            "event listener did not drain before the shutdown deadline"
        ),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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
}
