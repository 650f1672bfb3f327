use analytics_service::{
    app,
    config::{AppState, EnvVars},
};
use analytics_store::{EventStore, MemoryStore, MongoStore, db};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,analytics_store=debug,tower_http=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        // Log to stdout
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    info!("Starting server...");
    let env_vars = EnvVars::new();

    let res = match env_vars.mongodb_uri.as_deref() {
        Some(uri) => {
            let client = match db::client(uri, env!("CARGO_CRATE_NAME")).await {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to connect to database: {e:?}");
                    return;
                }
            };
            let store = match db::database(&client, env_vars.mongodb_db.as_deref()) {
                Ok(database) => MongoStore::new(&database),
                Err(e) => {
                    error!("{e}");
                    return;
                }
            };
            let res = serve(store, &env_vars).await;
            client.shutdown().await;
            res
        }
        None => serve(MemoryStore::new(), &env_vars).await,
    };

    if let Err(err) = res {
        error!("Server error: {}", err);
    }
}

async fn serve<S: EventStore>(store: S, env_vars: &EnvVars) -> Result<(), Box<dyn std::error::Error>> {
    store.ensure_indexes().await?;

    let app = app(AppState { store }, env_vars);

    let port = env_vars.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Listening on port {port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down...");
}
