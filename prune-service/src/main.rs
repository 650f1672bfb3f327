use std::time::Duration;

use prune_service::{config::EnvVars, prune::prune_dedupe_collection};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(sentry::integrations::tracing::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .init();
    tracing::info!("Starting dedupe prune service...");
    dotenvy::dotenv().ok();

    let env_vars = EnvVars::new();

    let _guard = if let Some(sentry_dsn) = env_vars.sentry_dsn.clone() {
        tracing::info!("initializing Sentry");
        // NOTE: Events are only emitted, once the guard goes out of scope.
        Some(sentry::init((
            sentry_dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(env_vars.environment.to_string().into()),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        )))
    } else {
        None
    };

    let task = prune_dedupe_collection(&env_vars);
    let res = match env_vars.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(res) => res,
            Err(_elapsed) => {
                tracing::error!(timeout_secs = secs, "prune timed out");
                return;
            }
        },
        None => task.await,
    };

    match res {
        Ok(deleted) => tracing::info!(deleted, "Successfully pruned dedupe collection"),
        Err(e) => tracing::error!("Error pruning dedupe collection: {:?}", e),
    }
}
