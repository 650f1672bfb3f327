use std::time::Duration;

use analytics_store::{EventStore, MongoStore, db};
use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::config::EnvVars;

/// Connects to the configured database and prunes its dedupe collection
#[tracing::instrument(skip_all, err(Debug))]
pub async fn prune_dedupe_collection(env_vars: &EnvVars) -> anyhow::Result<u64> {
    let client = db::client(&env_vars.mongodb_uri, env!("CARGO_CRATE_NAME"))
        .await
        .context("unable to connect to database")?;
    let database = db::database(&client, env_vars.mongodb_db.as_deref())?;
    let deleted = {
        let store = MongoStore::new(&database);
        prune_dedupe_markers(&store, env_vars.retention, Utc::now()).await
    };
    client.shutdown().await;
    deleted
}

/// Deletes dedupe markers created more than `retention` before `now`.
///
/// Event ids embed their time bucket, so a marker older than any bucket can never match a
/// fresh submission again.
#[tracing::instrument(skip_all, fields(retention_s = retention.as_secs()), err(Debug))]
pub async fn prune_dedupe_markers<S: EventStore>(
    store: &S,
    retention: Duration,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let retention =
        chrono::Duration::from_std(retention).context("retention out of range")?;
    let cutoff = now
        .checked_sub_signed(retention)
        .context("unable to construct cutoff date")?;
    tracing::info!(%cutoff);

    let deleted = store
        .prune_markers(cutoff)
        .await
        .context("unable to delete dedupe markers")?;

    tracing::info!(num = deleted, "deleted dedupe markers");
    Ok(deleted)
}
