use mongodb::{
    Client, Collection, Database,
    bson::doc,
    options::ClientOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::error::StoreError;

pub fn get_collection<T>(db: &Database, collection_name: &str) -> Collection<T>
where
    T: Send + Sync + DeserializeOwned + Serialize,
{
    db.collection::<T>(collection_name)
}

/// Connects to the cluster and pings it once.
///
/// `app_name` shows up in the server logs, so binaries pass their crate name.
#[instrument(skip_all, err(Debug))]
pub async fn client(uri: &str, app_name: &str) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.app_name = Some(app_name.to_string());

    // Get a handle to the cluster
    let client = Client::with_options(client_options)?;

    // Ping the server to see if you can connect to the cluster
    client
        .database("admin")
        .run_command(doc! {"ping": 1})
        .await?;

    Ok(client)
}

/// Resolves the database from an explicit name, falling back to the one in the URI.
pub fn database(client: &Client, name: Option<&str>) -> Result<Database, StoreError> {
    match name {
        Some(name) if !name.is_empty() => Ok(client.database(name)),
        _ => client.default_database().ok_or_else(|| {
            StoreError::Unavailable(
                "database needs to be defined in MONGODB_DB or the URI".to_string(),
            )
        }),
    }
}
