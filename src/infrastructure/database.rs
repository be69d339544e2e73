use mongodb::bson::doc;
use mongodb::{Client, Database};
use tracing::{error, info, instrument};

/// Opens the MongoDB client and pings the server once.
///
/// Only a malformed URI is fatal. A failed ping is logged and the handle is
/// still returned: the driver connects lazily and retries on its own.
#[instrument(skip(uri))]
pub async fn connect(uri: &str, database_name: &str) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    let database = client.database(database_name);

    match database.run_command(doc! { "ping": 1 }).await {
        Ok(_) => info!(database = database_name, "Connected to the database"),
        Err(e) => error!(database = database_name, error = %e, "Database connection error"),
    }

    Ok(database)
}
