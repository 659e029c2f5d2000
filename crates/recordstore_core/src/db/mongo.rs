//! Connection bootstrap for MongoDB through the synchronous driver.

use super::DbResult;
use log::{error, info};
use mongodb::sync::{Client, Database};
use std::time::Instant;

/// Builds a client for `uri` and returns the handle of `database`.
///
/// The driver connects lazily; server errors surface on the first operation.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status. The URI is
///   never logged since it may carry credentials.
pub fn open_mongo(uri: &str, database: &str) -> DbResult<Database> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=mongo database={database}");

    match Client::with_uri_str(uri) {
        Ok(client) => {
            info!(
                "event=db_open module=db status=ok mode=mongo database={} duration_ms={}",
                database,
                started_at.elapsed().as_millis()
            );
            Ok(client.database(database))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=mongo duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}
