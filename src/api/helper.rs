use crate::errors::AppError;
use deadpool_diesel::postgres::Pool;
use diesel::PgConnection;
use diesel::result::Error as DieselError;
use tracing::trace;

/// Runs a synchronous diesel closure on a pooled connection's blocking
/// thread, outside any transaction.
pub(super) async fn run_query<T, F>(pool: &Pool, query: F) -> Result<T, AppError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, DieselError> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await?;
    trace!("Checked out pooled connection");
    Ok(conn.interact(query).await??)
}
