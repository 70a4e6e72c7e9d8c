use sqlx::any::install_default_drivers;
use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::debug;

use crate::error::Result;
use crate::records::HeartDiseaseRecord;

/// Opens a single connection for the backend named in `url`
/// (`sqlite:`, `mysql://` or `postgres://`).
pub async fn connect(url: &str) -> Result<AnyConnection> {
    install_default_drivers();
    let conn = AnyConnection::connect(url).await?;
    debug!(backend = conn.backend_name(), "connected to relational store");
    Ok(conn)
}

/// Bind placeholders for `count` parameters in the dialect of `backend`.
pub fn placeholders(backend: &str, count: usize) -> String {
    let numbered = backend.eq_ignore_ascii_case("postgresql");
    (1..=count)
        .map(|i| if numbered { format!("${i}") } else { "?".to_string() })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Idempotently creates the `heart_disease` table. Existing rows are untouched.
pub async fn create_table(conn: &mut AnyConnection) -> Result<()> {
    let sql = HeartDiseaseRecord::create_table_sql();
    sqlx::query(&sql).execute(&mut *conn).await?;
    debug!("ensured heart_disease table exists");
    Ok(())
}

/// Closes `conn` and hands back `result`. Every stage that opens a
/// connection routes its outcome through here, on failure paths as well.
pub async fn release<T>(conn: AnyConnection, result: Result<T>) -> Result<T> {
    let closed = conn.close().await;
    let value = result?;
    closed?;
    Ok(value)
}
