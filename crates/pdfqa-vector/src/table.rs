//! LanceDB connection helpers. One database per document storage area.
use anyhow::Result;
use lancedb::{connect, Connection};
use std::path::Path;

pub async fn open_db(area: &Path) -> Result<Connection> {
    Ok(connect(area.to_string_lossy().as_ref()).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn count_rows(conn: &Connection, name: &str) -> Result<usize> {
    let table = conn.open_table(name).execute().await?;
    Ok(table.count_rows(None).await?)
}
