use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use super::error::ServiceResult;

/// Reads the feed-tracking database, whose `nappy_log` table is owned by a
/// separate logger. Rows are returned as JSON since the column set is not ours.
pub struct FeedService {
    pool: PgPool,
}

impl FeedService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entries sharing the most recent timestamp.
    pub async fn latest(&self) -> ServiceResult<Vec<Value>> {
        let mut conn = self.pool.acquire().await?;
        latest_entries(&mut conn).await
    }
}

async fn latest_entries(conn: &mut PgConnection) -> ServiceResult<Vec<Value>> {
    let rows = sqlx::query_scalar(
        "SELECT row_to_json(n) FROM nappy_log n
         WHERE n.timestamp = (SELECT MAX(timestamp) FROM nappy_log)",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
