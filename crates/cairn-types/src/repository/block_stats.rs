use std::sync::Arc;

use crate::{models::BlockStatsModel, DbPool};
use anyhow::Result;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Get the block watermarks for one network
pub async fn get_block_stats(
    db: Arc<DbPool>,
    network_id_value: i32,
) -> Result<Option<BlockStatsModel>> {
    use crate::schema::block_stats::dsl::*;

    let mut conn = db.get().await?;
    let stats = block_stats
        .filter(network_id.eq(network_id_value))
        .select(BlockStatsModel::as_select())
        .first(&mut conn)
        .await
        .ok();
    Ok(stats)
}
