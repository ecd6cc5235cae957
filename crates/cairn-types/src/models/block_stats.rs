use crate::schema::block_stats;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-network block-processing watermarks.
///
/// `latest_processed_block` is monotonically non-decreasing;
/// `min_available_block` bounds how far back local-store queries are valid.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = block_stats)]
#[diesel(primary_key(network_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlockStatsModel {
    pub network_id: i32,
    pub latest_processed_block: i64,
    pub latest_fetched_block: i64,
    pub min_available_block: i64,
    pub latest_rechecked_block: i64,
    pub updated_at: NaiveDateTime,
}
