pub mod alert;
pub mod cache;
pub mod gateway;
pub mod reconcile;
pub mod selection;
pub mod store;
pub mod wallet;
pub mod watermark;

use std::sync::Arc;

use anyhow::Result;
use diesel_async::pooled_connection::{bb8::Pool, AsyncDieselConnectionManager};
use diesel_async::AsyncPgConnection;

pub use cairn_types::DbPool;

pub async fn new_db_pool(database_url: &str, max_size: Option<u32>) -> Result<Arc<DbPool>> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder().max_size(max_size.unwrap_or(10)).build(manager).await?;
    Ok(Arc::new(pool))
}
