pub mod dto;
pub mod errors;
pub mod models;
pub mod operation;
pub mod repository;
pub mod schema;

use diesel_async::{
    pooled_connection::bb8::{Pool, PooledConnection},
    AsyncPgConnection,
};

pub use dto::*;
pub use errors::ExplorerError;
pub use models::*;
pub use operation::Operation;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbPoolConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Hard cap on rows read for one block range query.
pub const BLOCK_RANGE_ROW_CAP: i64 = 100_000;

/// Sentinel height of a transfer not yet attached to a confirmed block.
pub const UNCONFIRMED_BLOCK_HEIGHT: i64 = -1;
