use std::sync::Arc;

use crate::{models::NetworkModel, DbPool};
use anyhow::Result;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Get a network by its canonical name, case-insensitively
pub async fn get_network_by_name(
    db: Arc<DbPool>,
    network_name: &str,
) -> Result<Option<NetworkModel>> {
    use crate::schema::networks::dsl::*;

    let mut conn = db.get().await?;
    let network = networks
        .filter(name.ilike(super::exact_ilike(network_name)))
        .select(NetworkModel::as_select())
        .first(&mut conn)
        .await
        .ok();
    Ok(network)
}
