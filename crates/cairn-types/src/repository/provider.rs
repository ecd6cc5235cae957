use std::sync::Arc;

use crate::dto::ProviderSelection;
use crate::models::{DefaultProviderModel, NewDefaultProvider, ProviderModel, ProviderUrlModel};
use crate::operation::Operation;
use crate::DbPool;
use anyhow::{anyhow, Result};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

/// Read the pinned mapping for (network, operation) and project it into a
/// `ProviderSelection`. Returns `None` when no mapping exists or when the
/// pinned provider carries no usable URL.
pub async fn get_pinned_selection(
    db: Arc<DbPool>,
    network_id_value: i32,
    operation_value: Operation,
) -> Result<Option<ProviderSelection>> {
    use crate::schema::{default_providers, provider_urls, providers};

    let mut conn = db.get().await?;
    let mapping: Option<(DefaultProviderModel, ProviderModel)> = default_providers::table
        .inner_join(providers::table)
        .filter(default_providers::network_id.eq(network_id_value))
        .filter(default_providers::operation.eq(operation_value.as_str()))
        .select((DefaultProviderModel::as_select(), ProviderModel::as_select()))
        .first(&mut conn)
        .await
        .ok();

    let Some((mapping, provider)) = mapping else {
        return Ok(None);
    };

    let pinned_url = match mapping.url_id {
        Some(url_id_value) => provider_urls::table
            .filter(provider_urls::id.eq(url_id_value))
            .select(ProviderUrlModel::as_select())
            .first(&mut conn)
            .await
            .ok()
            .map(|u| u.address),
        None => None,
    };

    let base_url = match pinned_url.or(provider.default_url) {
        Some(url) => url,
        None => {
            tracing::warn!(
                "Pinned provider {} for {} has no URL, treating as unconfigured",
                provider.name,
                operation_value
            );
            return Ok(None);
        }
    };

    Ok(Some(ProviderSelection {
        provider_name: provider.name,
        interface: provider.interface,
        base_url,
    }))
}

/// Get a provider by name within one network
pub async fn get_provider_by_name(
    db: Arc<DbPool>,
    network_id_value: i32,
    provider_name: &str,
) -> Result<Option<ProviderModel>> {
    use crate::schema::providers::dsl::*;

    let mut conn = db.get().await?;
    let provider = providers
        .filter(network_id.eq(network_id_value))
        .filter(name.ilike(super::exact_ilike(provider_name)))
        .select(ProviderModel::as_select())
        .first(&mut conn)
        .await
        .ok();
    Ok(provider)
}

/// The administrative write: pin `provider_id` (and optionally a URL) as the
/// default for (network, operation) inside one transaction.
///
/// The cache-rebuild side effect is intentionally not part of this function;
/// callers trigger it only after the commit here has returned.
pub async fn pin_default_provider(
    db: Arc<DbPool>,
    network_id_value: i32,
    operation_value: Operation,
    provider_id_value: i32,
    url_id_value: Option<i32>,
) -> Result<()> {
    use crate::schema::{default_providers, providers};

    let mut conn = db.get().await?;
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            let provider: ProviderModel = providers::table
                .find(provider_id_value)
                .select(ProviderModel::as_select())
                .first(conn)
                .await?;

            if !provider.supports_operation(operation_value.as_str()) {
                return Err(diesel::result::Error::RollbackTransaction);
            }

            diesel::insert_into(default_providers::table)
                .values(NewDefaultProvider {
                    network_id: network_id_value,
                    operation: operation_value.as_str().to_string(),
                    provider_id: provider_id_value,
                    url_id: url_id_value,
                })
                .on_conflict((default_providers::network_id, default_providers::operation))
                .do_update()
                .set((
                    default_providers::provider_id.eq(provider_id_value),
                    default_providers::url_id.eq(url_id_value),
                ))
                .execute(conn)
                .await?;

            Ok(())
        }
        .scope_boxed()
    })
    .await
    .map_err(|e| match e {
        diesel::result::Error::RollbackTransaction => anyhow!(
            "provider {} does not support operation {}",
            provider_id_value,
            operation_value
        ),
        other => other.into(),
    })?;

    tracing::info!(
        "Pinned provider {} for network {} operation {}",
        provider_id_value,
        network_id_value,
        operation_value
    );
    Ok(())
}
