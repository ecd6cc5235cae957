use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use cairn_types::dto::{BlockHeadInfo, LatestBlockInfo};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::AppError;
use crate::handler::dto::{BlockHeadQuery, LatestBlockInfoQuery};
use crate::AppState;

pub struct BlockApiModule;

impl BlockApiModule {
    pub fn register() -> OpenApiRouter<crate::AppState> {
        OpenApiRouter::new()
            .routes(routes!(get_latest_block_info_handler))
            .routes(routes!(get_block_head_handler))
    }
}

#[utoipa::path(
    get,
    path = "/latest-info",
    tag = "Blocks",
    params(LatestBlockInfoQuery),
    responses(
        (status = 200, description = "Transfers in the range and the processed watermark", body = LatestBlockInfo),
        (status = 404, description = "Network unknown or range not available"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_latest_block_info_handler(
    Query(query): Query<LatestBlockInfoQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if query.after >= query.to {
        return Err(AppError::ValidationError("after must be below to".to_string()));
    }
    let info = state
        .blocks
        .latest_block_info(
            &query.network,
            query.after,
            query.to,
            query.include_inputs.unwrap_or(false),
            query.include_info.unwrap_or(false),
        )
        .await?;
    Ok(Json(info))
}

#[utoipa::path(
    get,
    path = "/head",
    tag = "Blocks",
    params(BlockHeadQuery),
    responses(
        (status = 200, description = "Current chain head as reported upstream", body = BlockHeadInfo),
        (status = 404, description = "Network unknown"),
        (status = 502, description = "Upstream explorer failure")
    )
)]
pub async fn get_block_head_handler(
    Query(query): Query<BlockHeadQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let block_head = state.blocks.block_head(&query.network).await?;
    Ok(Json(BlockHeadInfo { block_head }))
}
