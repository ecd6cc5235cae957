use crate::error::AppError;
use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get};
use cairn_core::selection::ProviderSelector;
use cairn_core::wallet::WalletService;
use cairn_core::watermark::BlockInfoService;
use cairn_types::DbPool;
use handler::{BlockApiModule, ProviderApiModule, WalletApiModule};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::Info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handler;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    pub fn api_endpoint(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub wallets: Arc<WalletService>,
    pub blocks: Arc<BlockInfoService>,
    pub selector: Arc<ProviderSelector>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn get_offset(&self) -> i64 {
        self.offset.filter(|o| *o >= 0).unwrap_or(0)
    }

    pub fn get_limit(&self) -> i64 {
        match self.limit {
            Some(l) if l > 0 && l <= 100 => l,
            _ => 10,
        }
    }
}

pub async fn start(
    config: Config,
    state: AppState,
    custom_router: Option<OpenApiRouter<AppState>>,
) -> Result<()> {
    let (app, mut api) = configure_api(custom_router).with_state(state).split_for_parts();

    api.info = Info::new("REST API", "v1");
    api.info.description = Some("Cairn multi-chain explorer REST API".to_string());
    let app = app
        .layer(CorsLayer::permissive())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()));

    let addr = config.api_endpoint();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Hello Cairn Explorer API"
}

async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get()
        .await
        .map_err(|e| AppError::Unavailable(format!("database unreachable: {}", e)))?;
    Ok("ok")
}

#[allow(clippy::let_and_return)]
pub fn configure_api(custom_router: Option<OpenApiRouter<AppState>>) -> OpenApiRouter<AppState> {
    let router = OpenApiRouter::new()
        .nest("/v1/blocks", BlockApiModule::register())
        .nest("/v1/wallets", WalletApiModule::register())
        .nest("/v1/providers", ProviderApiModule::register())
        .route("/", get(root))
        .route("/v1/health", get(health_check));

    if let Some(custom_router) = custom_router {
        router.merge(custom_router)
    } else {
        router
    }
}
