/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (PgPool, vault client, EMR client) → Router 組み立て
 * - Middleware の適用 (request id / trace / body limit)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::PgAuditLog,
    services::{
        auth::AuthScheme,
        export::ExportPolicy,
        jobs::EmrJobSubmitter,
        vault::{VaultAllowList, VaultClient},
    },
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,export_query_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development では即落ちさせて気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting export API in {:?} mode on {} ({} vault ids allowed)",
        config.app_env,
        config.addr,
        config.vault_ids.len()
    );

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    let vault = VaultClient::new(config.vault_url.clone(), config.authorization_timeout)?;
    let jobs = EmrJobSubmitter::from_region(&config.region, config.emr.clone()).await;

    let policy = ExportPolicy {
        auth_scheme: AuthScheme::new(config.auth_scheme.clone()),
        vault_ids: VaultAllowList::new(config.vault_ids.iter().cloned()),
        default_region: config.region.clone(),
    };
    if policy.vault_ids.is_empty() {
        tracing::warn!("VAULT_IDS is empty; every export request will be rejected");
    }

    Ok(AppState::new(
        policy,
        vault,
        Arc::new(jobs),
        Arc::new(PgAuditLog::new(db)),
    ))
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::http::apply(router)
}
