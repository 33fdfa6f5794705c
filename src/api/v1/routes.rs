/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /vaults/{vault_id}/export
 * - 認証は middleware ではなく export pipeline の中で順番に検証する (destination が先)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{export::export_query, health::health};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/vaults/{vault_id}/export", post(export_query))
}
