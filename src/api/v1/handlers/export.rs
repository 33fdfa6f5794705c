/*
 * Responsibility
 * - POST /vaults/{vault_id}/export
 * - Path / ヘッダ / JSON body を受けて ExportPipeline に渡し、結果をレスポンスに整形する
 * - 検証や外部呼び出しの順序は pipeline 側の責務
 * - pipeline は別タスクで最後まで走らせる (接続が切れても job 投入と監査 INSERT を途中で止めない)
 */
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};

use crate::{
    api::v1::{
        dto::export::{ExportQueryRequest, ExportQueryResponse},
        extractors::ExportHeaders,
    },
    error::ApiError,
    services::export::{ExportInput, ExportPipeline},
    state::AppState,
};

pub async fn export_query(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    headers: ExportHeaders,
    body: Bytes,
) -> Result<Json<ExportQueryResponse>, ApiError> {
    let pipeline = ExportPipeline::new(state);
    let id = pipeline.id();

    tracing::info!(%id, vault_id = %vault_id, "export initiated");
    if let Some(ip) = &headers.client_ip {
        tracing::info!(%id, client_ip = %ip, "client ip address");
    }

    // body が JSON として読めなくても空リクエストとして続行し、destination 検証で 400 にする
    let req: ExportQueryRequest = serde_json::from_slice(&body).unwrap_or_else(|err| {
        tracing::warn!(%id, error = %err, "request body is not valid JSON");
        ExportQueryRequest::default()
    });

    let input = ExportInput {
        vault_id,
        authorization: headers.authorization,
        client_ip: headers.client_ip,
        query: req.query,
        destination: req.destination,
        region: req.region,
    };

    let accepted = pipeline.spawn(input).await?;
    Ok(Json(accepted.into()))
}
