/*
 * Responsibility
 * - API 共通のエラー型 ApiError (失敗レスポンス {id, message} + status)
 * - IntoResponse 実装。どの失敗でもリクエスト ID を返して追跡できるようにする
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::api::v1::dto::export::FailureResponse;

#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub id: Uuid,
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(id: Uuid, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = FailureResponse {
            id: self.id,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
