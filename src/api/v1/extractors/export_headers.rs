/*
 * Responsibility
 * - export handler が使うヘッダ (Authorization / CF-Connecting-IP) を取り出す
 * - ここでは検証しない。欠けていれば None のまま pipeline に渡す
 *   (拒否理由と status は pipeline 側で決める)
 */
use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

pub const CLIENT_IP_HEADER: &str = "cf-connecting-ip";

#[derive(Debug, Clone, Default)]
pub struct ExportHeaders {
    pub authorization: Option<String>,
    pub client_ip: Option<String>,
}

impl ExportHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            authorization: read(header::AUTHORIZATION.as_str()),
            client_ip: read(CLIENT_IP_HEADER),
        }
    }
}

impl<S> FromRequestParts<S> for ExportHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
