/*
 * Responsibility
 * - Authorization ヘッダの scheme (先頭トークン) が設定値と一致するかの判定
 * - 大文字小文字は区別する ("bearer" は "Bearer" と一致しない)
 */

/// The credential presentation scheme accepted on the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthScheme(String);

impl AuthScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn accepts(&self, authorization: &str) -> bool {
        authorization.split_whitespace().next() == Some(self.0.as_str())
    }

    /// Returns the credential part (second token) when the scheme matches.
    pub fn credential<'a>(&self, authorization: &'a str) -> Option<&'a str> {
        let mut parts = authorization.split_whitespace();
        if parts.next() != Some(self.0.as_str()) {
            return None;
        }
        parts.next()
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        Self::new("Bearer")
    }
}
