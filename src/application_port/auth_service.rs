use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone)]
pub struct TokenVerifyResult {
    pub user_id: UserId,
}

/// Verifies access tokens minted by the identity service.
#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError>;
}

/// Resolves the caller of an inbound request to an authenticated user id.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}
