use crate::application_port::*;
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id as string
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, AuthError> {
        sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_access(&token.0, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(TokenVerifyResult { user_id })
    }
}

pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(token_codec: Arc<dyn TokenCodec>) -> Self {
        RealAuthService { token_codec }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let verified = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_owned()))
            .await?;
        Ok(verified.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config() -> JwtConfig {
        JwtConfig {
            issuer: "peoplegrid.auth".to_string(),
            audience: "peoplegrid-client".to_string(),
            signing_key: b"test-secret".to_vec(),
        }
    }

    fn mint(sub: &str, issuer: &str, expires_in: Duration) -> String {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: sub.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
            iss: issuer.to_string(),
            aud: "peoplegrid-client".to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn service() -> RealAuthService {
        RealAuthService::new(Arc::new(JwtHs256Codec::new(config())))
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let user = UserId::from_name("alice");
        let token = mint(&user.to_string(), "peoplegrid.auth", Duration::minutes(5));

        assert_eq!(service().verify_token(&token).await.unwrap(), user);
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let user = UserId::from_name("alice");
        let token = mint(&user.to_string(), "peoplegrid.auth", Duration::hours(-1));

        let res = service().verify_token(&token).await;

        assert!(matches!(res, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn foreign_issuer_and_bad_subject_are_invalid() {
        let user = UserId::from_name("alice");
        let foreign = mint(&user.to_string(), "someone.else", Duration::minutes(5));
        let bad_sub = mint("not-a-uuid", "peoplegrid.auth", Duration::minutes(5));

        assert!(matches!(
            service().verify_token(&foreign).await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            service().verify_token(&bad_sub).await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            service().verify_token("garbage").await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
