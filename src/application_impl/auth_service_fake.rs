use crate::application_port::*;
use crate::domain_model::UserId;

const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

#[derive(Debug, Default)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }

    pub fn token_for(user: &str) -> String {
        format!("{FAKE_TOKEN_PREFIX}{user}")
    }
}

// Accepts `fake-access-token:<uuid>` or `fake-access-token:<username>`.
// Local development only.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix(FAKE_TOKEN_PREFIX) {
            Some(subject) if !subject.is_empty() => Ok(subject
                .parse::<UserId>()
                .unwrap_or_else(|_| UserId::from_name(subject))),
            _ => Err(AuthError::TokenInvalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_names_and_ids() {
        let auth = FakeAuthService::new();
        let bob = UserId::from_name("bob");

        let by_name = auth.verify_token(&FakeAuthService::token_for("bob")).await;
        let by_id = auth.verify_token(&FakeAuthService::token_for(&bob.to_string())).await;

        assert_eq!(by_name.unwrap(), bob);
        assert_eq!(by_id.unwrap(), bob);
    }

    #[tokio::test]
    async fn rejects_other_tokens() {
        let auth = FakeAuthService::new();

        assert!(matches!(auth.verify_token("bob").await, Err(AuthError::TokenInvalid)));
        assert!(matches!(
            auth.verify_token(FAKE_TOKEN_PREFIX).await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
