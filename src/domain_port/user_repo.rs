use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn id_exists(&self, user_id: UserId) -> Result<bool, RelationError>;
}
