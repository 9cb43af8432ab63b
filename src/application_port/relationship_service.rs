use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("cannot send a friend request to yourself")]
    SelfTarget,
    #[error("target user not found")]
    TargetNotFound,
    #[error("already friends with this user")]
    AlreadyFriends,
    #[error("friend request already sent to this user")]
    DuplicateRequest,
    #[error("this user already sent you a friend request, respond to it instead")]
    ReciprocalPending,
    #[error("pending friend request not found")]
    RequestNotFound,
    #[error("friendship not found")]
    RelationshipNotFound,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn request_friendship(
        &self,
        me: UserId,
        target: UserId,
    ) -> Result<Friendship, RelationError>;
    async fn respond_to_request(
        &self,
        me: UserId,
        friendship_id: FriendshipId,
        action: RespondAction,
    ) -> Result<RespondOutcome, RelationError>;
    async fn list_friends(&self, me: UserId) -> Result<Vec<FriendSummary>, RelationError>;
    async fn list_incoming_requests(
        &self,
        me: UserId,
    ) -> Result<Vec<IncomingRequest>, RelationError>;
    async fn remove_friendship(
        &self,
        me: UserId,
        friendship_id: FriendshipId,
    ) -> Result<(), RelationError>;
}
