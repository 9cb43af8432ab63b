use crate::application_port::*;
use crate::domain_model::*;

/// Result of an insert-if-absent on the canonical pair.
#[derive(Debug, Clone)]
pub enum FriendshipClaim {
    /// The record was inserted.
    Won(Friendship),
    /// The pair was already taken; carries the record that holds it.
    Existing(Friendship),
}

/// Every mutating method is a single atomic statement against the store.
/// None of them read first and write afterwards.
#[async_trait::async_trait]
pub trait FriendshipRepo: Send + Sync {
    /// Inserts `friendship` unless its canonical pair already has a record.
    async fn claim(&self, friendship: Friendship) -> Result<FriendshipClaim, RelationError>;

    /// Marks the request accepted if it is pending, contains `responder` and
    /// was not sent by `responder`. Returns whether a record matched.
    async fn accept_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError>;

    /// Deletes the request under the same predicate as `accept_pending`.
    async fn delete_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError>;

    /// Deletes an accepted friendship that contains `member`.
    async fn delete_accepted(
        &self,
        friendship_id: FriendshipId,
        member: UserId,
    ) -> Result<bool, RelationError>;

    /// Accepted friendships of `user_id` with the other member's profile,
    /// most recently accepted first.
    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendSummary>, RelationError>;

    /// Pending records containing `user_id` that someone else sent, with the
    /// sender's profile, newest first.
    async fn list_incoming(&self, user_id: UserId) -> Result<Vec<IncomingRequest>, RelationError>;
}
