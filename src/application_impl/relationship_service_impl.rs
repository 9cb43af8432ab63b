use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealRelationshipService {
    user_repo: Arc<dyn UserRepo>,
    friendship_repo: Arc<dyn FriendshipRepo>,
}

impl RealRelationshipService {
    pub fn new(user_repo: Arc<dyn UserRepo>, friendship_repo: Arc<dyn FriendshipRepo>) -> Self {
        Self {
            user_repo,
            friendship_repo,
        }
    }

    /// Why `me` could not create a record for a pair that is already taken.
    fn classify_conflict(me: UserId, existing: &Friendship) -> RelationError {
        match existing.status {
            FriendshipStatus::Accepted => RelationError::AlreadyFriends,
            FriendshipStatus::Pending if existing.action_user == me => {
                RelationError::DuplicateRequest
            }
            FriendshipStatus::Pending => RelationError::ReciprocalPending,
        }
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn request_friendship(
        &self,
        me: UserId,
        target: UserId,
    ) -> Result<Friendship, RelationError> {
        if me == target {
            return Err(RelationError::SelfTarget);
        }
        if !self.user_repo.id_exists(target).await? {
            return Err(RelationError::TargetNotFound);
        }

        // the unique pair key decides the race, the existing row only explains it
        match self
            .friendship_repo
            .claim(Friendship::new_pending(me, target, Utc::now()))
            .await?
        {
            FriendshipClaim::Won(friendship) => {
                info!(friendship_id = %friendship.friendship_id, from = %me, to = %target, "friend request sent");
                Ok(friendship)
            }
            FriendshipClaim::Existing(existing) => {
                let err = Self::classify_conflict(me, &existing);
                debug!(friendship_id = %existing.friendship_id, from = %me, to = %target, "friend request refused: {err}");
                Err(err)
            }
        }
    }

    async fn respond_to_request(
        &self,
        me: UserId,
        friendship_id: FriendshipId,
        action: RespondAction,
    ) -> Result<RespondOutcome, RelationError> {
        let (matched, outcome) = match action {
            RespondAction::Accept => (
                self.friendship_repo.accept_pending(friendship_id, me).await?,
                RespondOutcome::Accepted,
            ),
            RespondAction::Reject => (
                self.friendship_repo.delete_pending(friendship_id, me).await?,
                RespondOutcome::Rejected,
            ),
        };

        if !matched {
            debug!(%friendship_id, user = %me, %action, "no pending request addressed to user");
            return Err(RelationError::RequestNotFound);
        }

        info!(%friendship_id, user = %me, ?outcome, "friend request answered");
        Ok(outcome)
    }

    async fn list_friends(&self, me: UserId) -> Result<Vec<FriendSummary>, RelationError> {
        let friends = self.friendship_repo.list_accepted(me).await?;
        debug!(user = %me, count = friends.len(), "listed friends");
        Ok(friends)
    }

    async fn list_incoming_requests(
        &self,
        me: UserId,
    ) -> Result<Vec<IncomingRequest>, RelationError> {
        let requests = self.friendship_repo.list_incoming(me).await?;
        debug!(user = %me, count = requests.len(), "listed incoming requests");
        Ok(requests)
    }

    async fn remove_friendship(
        &self,
        me: UserId,
        friendship_id: FriendshipId,
    ) -> Result<(), RelationError> {
        if !self.friendship_repo.delete_accepted(friendship_id, me).await? {
            return Err(RelationError::RelationshipNotFound);
        }

        info!(%friendship_id, user = %me, "friendship removed");
        Ok(())
    }
}
