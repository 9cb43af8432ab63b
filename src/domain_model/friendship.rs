use crate::domain_model::{UserId, UserPair, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct FriendshipId(pub uuid::Uuid);

impl FriendshipId {
    pub fn new_v4() -> Self {
        FriendshipId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for FriendshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FriendshipId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(FriendshipId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        };
        f.write_str(s)
    }
}

impl FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            other => Err(format!("unknown friendship status: {other}")),
        }
    }
}

/// The single record kept per unordered pair of users.
///
/// `action_user` is whoever changed the state last: the requester while
/// pending, the accepter once accepted. Rejected and removed friendships are
/// deleted rather than kept under another status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friendship {
    pub friendship_id: FriendshipId,
    pub user_low: UserId,
    pub user_high: UserId,
    pub status: FriendshipStatus,
    pub action_user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// A fresh pending request from `requester` to `target`.
    pub fn new_pending(requester: UserId, target: UserId, now: DateTime<Utc>) -> Self {
        let pair = UserPair::new(requester, target);
        Friendship {
            friendship_id: FriendshipId::new_v4(),
            user_low: pair.low(),
            user_high: pair.high(),
            status: FriendshipStatus::Pending,
            action_user: requester,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.user_low, self.user_high)
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.pair().contains(user)
    }

    pub fn other_member(&self, user: UserId) -> Option<UserId> {
        self.pair().other(user)
    }

    /// Pending and addressed to `user`, i.e. `user` may accept or reject it.
    pub fn is_pending_for(&self, user: UserId) -> bool {
        self.status == FriendshipStatus::Pending && self.is_member(user) && self.action_user != user
    }

    pub fn is_accepted_with(&self, user: UserId) -> bool {
        self.status == FriendshipStatus::Accepted && self.is_member(user)
    }

    pub fn accept(&mut self, responder: UserId, now: DateTime<Utc>) {
        self.status = FriendshipStatus::Accepted;
        self.action_user = responder;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondAction {
    Accept,
    Reject,
}

impl fmt::Display for RespondAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespondAction::Accept => f.write_str("accept"),
            RespondAction::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondOutcome {
    Accepted,
    Rejected,
}

/// An accepted friendship seen from one member, carrying the other member's
/// display details.
#[derive(Debug, Clone, Serialize)]
pub struct FriendSummary {
    pub friendship_id: FriendshipId,
    pub user_id: UserId,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub since: DateTime<Utc>,
}

impl FriendSummary {
    pub fn new(friendship: &Friendship, friend: UserProfile) -> Self {
        FriendSummary {
            friendship_id: friendship.friendship_id,
            user_id: friend.user_id,
            username: friend.username,
            profile_picture_url: friend.profile_picture_url,
            since: friendship.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncomingRequest {
    pub friendship_id: FriendshipId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub sender_profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IncomingRequest {
    pub fn new(friendship: &Friendship, sender: UserProfile) -> Self {
        IncomingRequest {
            friendship_id: friendship.friendship_id,
            sender_id: sender.user_id,
            sender_username: sender.username,
            sender_profile_picture_url: sender.profile_picture_url,
            created_at: friendship.created_at,
        }
    }
}
