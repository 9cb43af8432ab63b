use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Stable id derived from a username, used by the fake identity backend
    /// and the in-memory user directory seed.
    pub fn from_name(name: &str) -> Self {
        UserId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Display details of a user, shown next to friends and incoming requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub profile_picture_url: Option<String>,
}

/// Two user ids in canonical order, so `{a, b}` and `{b, a}` compare equal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn low(&self) -> UserId {
        self.0
    }

    pub fn high(&self) -> UserId {
        self.1
    }

    pub fn is_degenerate(&self) -> bool {
        self.0 == self.1
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.0 == user || self.1 == user
    }

    /// The member that is not `user`, or `None` if `user` is not in the pair.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.0 {
            Some(self.1)
        } else if user == self.1 {
            Some(self.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn uid(n: u128) -> UserId {
        UserId(Uuid::from_u128(n))
    }

    #[test]
    fn pair_is_order_independent() {
        let forward = UserPair::new(uid(1), uid(2));
        let backward = UserPair::new(uid(2), uid(1));

        assert_eq!(forward, backward);
        assert_eq!(forward.low(), uid(1));
        assert_eq!(forward.high(), uid(2));
    }

    #[test]
    fn pair_resolves_other_member() {
        let pair = UserPair::new(uid(7), uid(3));

        assert_eq!(pair.other(uid(3)), Some(uid(7)));
        assert_eq!(pair.other(uid(7)), Some(uid(3)));
        assert_eq!(pair.other(uid(9)), None);
        assert!(pair.contains(uid(3)));
        assert!(!pair.contains(uid(9)));
    }

    #[test]
    fn same_user_pair_is_degenerate() {
        assert!(UserPair::new(uid(4), uid(4)).is_degenerate());
        assert!(!UserPair::new(uid(4), uid(5)).is_degenerate());
    }

    #[test]
    fn names_map_to_stable_ids() {
        assert_eq!(UserId::from_name("alice"), UserId::from_name("alice"));
        assert_ne!(UserId::from_name("alice"), UserId::from_name("bob"));
    }
}
