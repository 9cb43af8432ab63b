use super::MemoryUserRepo;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// `pairs` is the unique index on the canonical pair and owns the records.
/// `ids` maps a friendship id back to its pair; it is written while the
/// pair's shard is held so a lookup by id never sees a half-inserted record.
///
/// Listings join against `users` the way the MySQL adapter joins the `user`
/// table: records whose counterpart has no profile are left out.
pub struct MemoryFriendshipRepo {
    pairs: DashMap<UserPair, Friendship>,
    ids: DashMap<FriendshipId, UserPair>,
    users: Arc<MemoryUserRepo>,
}

impl MemoryFriendshipRepo {
    pub fn new(users: Arc<MemoryUserRepo>) -> Self {
        Self {
            pairs: DashMap::new(),
            ids: DashMap::new(),
            users,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, friendship_id: FriendshipId) -> Option<Friendship> {
        let pair = self.pair_of(friendship_id)?;

        self.pairs
            .get(&pair)
            .filter(|r| r.friendship_id == friendship_id)
            .map(|r| r.value().clone())
    }

    fn pair_of(&self, friendship_id: FriendshipId) -> Option<UserPair> {
        self.ids.get(&friendship_id).map(|r| *r.value())
    }

    fn delete_where<F>(&self, friendship_id: FriendshipId, predicate: F) -> bool
    where
        F: Fn(&Friendship) -> bool,
    {
        let Some(pair) = self.pair_of(friendship_id) else {
            return false;
        };

        let removed = self
            .pairs
            .remove_if(&pair, |_, f| f.friendship_id == friendship_id && predicate(f));
        if removed.is_some() {
            self.ids.remove(&friendship_id);
            return true;
        }

        false
    }

    fn collect_where<F>(&self, predicate: F) -> Vec<Friendship>
    where
        F: Fn(&Friendship) -> bool,
    {
        self.pairs
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MemoryFriendshipRepo {
    async fn claim(&self, friendship: Friendship) -> Result<FriendshipClaim, RelationError> {
        let pair = friendship.pair();
        if pair.is_degenerate() {
            return Err(RelationError::Store(
                "cannot store a friendship with self".to_string(),
            ));
        }

        match self.pairs.entry(pair) {
            Entry::Occupied(existing) => Ok(FriendshipClaim::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                self.ids.insert(friendship.friendship_id, pair);
                slot.insert(friendship.clone());
                Ok(FriendshipClaim::Won(friendship))
            }
        }
    }

    async fn accept_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError> {
        let Some(pair) = self.pair_of(friendship_id) else {
            return Ok(false);
        };
        let Some(mut record) = self.pairs.get_mut(&pair) else {
            return Ok(false);
        };

        if record.friendship_id != friendship_id || !record.is_pending_for(responder) {
            return Ok(false);
        }
        record.accept(responder, Utc::now());

        Ok(true)
    }

    async fn delete_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError> {
        Ok(self.delete_where(friendship_id, |f| f.is_pending_for(responder)))
    }

    async fn delete_accepted(
        &self,
        friendship_id: FriendshipId,
        member: UserId,
    ) -> Result<bool, RelationError> {
        Ok(self.delete_where(friendship_id, |f| f.is_accepted_with(member)))
    }

    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendSummary>, RelationError> {
        let mut records = self.collect_where(|f| f.is_accepted_with(user_id));
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(records
            .iter()
            .filter_map(|f| {
                let friend = self.users.profile(f.other_member(user_id)?)?;
                Some(FriendSummary::new(f, friend))
            })
            .collect())
    }

    async fn list_incoming(&self, user_id: UserId) -> Result<Vec<IncomingRequest>, RelationError> {
        let mut records = self.collect_where(|f| f.is_pending_for(user_id));
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records
            .iter()
            .filter_map(|f| {
                let sender = self.users.profile(f.action_user)?;
                Some(IncomingRequest::new(f, sender))
            })
            .collect())
    }
}
