use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::MySqlRow;
use sqlx::{Database, Decode, Encode, MySqlPool, Row, Type};

// A duplicate key followed by an empty read means the row was deleted in
// between; the insert is tried this many times in total.
const CLAIM_ATTEMPTS: usize = 3;

const SELECT_FIELDS: &str =
    "friendship_id, user_low, user_high, status, action_user, created_at, updated_at";

impl<'r, DB: Database> Decode<'r, DB> for FriendshipStatus
where
    &'r str: Decode<'r, DB>,
{
    fn decode(value: <DB as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<DB>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl<'q, DB: Database> Encode<'q, DB> for FriendshipStatus
where
    String: Encode<'q, DB>,
{
    fn encode_by_ref(
        &self,
        buf: &mut <DB as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        self.to_string().encode_by_ref(buf)
    }
}

impl<DB: Database> Type<DB> for FriendshipStatus
where
    String: Type<DB>,
{
    fn type_info() -> <DB as Database>::TypeInfo {
        <String as Type<DB>>::type_info()
    }

    fn compatible(ty: &<DB as Database>::TypeInfo) -> bool {
        <String as Type<DB>>::compatible(ty)
    }
}

pub struct MySqlFriendshipRepo {
    pool: MySqlPool,
}

impl MySqlFriendshipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &MySqlRow) -> Result<Friendship, RelationError> {
        let decode = |field: &str, e: sqlx::Error| RelationError::Store(format!("decode {field}: {e}"));

        Ok(Friendship {
            friendship_id: row
                .try_get::<FriendshipId, _>("friendship_id")
                .map_err(|e| decode("friendship_id", e))?,
            user_low: row
                .try_get::<UserId, _>("user_low")
                .map_err(|e| decode("user_low", e))?,
            user_high: row
                .try_get::<UserId, _>("user_high")
                .map_err(|e| decode("user_high", e))?,
            status: row
                .try_get::<FriendshipStatus, _>("status")
                .map_err(|e| decode("status", e))?,
            action_user: row
                .try_get::<UserId, _>("action_user")
                .map_err(|e| decode("action_user", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| decode("created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| decode("updated_at", e))?,
        })
    }

    fn row_to_profile(row: &MySqlRow) -> Result<UserProfile, RelationError> {
        let decode = |field: &str, e: sqlx::Error| RelationError::Store(format!("decode {field}: {e}"));

        Ok(UserProfile {
            user_id: row
                .try_get::<UserId, _>("user_id")
                .map_err(|e| decode("user_id", e))?,
            username: row
                .try_get::<String, _>("username")
                .map_err(|e| decode("username", e))?,
            profile_picture_url: row
                .try_get::<Option<String>, _>("profile_picture_url")
                .map_err(|e| decode("profile_picture_url", e))?,
        })
    }

    fn row_to_friend(row: &MySqlRow) -> Result<FriendSummary, RelationError> {
        let friend = Self::row_to_profile(row)?;

        Ok(FriendSummary {
            friendship_id: row
                .try_get::<FriendshipId, _>("friendship_id")
                .map_err(store_err("decode friendship_id"))?,
            user_id: friend.user_id,
            username: friend.username,
            profile_picture_url: friend.profile_picture_url,
            since: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(store_err("decode updated_at"))?,
        })
    }

    fn row_to_incoming(row: &MySqlRow) -> Result<IncomingRequest, RelationError> {
        let sender = Self::row_to_profile(row)?;

        Ok(IncomingRequest {
            friendship_id: row
                .try_get::<FriendshipId, _>("friendship_id")
                .map_err(store_err("decode friendship_id"))?,
            sender_id: sender.user_id,
            sender_username: sender.username,
            sender_profile_picture_url: sender.profile_picture_url,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(store_err("decode created_at"))?,
        })
    }

    async fn insert_row(&self, friendship: &Friendship) -> Result<InsertAttempt, RelationError> {
        let pair = friendship.pair();
        let res = sqlx::query(
            r#"
INSERT INTO friendship (friendship_id, user_low, user_high, status, action_user, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(friendship.friendship_id)
        .bind(pair.low())
        .bind(pair.high())
        .bind(friendship.status)
        .bind(friendship.action_user)
        .bind(friendship.created_at)
        .bind(friendship.updated_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(InsertAttempt::Inserted),
            Err(e) if is_dup_key(&e) => Ok(InsertAttempt::DuplicatePair),
            Err(e) => Err(RelationError::Store(format!("friendship insert: {e}"))),
        }
    }

    pub async fn get(
        &self,
        friendship_id: FriendshipId,
    ) -> Result<Option<Friendship>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_FIELDS} FROM friendship WHERE friendship_id = ?"
        ))
        .bind(friendship_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select friendship by id"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    pub async fn get_by_pair(&self, pair: UserPair) -> Result<Option<Friendship>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_FIELDS} FROM friendship WHERE user_low = ? AND user_high = ?"
        ))
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select friendship by pair"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}

enum InsertAttempt {
    Inserted,
    DuplicatePair,
}

/// Insert, and on a duplicate pair read the record holding it. Returns that
/// record, or `None` once an insert went through. A holder that vanished
/// before the read sends the loop back to the insert.
async fn claim_pair<Ins, InsFut, Read, ReadFut>(
    pair: UserPair,
    mut insert: Ins,
    mut read_holder: Read,
) -> Result<Option<Friendship>, RelationError>
where
    Ins: FnMut() -> InsFut,
    InsFut: Future<Output = Result<InsertAttempt, RelationError>>,
    Read: FnMut() -> ReadFut,
    ReadFut: Future<Output = Result<Option<Friendship>, RelationError>>,
{
    for attempt in 1..=CLAIM_ATTEMPTS {
        match insert().await? {
            InsertAttempt::Inserted => return Ok(None),
            InsertAttempt::DuplicatePair => {
                if let Some(holder) = read_holder().await? {
                    return Ok(Some(holder));
                }
                debug!(attempt, low = %pair.low(), high = %pair.high(), "conflicting friendship vanished, retrying insert");
            }
        }
    }

    Err(RelationError::Store(format!(
        "friendship pair kept changing after {CLAIM_ATTEMPTS} attempts"
    )))
}

#[async_trait::async_trait]
impl FriendshipRepo for MySqlFriendshipRepo {
    async fn claim(&self, friendship: Friendship) -> Result<FriendshipClaim, RelationError> {
        let pair = friendship.pair();
        if pair.is_degenerate() {
            return Err(RelationError::Store(
                "cannot store a friendship with self".to_string(),
            ));
        }

        let (repo, row) = (self, &friendship);
        let holder = claim_pair(
            pair,
            move || repo.insert_row(row),
            move || repo.get_by_pair(pair),
        )
        .await?;

        Ok(match holder {
            None => FriendshipClaim::Won(friendship),
            Some(existing) => FriendshipClaim::Existing(existing),
        })
    }

    async fn accept_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE friendship
SET status = ?, action_user = ?, updated_at = ?
WHERE friendship_id = ?
  AND status = ?
  AND action_user <> ?
  AND (user_low = ? OR user_high = ?)
"#,
        )
        .bind(FriendshipStatus::Accepted)
        .bind(responder)
        .bind(Utc::now())
        .bind(friendship_id)
        .bind(FriendshipStatus::Pending)
        .bind(responder)
        .bind(responder)
        .bind(responder)
        .execute(&self.pool)
        .await
        .map_err(store_err("accept friendship"))?;

        Ok(res.rows_affected() == 1)
    }

    async fn delete_pending(
        &self,
        friendship_id: FriendshipId,
        responder: UserId,
    ) -> Result<bool, RelationError> {
        let res = sqlx::query(
            r#"
DELETE FROM friendship
WHERE friendship_id = ?
  AND status = ?
  AND action_user <> ?
  AND (user_low = ? OR user_high = ?)
"#,
        )
        .bind(friendship_id)
        .bind(FriendshipStatus::Pending)
        .bind(responder)
        .bind(responder)
        .bind(responder)
        .execute(&self.pool)
        .await
        .map_err(store_err("reject friendship"))?;

        Ok(res.rows_affected() == 1)
    }

    async fn delete_accepted(
        &self,
        friendship_id: FriendshipId,
        member: UserId,
    ) -> Result<bool, RelationError> {
        let res = sqlx::query(
            r#"
DELETE FROM friendship
WHERE friendship_id = ?
  AND status = ?
  AND (user_low = ? OR user_high = ?)
"#,
        )
        .bind(friendship_id)
        .bind(FriendshipStatus::Accepted)
        .bind(member)
        .bind(member)
        .execute(&self.pool)
        .await
        .map_err(store_err("remove friendship"))?;

        Ok(res.rows_affected() == 1)
    }

    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendSummary>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT f.friendship_id, f.updated_at, u.user_id, u.username, u.profile_picture_url
FROM friendship f
JOIN user u ON u.user_id = IF(f.user_low = ?, f.user_high, f.user_low)
WHERE f.status = ?
  AND (f.user_low = ? OR f.user_high = ?)
ORDER BY f.updated_at DESC
"#,
        )
        .bind(user_id)
        .bind(FriendshipStatus::Accepted)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list friends"))?;

        rows.iter().map(Self::row_to_friend).collect()
    }

    async fn list_incoming(&self, user_id: UserId) -> Result<Vec<IncomingRequest>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT f.friendship_id, f.created_at, u.user_id, u.username, u.profile_picture_url
FROM friendship f
JOIN user u ON u.user_id = f.action_user
WHERE f.status = ?
  AND f.action_user <> ?
  AND (f.user_low = ? OR f.user_high = ?)
ORDER BY f.created_at DESC
"#,
        )
        .bind(FriendshipStatus::Pending)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list incoming requests"))?;

        rows.iter().map(Self::row_to_incoming).collect()
    }
}
