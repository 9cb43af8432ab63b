use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserProfile>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with `names`, ids derived by [`UserId::from_name`].
    pub fn with_usernames<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let repo = Self::new();
        for name in names {
            repo.insert(UserId::from_name(name.as_ref()), name.as_ref());
        }
        repo
    }

    pub fn insert(&self, user_id: UserId, username: &str) {
        self.insert_profile(UserProfile {
            user_id,
            username: username.to_owned(),
            profile_picture_url: None,
        });
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.users.insert(profile.user_id, profile);
    }

    pub fn profile(&self, user_id: UserId) -> Option<UserProfile> {
        self.users.get(&user_id).map(|r| r.value().clone())
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn id_exists(&self, user_id: UserId) -> Result<bool, RelationError> {
        Ok(self.users.contains_key(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_names_are_known() {
        let repo = MemoryUserRepo::with_usernames(["alice", "bob"]);

        assert!(repo.id_exists(UserId::from_name("alice")).await.unwrap());
        assert!(!repo.id_exists(UserId::from_name("carol")).await.unwrap());

        let bob = repo.profile(UserId::from_name("bob")).unwrap();
        assert_eq!(bob.username, "bob");
        assert_eq!(bob.profile_picture_url, None);
    }
}
