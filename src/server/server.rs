use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let user_repo: Arc<dyn UserRepo>;
        let friendship_repo: Arc<dyn FriendshipRepo>;
        let mut pool = None;
        match settings.store.backend.as_str() {
            "memory" => {
                warn!("using in-memory store, friendships are lost on restart");
                let users = Arc::new(MemoryUserRepo::with_usernames(&settings.store.seed_users));
                friendship_repo = Arc::new(MemoryFriendshipRepo::new(users.clone()));
                user_repo = users;
            }
            "mysql" => {
                let mysql = MySqlPoolOptions::new()
                    .max_connections(settings.store.max_connections)
                    .connect(&settings.store.dsn)
                    .await?;
                if settings.store.run_migrations {
                    MIGRATOR.run(&mysql).await?;
                    info!("migrations applied");
                }
                user_repo = Arc::new(MySqlUserRepo::new(mysql.clone()));
                friendship_repo = Arc::new(MySqlFriendshipRepo::new(mysql.clone()));
                pool = Some(mysql);
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => {
                let key = std::env::var("JWT_SIGNING_KEY")
                    .map_err(|_| anyhow::anyhow!("JWT_SIGNING_KEY must be set for real auth"))?
                    .into_bytes();
                let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key,
                }));
                Arc::new(RealAuthService::new(token_codec))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(user_repo, friendship_repo));

        info!(
            store = %settings.store.backend,
            auth = %settings.auth.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            relationship_service,
            pool,
        })
    }

    /// Server over already-built services, with no pool to close.
    pub fn with_services(
        auth_service: Arc<dyn AuthService>,
        relationship_service: Arc<dyn RelationshipService>,
    ) -> Self {
        Self {
            auth_service,
            relationship_service,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("database pool closed");
        }
    }
}
