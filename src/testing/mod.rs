use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Group, Role, User};
use crate::services::user_service::Registration;
use crate::services::UserService;

/// Database-backed fixtures for service tests.
///
/// Every user gets a unique email so tests can share one database without
/// cleaning up between runs.
pub struct TestContext {
    pub pool: PgPool,
    pub config: AppConfig,
}

impl TestContext {
    pub const PASSWORD: &'static str = "password123";

    /// Connects and applies the schema, or returns `None` when `DATABASE_URL` is unset.
    pub async fn connect() -> Option<Self> {
        let _ = dotenvy::dotenv();
        let url = std::env::var("DATABASE_URL").ok()?;

        let mut config = AppConfig::development();
        config.database.url = Some(url);
        config.database.max_connections = 5;
        // Fastest bcrypt cost keeps fixtures cheap
        config.security.bcrypt_cost = 4;

        let pool = DatabaseManager::connect(&config.database)
            .await
            .expect("DATABASE_URL is set but the database is unreachable");
        DatabaseManager::ensure_schema(&pool)
            .await
            .expect("failed to apply schema");

        Some(Self { pool, config })
    }

    pub fn unique_email(&self, prefix: &str) -> String {
        format!("{}-{}@test.example.com", prefix, Uuid::new_v4().simple())
    }

    /// Registers a local user. Registration also creates their default group.
    pub async fn create_user(&self, prefix: &str) -> anyhow::Result<User> {
        Ok(self.create_user_with_group(prefix).await?.0)
    }

    pub async fn create_user_with_group(&self, prefix: &str) -> anyhow::Result<(User, Group)> {
        let registration = Registration {
            email: Some(self.unique_email(prefix)),
            password: Some(Self::PASSWORD.to_string()),
            first_name: Some(prefix.to_string()),
            last_name: None,
            auth_provider: None,
        };
        UserService::new(self.pool.clone())
            .register(registration, &self.config.security)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to register test user: {}", e))
    }

    pub async fn add_member(&self, group_id: i32, user_id: i32, role: Role) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO user_groups (user_id, group_id, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(group_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unique_emails_differ() {
        let Some(ctx) = TestContext::connect().await else { return };
        let a = ctx.unique_email("ctx");
        let b = ctx.unique_email("ctx");
        assert_ne!(a, b);
        assert!(a.starts_with("ctx-"));
    }

    #[tokio::test]
    async fn created_user_owns_default_group() {
        let Some(ctx) = TestContext::connect().await else { return };
        let (user, group) = ctx.create_user_with_group("ctx-owner").await.unwrap();
        assert_eq!(group.owner_id, Some(user.id));
    }
}
