//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{ListParams, PagedResult, User, UserRole};

/// Filter for public user listings
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive username contains
    pub username: Option<String>,
    /// Case-insensitive organization contains
    pub organization: Option<String>,
    pub role: Option<UserRole>,
    pub country: Option<String>,
    /// Only users owning at least one module
    pub has_modules: Option<bool>,
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;

    async fn get(&self, id: i64) -> Result<Option<User>>;

    async fn by_username(&self, username: &str) -> Result<Option<User>>;

    async fn by_email(&self, email: &str) -> Result<Option<User>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Persist profile fields, role and block flag
    async fn update(&self, user: &User) -> Result<()>;

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<()>;

    /// Public listing: blocked users are always hidden
    async fn list(&self, filter: &UserFilter, params: &ListParams) -> Result<PagedResult<User>>;

    /// The oldest active admin account, if any
    async fn first_admin(&self) -> Result<Option<User>>;

    /// Number of active modules owned by the user
    async fn module_count(&self, user_id: i64) -> Result<i64>;

    /// Total likes across the user's modules
    async fn likes_received(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users
                (username, email, password_hash, role, is_blocked, first_name,
                 last_name, organization, country, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_blocked)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.organization)
        .bind(&user.country)
        .bind(&user.phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        let mut created = user.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by username")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by email")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ? LIMIT 1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check username")?;
        Ok(row.is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check email")?;
        Ok(row.is_some())
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = ?, role = ?, is_blocked = ?, first_name = ?, last_name = ?,
                organization = ?, country = ?, phone = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(user.role.to_string())
        .bind(user.is_blocked)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.organization)
        .bind(&user.country)
        .bind(&user.phone)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(())
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set password")?;
        Ok(())
    }

    async fn list(&self, filter: &UserFilter, params: &ListParams) -> Result<PagedResult<User>> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS c FROM users u WHERE u.is_blocked = 0");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?
            .get("c");

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT u.* FROM users u WHERE u.is_blocked = 0");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY u.username");
        qb.push(" LIMIT ").push_bind(params.limit());
        qb.push(" OFFSET ").push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        let items = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn first_admin(&self) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT * FROM users WHERE role = 'admin' AND is_blocked = 0 ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find admin user")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn module_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS c FROM modules WHERE created_by = ? AND status = 'active'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count user modules")?;
        Ok(row.get("c"))
    }

    async fn likes_received(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS c FROM module_likes ml \
             JOIN modules m ON m.id = ml.module_id WHERE m.created_by = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count received likes")?;
        Ok(row.get("c"))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    if let Some(username) = &filter.username {
        qb.push(" AND u.username LIKE ");
        qb.push_bind(format!("%{}%", username));
    }
    if let Some(organization) = &filter.organization {
        qb.push(" AND u.organization LIKE ");
        qb.push_bind(format!("%{}%", organization));
    }
    if let Some(role) = filter.role {
        qb.push(" AND u.role = ");
        qb.push_bind(role.to_string());
    }
    if let Some(country) = &filter.country {
        qb.push(" AND u.country = ");
        qb.push_bind(country.clone());
    }
    match filter.has_modules {
        Some(true) => {
            qb.push(" AND EXISTS (SELECT 1 FROM modules m WHERE m.created_by = u.id)");
        }
        Some(false) => {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM modules m WHERE m.created_by = u.id)");
        }
        None => {}
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        is_blocked: row.get("is_blocked"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        organization: row.get("organization"),
        country: row.get("country"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    fn sample_user(username: &str) -> User {
        User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hash".to_string(),
            UserRole::User,
        )
    }

    #[tokio::test]
    async fn test_create_and_lookups() {
        let pool = setup().await;
        let repo = SqlxUserRepository::new(pool);

        let created = repo.create(&sample_user("alice")).await.unwrap();
        assert!(created.id > 0);

        assert!(repo.by_username("alice").await.unwrap().is_some());
        assert!(repo.by_email("alice@example.com").await.unwrap().is_some());
        assert!(repo.username_exists("alice").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());

        let dup = repo.create(&sample_user("alice")).await;
        assert!(dup.is_err(), "duplicate username must be rejected");
    }

    #[tokio::test]
    async fn test_update_profile_and_block() {
        let pool = setup().await;
        let repo = SqlxUserRepository::new(pool);

        let mut user = repo.create(&sample_user("carol")).await.unwrap();
        user.organization = "MSU".to_string();
        user.is_blocked = true;
        repo.update(&user).await.unwrap();

        let fetched = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.organization, "MSU");
        assert!(fetched.is_blocked);

        // Blocked users are hidden from the public listing
        let listed = repo
            .list(&UserFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn test_set_password() {
        let pool = setup().await;
        let repo = SqlxUserRepository::new(pool);

        let user = repo.create(&sample_user("dave")).await.unwrap();
        repo.set_password(user.id, "new-hash").await.unwrap();

        let fetched = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_first_admin() {
        let pool = setup().await;
        let repo = SqlxUserRepository::new(pool);

        assert!(repo.first_admin().await.unwrap().is_none());

        repo.create(&sample_user("plain")).await.unwrap();
        let mut admin = sample_user("root");
        admin.role = UserRole::Admin;
        let admin = repo.create(&admin).await.unwrap();

        let found = repo.first_admin().await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
    }

    #[tokio::test]
    async fn test_has_modules_filter() {
        let pool = setup().await;
        let repo = SqlxUserRepository::new(pool.clone());

        let owner = repo.create(&sample_user("owner")).await.unwrap();
        repo.create(&sample_user("reader")).await.unwrap();

        sqlx::query(
            "INSERT INTO modules (name, slug, company, country, params_count,
             short_description, status, created_by, created_at, updated_at)
             VALUES ('m', 'm', 'c', 'Russia', 1, 'd', 'active', ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .bind(owner.id)
        .execute(&pool)
        .await
        .unwrap();

        let with = repo
            .list(
                &UserFilter {
                    has_modules: Some(true),
                    ..Default::default()
                },
                &ListParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(with.total, 1);
        assert_eq!(with.items[0].username, "owner");

        assert_eq!(repo.module_count(owner.id).await.unwrap(), 1);
    }
}
