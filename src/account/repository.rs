//! Repository layer for user storage

use super::models::{User, UserRole};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn map_user(r: &SqliteRow) -> User {
    User {
        id: r.get("id"),
        email: r.get("email"),
        username: r.get("username"),
        hashed_password: r.get("hashed_password"),
        role: UserRole::from_str_lossy(&r.get::<String, _>("role")),
        is_active: r.get("is_active"),
        is_blocked: r.get("is_blocked"),
        created_at: r.get("created_at"),
    }
}

const USER_COLUMNS: &str =
    "id, email, username, hashed_password, role, is_active, is_blocked, created_at";

/// User repository for CRUD operations
pub struct UserRepository;

impl UserRepository {
    /// Get user by ID
    pub async fn get_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| map_user(&r)))
    }

    /// Get user by email
    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| map_user(&r)))
    }

    /// Create a new user; fails on duplicate email/username
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        username: &str,
        hashed_password: &str,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"INSERT INTO users (email, username, hashed_password, role, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(email)
        .bind(username)
        .bind(hashed_password)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(row.get("id"))
    }

    /// Persist mutable fields of an already-loaded user
    pub async fn save(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE users
               SET email = ?, username = ?, hashed_password = ?, is_active = ?, is_blocked = ?
               WHERE id = ?"#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(user.is_blocked)
        .bind(user.id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// List every user (admin moderation view)
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(map_user).collect())
    }

    /// Set the blocked flag; returns false if the user does not exist
    pub async fn set_blocked(
        pool: &SqlitePool,
        user_id: i64,
        blocked: bool,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("UPDATE users SET is_blocked = ? WHERE id = ?")
            .bind(blocked)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::connect_in_memory().await.unwrap();

        let id = UserRepository::create(db.pool(), "alice@example.com", "alice", "h", UserRole::User)
            .await
            .unwrap();
        assert!(id > 0);

        let user = UserRepository::get_by_id(db.pool(), id).await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert!(!user.is_blocked);

        let by_email = UserRepository::get_by_email(db.pool(), "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = Database::connect_in_memory().await.unwrap();

        UserRepository::create(db.pool(), "a@b.c", "a", "h", UserRole::User)
            .await
            .unwrap();
        let err = UserRepository::create(db.pool(), "a@b.c", "other", "h", UserRole::User)
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_block_unblock() {
        let db = Database::connect_in_memory().await.unwrap();
        let id = UserRepository::create(db.pool(), "b@b.c", "bob", "h", UserRole::User)
            .await
            .unwrap();

        assert!(UserRepository::set_blocked(db.pool(), id, true).await.unwrap());
        let user = UserRepository::get_by_id(db.pool(), id).await.unwrap().unwrap();
        assert!(user.is_blocked);

        assert!(UserRepository::set_blocked(db.pool(), id, false).await.unwrap());
        let user = UserRepository::get_by_id(db.pool(), id).await.unwrap().unwrap();
        assert!(!user.is_blocked);

        // unknown user
        assert!(!UserRepository::set_blocked(db.pool(), 9999, true).await.unwrap());
    }
}
