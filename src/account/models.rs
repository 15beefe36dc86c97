//! Data models for user account management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
    Moderator,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
        }
    }

    /// Unknown values from storage fall back to the least-privileged role.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            "moderator" => UserRole::Moderator,
            _ => UserRole::User,
        }
    }
}

/// User account row
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may act as a caller at all.
    pub fn is_operational(&self) -> bool {
        self.is_active && !self.is_blocked
    }
}

/// Public view of a user (no credential material)
#[derive(Debug, Serialize, ToSchema)]
pub struct UserData {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserData {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            is_active: u.is_active,
            is_blocked: u.is_blocked,
            created_at: u.created_at,
        }
    }
}

/// Partial update; unset fields are left unchanged.
///
/// `is_active` / `is_blocked` may only be patched by an admin; blocking is
/// a moderation action, not self-service.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_blocked: Option<bool>,
}

impl UserUpdate {
    pub fn touches_moderation_flags(&self) -> bool {
        self.is_active.is_some() || self.is_blocked.is_some()
    }
}
