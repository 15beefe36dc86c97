//! User account management
//!
//! SQLite-backed storage for marketplace users. Passwords are stored as
//! argon2 hashes; moderation flags (`is_active`, `is_blocked`) gate caller
//! resolution for every protected operation.

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{User, UserData, UserRole, UserUpdate};
pub use repository::UserRepository;
