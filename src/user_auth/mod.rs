//! User registration, login, and JWT session verification.

pub mod handlers;
pub mod middleware;
pub mod service;

pub use service::{
    hash_password, AuthResponse, Claims, LoginRequest, RegisterRequest, UserAuthService,
};
