use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;
use validator::Validate;

use crate::account::{UserRepository, UserRole};
use crate::error::ApiError;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// User Registration Request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(min = 3, max = 32))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 8))]
    #[schema(example = "password123")]
    pub password: String,
}

/// User Login Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
}

pub struct UserAuthService {
    db: SqlitePool,
    jwt_secret: String,
}

impl UserAuthService {
    pub fn new(db: SqlitePool, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    /// Register a new user; duplicate email/username is a `Conflict`.
    pub async fn register(&self, req: RegisterRequest) -> Result<i64, ApiError> {
        req.validate()
            .map_err(|e| ApiError::invalid_input(e.to_string()))?;

        let password_hash = hash_password(&req.password)?;

        let user_id = UserRepository::create(
            &self.db,
            &req.email,
            &req.username,
            &password_hash,
            UserRole::User,
        )
        .await
        .map_err(|e| ApiError::from_unique_violation(e, "Email or username already registered"))?;

        tracing::info!(user_id, "user registered");
        Ok(user_id)
    }

    /// Login user and issue JWT
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        let user = UserRepository::get_by_email(&self.db, &req.email)
            .await?
            .ok_or(ApiError::Unauthenticated("invalid email or password"))?;

        let parsed_hash = PasswordHash::new(&user.hashed_password)
            .map_err(|e| ApiError::internal(format!("stored hash unreadable: {e}")))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthenticated("invalid email or password"))?;

        if !user.is_operational() {
            return Err(ApiError::Forbidden("account is blocked or inactive"));
        }

        let token = self.issue_token(user.id)?;

        Ok(AuthResponse {
            token,
            user_id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    fn issue_token(&self, user_id: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(24);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("token generation failed: {e}")))
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::Unauthenticated("invalid or expired token"))?;
        Ok(token_data.claims)
    }
}
