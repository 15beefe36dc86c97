//! Shared state handed to every handler.

use std::sync::Arc;

use crate::db::Database;
use crate::user_auth::UserAuthService;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub user_auth: Arc<UserAuthService>,
}

impl AppState {
    pub fn new(db: Arc<Database>, jwt_secret: String) -> Self {
        let user_auth = Arc::new(UserAuthService::new(db.pool().clone(), jwt_secret));
        Self { db, user_auth }
    }
}
