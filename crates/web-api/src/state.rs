use std::sync::Arc;

use application::{InboxService, TokenService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub inbox_service: Arc<InboxService>,
    pub token_service: Arc<dyn TokenService>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        inbox_service: Arc<InboxService>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            user_service,
            inbox_service,
            token_service,
        }
    }
}
