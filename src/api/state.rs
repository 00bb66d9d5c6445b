//! Shared application state

use std::sync::Arc;

use crate::api::auth::AdminCredentials;
use crate::config::Config;
use crate::hub::{HubHandle, KeepaliveConfig};
use crate::store::MessageStore;

/// State shared by all request handlers.
pub struct AppState {
    /// Handle to the broadcast engine
    pub hub: HubHandle,

    /// Durable message store, for range queries
    pub store: Arc<dyn MessageStore>,

    /// Credentials for the authenticated endpoints
    pub credentials: AdminCredentials,

    /// Keepalive timing handed to each new connection
    pub keepalive: KeepaliveConfig,

    /// Allowed browser origin for CORS
    pub frontend_url: String,
}

impl AppState {
    pub fn new(hub: HubHandle, store: Arc<dyn MessageStore>, config: &Config) -> Self {
        Self {
            hub,
            store,
            credentials: AdminCredentials {
                username: config.admin_username.clone(),
                password: config.admin_password.clone(),
            },
            keepalive: config.keepalive.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }
}
