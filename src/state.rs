use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{EntityMeta, EntityStore};
use crate::services::{AuthService, EmailSender, EntityService, UserService};

/// Shared handles every request handler gets through `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn EntityStore>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn EntityStore>, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            mailer,
        }
    }

    pub fn entities(&self, meta: &'static EntityMeta) -> EntityService {
        EntityService::new(meta, self.store.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.config.clone(), self.store.clone(), self.mailer.clone())
    }
}
