use std::fmt;
use std::sync::Arc;

use custos_core::ports::{AuditRepository, UserRepository};

use crate::audit::publisher::AuditPublisher;
use crate::auth::jwt::TokenService;
use crate::infra::config::Config;

/// Shared per-process state handed to every request task. Store handles are
/// internally synchronized; nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub audit_logs: Arc<dyn AuditRepository>,
    pub tokens: Arc<TokenService>,
    pub audit: AuditPublisher,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
