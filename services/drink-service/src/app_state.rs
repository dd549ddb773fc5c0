use std::sync::Arc;

use axum::extract::FromRef;
use common_auth::AuthGuard;

use crate::store::DrinkStore;

/// Shared application state used by handlers.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: Arc<dyn DrinkStore>,
    pub(crate) auth_guard: Arc<AuthGuard>,
}

impl AppState {
    pub fn new(store: Arc<dyn DrinkStore>, auth_guard: Arc<AuthGuard>) -> Self {
        Self { store, auth_guard }
    }

    pub fn store(&self) -> &Arc<dyn DrinkStore> {
        &self.store
    }
}

impl FromRef<AppState> for Arc<AuthGuard> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_guard.clone()
    }
}
