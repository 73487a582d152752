use std::sync::Arc;

use mural_db::{PublicationStore, Stores, UserStore};

use crate::metrics::Metrics;
use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

/// Everything handlers share. Built once at startup; nothing in here is
/// mutated afterwards except the metric counters.
pub struct AppStateInner {
    pub users: Arc<dyn UserStore>,
    pub publications: Arc<dyn PublicationStore>,
    pub tokens: TokenKeys,
    pub metrics: Metrics,
}

impl AppStateInner {
    pub fn new(stores: Stores, tokens: TokenKeys) -> anyhow::Result<AppState> {
        Ok(Arc::new(Self {
            users: stores.users,
            publications: stores.publications,
            tokens,
            metrics: Metrics::new()?,
        }))
    }
}
