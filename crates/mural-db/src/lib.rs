pub mod config;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::info;

use crate::config::{DatabaseConfig, Engine};
use crate::models::{NewPublication, PublicationRow, UserRow};
use crate::postgres::PgStore;
use crate::sqlite::SqliteStore;

/// Read access to `usuarios`. Users are created out of band.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>>;
}

/// Everything the API does to `publicacoes`.
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// Inserts and returns the generated id.
    async fn create(&self, publication: &NewPublication) -> Result<u64>;

    /// Joins the author's nick. `Ok(None)` when the id does not exist.
    async fn find_by_id(&self, id: u64) -> Result<Option<PublicationRow>>;

    /// Publications by `user_id` or by anyone `user_id` follows, newest id first.
    async fn list_feed(&self, user_id: u64) -> Result<Vec<PublicationRow>>;

    async fn list_by_author(&self, author_id: u64) -> Result<Vec<PublicationRow>>;

    /// Touches only title and content.
    async fn update(&self, id: u64, title: &str, content: &str) -> Result<()>;

    async fn delete(&self, id: u64) -> Result<()>;

    async fn like(&self, id: u64) -> Result<()>;

    /// Decrements the like counter, never below zero.
    async fn unlike(&self, id: u64) -> Result<()>;
}

/// Both stores, backed by the same engine.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub publications: Arc<dyn PublicationStore>,
}

impl Stores {
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserStore + PublicationStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            publications: store,
        }
    }
}

/// Opens the engine selected by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<Stores> {
    match config.engine {
        Engine::Postgres => {
            let store = PgStore::connect(config).await?;
            info!("Connected to PostgreSQL at {}:{}/{}", config.host, config.port, config.name);
            Ok(Stores::from_store(store))
        }
        Engine::Sqlite => {
            let store = SqliteStore::open(&config.name)?;
            Ok(Stores::from_store(store))
        }
    }
}

/// Both engines use signed 64-bit ids.
pub(crate) fn db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| anyhow!("id out of range: {}", id))
}

pub(crate) fn api_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|_| anyhow!("negative id in database: {}", id))
}
