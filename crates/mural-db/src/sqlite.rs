use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use crate::models::{NewPublication, PublicationRow, UserRow};
use crate::{PublicationStore, UserStore, api_id, db_id, schema};

const IN_MEMORY: &str = ":memory:";

const SELECT_PUBLICATION: &str = "
    SELECT p.id, p.titulo, p.conteudo, p.autor_id, p.curtidas, p.criado_em, u.nick
    FROM publicacoes p
    INNER JOIN usuarios u ON u.id = p.autor_id";

/// Embedded store: one SQLite connection behind a mutex. Every call runs on
/// the blocking pool so the async runtime never waits on disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        if path != Path::new(IN_MEMORY) {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;

        schema::bootstrap_sqlite(&conn)?;

        info!("SQLite database opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
            f(&conn)
        })
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
    }

    // -- Out-of-band data (users and follows are not managed by the API) --

    pub async fn insert_user(&self, nick: &str, email: &str, password_hash: &str) -> Result<u64> {
        let (nick, email, password_hash) =
            (nick.to_string(), email.to_string(), password_hash.to_string());
        self.with_conn(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO usuarios (nome, nick, email, senha) VALUES (?1, ?1, ?2, ?3) RETURNING id",
                params![nick, email, password_hash],
                |row| row.get(0),
            )?;
            api_id(id)
        })
        .await
    }

    /// `follower_id` starts following `user_id`.
    pub async fn follow(&self, follower_id: u64, user_id: u64) -> Result<()> {
        let (follower_id, user_id) = (db_id(follower_id)?, db_id(user_id)?);
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO seguidores (usuario_id, seguidor_id) VALUES (?1, ?2)",
                params![user_id, follower_id],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, senha FROM usuarios WHERE email = ?1",
                    [&email],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, email, password_hash)) = row else {
                return Ok(None);
            };
            Ok(Some(UserRow {
                id: api_id(id)?,
                email,
                password_hash,
            }))
        })
        .await
    }
}

#[async_trait]
impl PublicationStore for SqliteStore {
    async fn create(&self, publication: &NewPublication) -> Result<u64> {
        let publication = publication.clone();
        let author_id = db_id(publication.author_id)?;
        self.with_conn(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO publicacoes (titulo, conteudo, autor_id) VALUES (?1, ?2, ?3) RETURNING id",
                params![publication.title, publication.content, author_id],
                |row| row.get(0),
            )?;
            api_id(id)
        })
        .await
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<PublicationRow>> {
        let id = db_id(id)?;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_PUBLICATION} WHERE p.id = ?1"))?;
            let row = stmt.query_row([id], read_publication).optional()?;
            Ok(row)
        })
        .await
    }

    async fn list_feed(&self, user_id: u64) -> Result<Vec<PublicationRow>> {
        let user_id = db_id(user_id)?;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_PUBLICATION}
                 WHERE p.autor_id = ?1
                    OR p.autor_id IN (SELECT usuario_id FROM seguidores WHERE seguidor_id = ?1)
                 ORDER BY p.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], read_publication)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn list_by_author(&self, author_id: u64) -> Result<Vec<PublicationRow>> {
        let author_id = db_id(author_id)?;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_PUBLICATION} WHERE p.autor_id = ?1 ORDER BY p.id DESC"
            ))?;
            let rows = stmt
                .query_map([author_id], read_publication)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn update(&self, id: u64, title: &str, content: &str) -> Result<()> {
        let id = db_id(id)?;
        let (title, content) = (title.to_string(), content.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE publicacoes SET titulo = ?1, conteudo = ?2 WHERE id = ?3",
                params![title, content, id],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM publicacoes WHERE id = ?1", [id])?;
            Ok(())
        })
        .await
    }

    async fn like(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE publicacoes SET curtidas = curtidas + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
        .await
    }

    async fn unlike(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE publicacoes
                 SET curtidas = CASE WHEN curtidas > 0 THEN curtidas - 1 ELSE 0 END
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
        .await
    }
}

fn read_publication(row: &Row<'_>) -> rusqlite::Result<PublicationRow> {
    let created_at: String = row.get(5)?;
    // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
    let created_at = NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(PublicationRow {
        id: read_id(row, 0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_id: read_id(row, 3)?,
        likes: row.get::<_, i64>(4)?.max(0) as u64,
        created_at,
        author_nick: row.get(6)?,
    })
}

/// Column decoder counterpart of [`api_id`].
fn read_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let id: i64 = row.get(idx)?;
    u64::try_from(id).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_users() -> (SqliteStore, u64, u64, u64) {
        let store = SqliteStore::in_memory().unwrap();
        let ana = store.insert_user("ana", "ana@mural.dev", "hash").await.unwrap();
        let bia = store.insert_user("bia", "bia@mural.dev", "hash").await.unwrap();
        let caio = store.insert_user("caio", "caio@mural.dev", "hash").await.unwrap();
        (store, ana, bia, caio)
    }

    fn new_publication(title: &str, author_id: u64) -> NewPublication {
        NewPublication {
            title: title.to_string(),
            content: format!("{title} content"),
            author_id,
        }
    }

    #[tokio::test]
    async fn create_then_find_returns_fresh_publication() {
        let (store, ana, _, _) = store_with_users().await;

        let id = store.create(&new_publication("first", ana)).await.unwrap();
        let found = store.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(found.id, id);
        assert_eq!(found.title, "first");
        assert_eq!(found.content, "first content");
        assert_eq!(found.author_id, ana);
        assert_eq!(found.author_nick, "ana");
        assert_eq!(found.likes, 0);
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let (store, _, _, _) = store_with_users().await;

        assert!(store.find_by_id(999).await.unwrap().is_none());
        assert!(store.find_by_email("nobody@mural.dev").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_email_returns_hash() {
        let (store, ana, _, _) = store_with_users().await;

        let user = store.find_by_email("ana@mural.dev").await.unwrap().unwrap();
        assert_eq!(user.id, ana);
        assert_eq!(user.password_hash, "hash");
    }

    #[tokio::test]
    async fn likes_increment_and_unlike_clamps_at_zero() {
        let (store, ana, _, _) = store_with_users().await;
        let id = store.create(&new_publication("liked", ana)).await.unwrap();

        store.unlike(id).await.unwrap();
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes, 0);

        for expected in 1..=3 {
            store.like(id).await.unwrap();
            assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes, expected);
        }

        for _ in 0..5 {
            store.unlike(id).await.unwrap();
        }
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes, 0);
    }

    #[tokio::test]
    async fn update_changes_only_title_and_content() {
        let (store, ana, _, _) = store_with_users().await;
        let id = store.create(&new_publication("before", ana)).await.unwrap();
        store.like(id).await.unwrap();
        let before = store.find_by_id(id).await.unwrap().unwrap();

        store.update(id, "after", "new body").await.unwrap();
        let after = store.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(after.title, "after");
        assert_eq!(after.content, "new body");
        assert_eq!(after.author_id, before.author_id);
        assert_eq!(after.likes, 1);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let (store, ana, _, _) = store_with_users().await;
        let id = store.create(&new_publication("gone", ana)).await.unwrap();

        store.delete(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn feed_includes_own_and_followed_newest_first() {
        let (store, ana, bia, caio) = store_with_users().await;
        store.follow(ana, bia).await.unwrap();
        // A repeated follow is ignored.
        store.follow(ana, bia).await.unwrap();
        store.follow(caio, bia).await.unwrap();

        let a1 = store.create(&new_publication("ana 1", ana)).await.unwrap();
        let b1 = store.create(&new_publication("bia 1", bia)).await.unwrap();
        let _c1 = store.create(&new_publication("caio 1", caio)).await.unwrap();
        let a2 = store.create(&new_publication("ana 2", ana)).await.unwrap();

        let feed: Vec<u64> = store
            .list_feed(ana)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(feed, vec![a2, b1, a1]);
    }

    #[tokio::test]
    async fn feed_without_follows_still_shows_own_posts() {
        let (store, _, bia, _) = store_with_users().await;
        let b1 = store.create(&new_publication("solo", bia)).await.unwrap();

        let feed = store.list_feed(bia).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, b1);
    }

    #[tokio::test]
    async fn list_by_author_filters_exactly() {
        let (store, ana, bia, _) = store_with_users().await;
        store.follow(ana, bia).await.unwrap();
        store.create(&new_publication("ana", ana)).await.unwrap();
        let b1 = store.create(&new_publication("bia 1", bia)).await.unwrap();
        let b2 = store.create(&new_publication("bia 2", bia)).await.unwrap();

        let ids: Vec<u64> = store
            .list_by_author(bia)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![b2, b1]);
        assert!(store.list_by_author(12345).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_author() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.create(&new_publication("orphan", 42)).await.is_err());
    }

    #[tokio::test]
    async fn negative_ids_in_database_are_errors() {
        let (store, ana, _, _) = store_with_users().await;
        let author = db_id(ana).unwrap();
        store
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO publicacoes (id, titulo, conteudo, autor_id) VALUES (-7, 't', 'c', ?1)",
                    [author],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(store.list_by_author(ana).await.is_err());
    }
}
