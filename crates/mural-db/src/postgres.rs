use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use tracing::Instrument;

use crate::config::{DatabaseConfig, SslMode};
use crate::models::{NewPublication, PublicationRow, UserRow};
use crate::{PublicationStore, UserStore, api_id, db_id};

// Ids and counters are cast so SERIAL and BIGSERIAL schemas both decode as i64.
const SELECT_PUBLICATION: &str = "
    SELECT p.id::BIGINT, p.titulo, p.conteudo, p.autor_id::BIGINT,
           p.curtidas::BIGINT, p.criado_em::TIMESTAMP, u.nick
    FROM publicacoes p
    INNER JOIN usuarios u ON u.id = p.autor_id";

/// Production store over a `deadpool-postgres` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.user = Some(config.user.clone());
        cfg.password = Some(config.password.clone());
        cfg.dbname = Some(config.name.clone());
        cfg.ssl_mode = Some(match config.ssl_mode {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
        });
        cfg.pool = Some(PoolConfig::new(config.pool_size));

        let pool = match config.ssl_mode {
            SslMode::Disable => cfg.create_pool(Some(Runtime::Tokio1), NoTls)?,
            SslMode::Prefer | SslMode::Require => {
                let connector = native_tls::TlsConnector::builder().build()?;
                cfg.create_pool(Some(Runtime::Tokio1), MakeTlsConnector::new(connector))?
            }
        };

        // Fail at startup rather than on the first request.
        let client = pool.get().await.context("connecting to PostgreSQL")?;
        client.simple_query("SELECT 1").await?;

        Ok(Self { pool })
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        let client = self.pool.get().await?;
        let rows = client.query(sql, params).instrument(span.clone()).await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Option<Row>> {
        let span = tracing::debug_span!("db.query", sql = %sql, params = params.len());
        let client = self.pool.get().await?;
        let row = client.query_opt(sql, params).instrument(span).await?;
        Ok(row)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let span = tracing::debug_span!(
            "db.execute",
            sql = %sql,
            params = params.len(),
            affected = tracing::field::Empty,
        );
        let client = self.pool.get().await?;
        let affected = client.execute(sql, params).instrument(span.clone()).await?;
        span.record("affected", affected);
        Ok(affected)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = self
            .query_opt(
                "SELECT id::BIGINT, email, senha FROM usuarios WHERE email = $1",
                &[&email],
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(UserRow {
            id: api_id(row.try_get(0)?)?,
            email: row.try_get(1)?,
            password_hash: row.try_get(2)?,
        }))
    }
}

#[async_trait]
impl PublicationStore for PgStore {
    async fn create(&self, publication: &NewPublication) -> Result<u64> {
        let author_id = db_id(publication.author_id)?;
        let rows = self
            .query(
                "INSERT INTO publicacoes (titulo, conteudo, autor_id)
                 VALUES ($1, $2, $3::BIGINT)
                 RETURNING id::BIGINT",
                &[&publication.title, &publication.content, &author_id],
            )
            .await?;
        let row = rows.first().context("INSERT returned no id")?;
        api_id(row.try_get(0)?)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<PublicationRow>> {
        let id = db_id(id)?;
        let row = self
            .query_opt(&format!("{SELECT_PUBLICATION} WHERE p.id = $1::BIGINT"), &[&id])
            .await?;
        row.as_ref().map(read_publication).transpose()
    }

    async fn list_feed(&self, user_id: u64) -> Result<Vec<PublicationRow>> {
        let user_id = db_id(user_id)?;
        let rows = self
            .query(
                &format!(
                    "{SELECT_PUBLICATION}
                     WHERE p.autor_id = $1::BIGINT
                        OR p.autor_id IN (SELECT usuario_id FROM seguidores WHERE seguidor_id = $1::BIGINT)
                     ORDER BY p.id DESC"
                ),
                &[&user_id],
            )
            .await?;
        rows.iter().map(read_publication).collect()
    }

    async fn list_by_author(&self, author_id: u64) -> Result<Vec<PublicationRow>> {
        let author_id = db_id(author_id)?;
        let rows = self
            .query(
                &format!("{SELECT_PUBLICATION} WHERE p.autor_id = $1::BIGINT ORDER BY p.id DESC"),
                &[&author_id],
            )
            .await?;
        rows.iter().map(read_publication).collect()
    }

    async fn update(&self, id: u64, title: &str, content: &str) -> Result<()> {
        let id = db_id(id)?;
        self.execute(
            "UPDATE publicacoes SET titulo = $1, conteudo = $2 WHERE id = $3::BIGINT",
            &[&title, &content, &id],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.execute("DELETE FROM publicacoes WHERE id = $1::BIGINT", &[&id])
            .await?;
        Ok(())
    }

    async fn like(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.execute(
            "UPDATE publicacoes SET curtidas = curtidas + 1 WHERE id = $1::BIGINT",
            &[&id],
        )
        .await?;
        Ok(())
    }

    async fn unlike(&self, id: u64) -> Result<()> {
        let id = db_id(id)?;
        self.execute(
            "UPDATE publicacoes
             SET curtidas = CASE WHEN curtidas > 0 THEN curtidas - 1 ELSE 0 END
             WHERE id = $1::BIGINT",
            &[&id],
        )
        .await?;
        Ok(())
    }
}

fn read_publication(row: &Row) -> Result<PublicationRow> {
    let likes: i64 = row.try_get(4)?;
    Ok(PublicationRow {
        id: api_id(row.try_get(0)?)?,
        title: row.try_get(1)?,
        content: row.try_get(2)?,
        author_id: api_id(row.try_get(3)?)?,
        likes: likes.max(0) as u64,
        created_at: row.try_get(5)?,
        author_nick: row.try_get(6)?,
    })
}
