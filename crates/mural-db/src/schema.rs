//! Table layout shared by both engines.
//!
//! PostgreSQL databases are provisioned out of band; [`POSTGRES`] documents
//! what the queries expect. The embedded SQLite store creates its tables on
//! open with [`bootstrap_sqlite`].

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const POSTGRES: &str = "
CREATE TABLE IF NOT EXISTS usuarios (
    id          BIGSERIAL PRIMARY KEY,
    nome        VARCHAR(50) NOT NULL,
    nick        VARCHAR(50) NOT NULL UNIQUE,
    email       VARCHAR(50) NOT NULL UNIQUE,
    senha       VARCHAR(100) NOT NULL,
    criado_em   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS seguidores (
    usuario_id  BIGINT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    seguidor_id BIGINT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    PRIMARY KEY (usuario_id, seguidor_id)
);

CREATE TABLE IF NOT EXISTS publicacoes (
    id          BIGSERIAL PRIMARY KEY,
    titulo      VARCHAR(50) NOT NULL,
    conteudo    VARCHAR(300) NOT NULL,
    autor_id    BIGINT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    curtidas    BIGINT NOT NULL DEFAULT 0 CHECK (curtidas >= 0),
    criado_em   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

pub fn bootstrap_sqlite(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS usuarios (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            nome        TEXT NOT NULL DEFAULT '',
            nick        TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            senha       TEXT NOT NULL,
            criado_em   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS seguidores (
            usuario_id  INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
            seguidor_id INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
            PRIMARY KEY (usuario_id, seguidor_id)
        );

        CREATE TABLE IF NOT EXISTS publicacoes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            titulo      TEXT NOT NULL,
            conteudo    TEXT NOT NULL,
            autor_id    INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
            curtidas    INTEGER NOT NULL DEFAULT 0 CHECK (curtidas >= 0),
            criado_em   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_publicacoes_autor
            ON publicacoes(autor_id);
        ",
    )?;

    info!("SQLite schema ready");
    Ok(())
}
