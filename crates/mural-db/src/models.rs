//! Database row types. These map directly to rows of `usuarios` and
//! `publicacoes`; the HTTP layer converts them into wire types.
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPublication {
    pub title: String,
    pub content: String,
    pub author_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRow {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author_id: u64,
    pub likes: u64,
    pub created_at: NaiveDateTime,
    pub author_nick: String,
}
