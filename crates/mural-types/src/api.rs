use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Identity carried by a bearer token. Issued on login, attached to the
/// request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: u64,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

// -- Publications --

/// Body of `POST /publicacoes` and `PUT /publicacoes/{publicacaoId}`.
/// Missing fields decode as empty and are rejected by validation.
#[derive(Debug, Default, Deserialize)]
pub struct PublicationRequest {
    #[serde(default, rename = "titulo")]
    pub title: String,
    #[serde(default, rename = "conteudo")]
    pub content: String,
}

impl PublicationRequest {
    /// Trims both fields and checks neither is empty.
    pub fn prepare(mut self) -> Result<Self, &'static str> {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();

        if self.title.is_empty() {
            return Err("titulo is required and cannot be blank");
        }
        if self.content.is_empty() {
            return Err("conteudo is required and cannot be blank");
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationResponse {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "conteudo")]
    pub content: String,
    #[serde(rename = "autorId")]
    pub author_id: u64,
    #[serde(rename = "autorNick", default, skip_serializing_if = "String::is_empty")]
    pub author_nick: String,
    #[serde(rename = "curtidas")]
    pub likes: u64,
    #[serde(rename = "criadoEm", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub erro: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_trims_and_accepts() {
        let req = PublicationRequest {
            title: "  Olá ".into(),
            content: "\tmundo\n".into(),
        };
        let req = req.prepare().unwrap();
        assert_eq!(req.title, "Olá");
        assert_eq!(req.content, "mundo");
    }

    #[test]
    fn prepare_rejects_blank_fields() {
        let blank_title = PublicationRequest {
            title: "   ".into(),
            content: "c".into(),
        };
        assert!(blank_title.prepare().is_err());

        let missing_content: PublicationRequest =
            serde_json::from_str(r#"{"titulo":"T"}"#).unwrap();
        assert!(missing_content.prepare().is_err());
    }

    #[test]
    fn login_request_reads_senha() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","senha":"x"}"#).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert_eq!(req.password, "x");
    }

    #[test]
    fn publication_response_uses_wire_names() {
        let publication = PublicationResponse {
            id: 3,
            title: "T".into(),
            content: "C".into(),
            author_id: 7,
            author_nick: String::new(),
            likes: 0,
            created_at: None,
        };
        let value = serde_json::to_value(&publication).unwrap();
        assert_eq!(value["titulo"], "T");
        assert_eq!(value["autorId"], 7);
        assert_eq!(value["curtidas"], 0);
        assert!(value.get("autorNick").is_none());
        assert!(value.get("criadoEm").is_none());
    }
}
