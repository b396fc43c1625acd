//! HTTP client for the remote notes service.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, NotePatch, ValidatedNote};
use crate::util::compact_text;

/// One page of notes as returned by `GET /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotesPage {
    pub notes: Vec<Note>,
    pub total: u64,
    pub total_pages: u32,
}

/// Liveness payload from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateNoteBody<'a> {
    title: &'a str,
    content: &'a str,
    tags: &'a [String],
}

/// Client for the notes REST API.
#[derive(Clone)]
pub struct NotesApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl NotesApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.notes_base_url.clone(),
            client,
        })
    }

    /// Fetch one page of notes, optionally filtered by a search term.
    ///
    /// The search term is expected to be already trimmed and bounded by the
    /// caller; an empty term is omitted from the query string.
    pub async fn list_notes(&self, page: u32, per_page: u32, search: &str) -> Result<NotesPage> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if !search.is_empty() {
            query.push(("search", search.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/notes", self.base_url))
            .query(&query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<NotesPage>().await?)
    }

    pub async fn get_note(&self, id: &NoteId) -> Result<Note> {
        let response = self.client.get(self.note_url(id)).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<Note>().await?)
    }

    /// Create a note; the server assigns id and timestamps.
    pub async fn create_note(&self, note: &ValidatedNote) -> Result<Note> {
        let body = CreateNoteBody {
            title: &note.title,
            content: &note.content,
            tags: &note.tags,
        };
        let response = self
            .client
            .post(format!("{}/notes", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<Note>().await?)
    }

    /// Update any subset of a note's mutable fields.
    pub async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        let response = self
            .client
            .put(self.note_url(id))
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<Note>().await?)
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let response = self.client.delete(self.note_url(id)).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<HealthStatus>().await?)
    }

    fn note_url(&self, id: &NoteId) -> String {
        format!(
            "{}/notes/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

fn parse_error_detail(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<ErrorBody>(body).ok()?;
    payload
        .detail
        .or(payload.message)
        .map(|detail| detail.trim().to_string())
        .filter(|detail| !detail.is_empty())
}

pub(crate) async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = parse_error_detail(&body);

    match status {
        StatusCode::BAD_REQUEST => Error::Validation {
            field: None,
            message: detail.unwrap_or_else(|| "Invalid request data".to_string()),
        },
        StatusCode::NOT_FOUND => {
            Error::NotFound(detail.unwrap_or_else(|| "Resource not found".to_string()))
        }
        status if status.is_server_error() => {
            Error::Server(detail.unwrap_or_else(|| format!("HTTP {}", status.as_u16())))
        }
        status => {
            let rendered = detail.unwrap_or_else(|| compact_text(&body));
            if rendered.is_empty() {
                Error::Other(format!("HTTP {}", status.as_u16()))
            } else {
                Error::Other(format!("{rendered} ({})", status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> NotesApiClient {
        let config = ClientConfig {
            notes_base_url: server.url(),
            ..ClientConfig::default()
        };
        NotesApiClient::new(&config).unwrap()
    }

    fn note_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "content": "body",
            "tags": ["a"],
            "archived": false,
            "created_at": "2026-01-01T00:00:00",
            "updated_at": "2026-01-01T00:00:00"
        })
    }

    #[tokio::test]
    async fn list_notes_sends_query_and_parses_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/notes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("per_page".into(), "10".into()),
                Matcher::UrlEncoded("search".into(), "rust".into()),
            ]))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "notes": [note_json("n-1", "First")],
                    "total": 11,
                    "total_pages": 2
                })
                .to_string(),
            )
            .create_async()
            .await;

        let page = client_for(&server).list_notes(2, 10, "rust").await.unwrap();
        mock.assert_async().await;
        assert_eq!(page.total, 11);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.notes[0].title, "First");
    }

    #[tokio::test]
    async fn list_notes_omits_empty_search() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/notes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::Missing,
            ]))
            .with_status(200)
            .with_body(r#"{"notes": [], "total": 0, "total_pages": 0}"#)
            .create_async()
            .await;

        client_for(&server).list_notes(1, 10, "").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_note_posts_cleaned_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notes")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "Groceries",
                "content": "milk",
                "tags": ["home"]
            })))
            .with_status(200)
            .with_body(note_json("n-9", "Groceries").to_string())
            .create_async()
            .await;

        let note = ValidatedNote {
            title: "Groceries".to_string(),
            content: "milk".to_string(),
            tags: vec!["home".to_string()],
            archived: false,
        };
        let created = client_for(&server).create_note(&note).await.unwrap();
        mock.assert_async().await;
        assert_eq!(created.id.as_str(), "n-9");
    }

    #[tokio::test]
    async fn update_note_sends_subset_patch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/notes/n-1")
            .match_body(Matcher::Json(serde_json::json!({ "archived": true })))
            .with_status(200)
            .with_body(note_json("n-1", "First").to_string())
            .create_async()
            .await;

        let patch = NotePatch {
            archived: Some(true),
            ..NotePatch::default()
        };
        client_for(&server)
            .update_note(&NoteId::from("n-1"), &patch)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bad_request_surfaces_detail_as_validation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/notes")
            .with_status(400)
            .with_body(r#"{"detail": "Title is required"}"#)
            .create_async()
            .await;

        let note = ValidatedNote {
            title: "t".to_string(),
            content: "c".to_string(),
            tags: vec![],
            archived: false,
        };
        let error = client_for(&server).create_note(&note).await.unwrap_err();
        assert_eq!(error.classification(), ErrorClass::Validation);
        assert_eq!(error.to_string(), "Title is required");
    }

    #[tokio::test]
    async fn missing_note_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes/missing")
            .with_status(404)
            .with_body(r#"{"detail": "Nota no encontrada"}"#)
            .create_async()
            .await;

        let error = client_for(&server)
            .get_note(&NoteId::from("missing"))
            .await
            .unwrap_err();
        assert_eq!(error.classification(), ErrorClass::NotFound);
    }

    #[tokio::test]
    async fn server_failure_maps_to_server_class() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_status(503)
            .create_async()
            .await;

        let error = client_for(&server).list_notes(1, 10, "").await.unwrap_err();
        assert_eq!(error.classification(), ErrorClass::Server);
    }

    #[tokio::test]
    async fn connection_failure_maps_to_network_class() {
        let config = ClientConfig {
            notes_base_url: "http://127.0.0.1:1".to_string(),
            ..ClientConfig::default()
        };
        let client = NotesApiClient::new(&config).unwrap();
        let error = client.list_notes(1, 10, "").await.unwrap_err();
        assert_eq!(error.classification(), ErrorClass::Network);
    }

    #[tokio::test]
    async fn delete_note_accepts_empty_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/notes/n-1")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server)
            .delete_note(&NoteId::from("n-1"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn note_ids_are_percent_encoded_in_paths() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/notes/a%20b")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server)
            .delete_note(&NoteId::from("a b"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn health_parses_liveness_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "version": "1.0.0"}"#)
            .create_async()
            .await;

        let health = client_for(&server).health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn parse_error_detail_ignores_malformed_bodies() {
        assert_eq!(parse_error_detail("not json"), None);
        assert_eq!(parse_error_detail(r#"{"detail": "  "}"#), None);
        assert_eq!(
            parse_error_detail(r#"{"message": "broken"}"#),
            Some("broken".to_string())
        );
    }
}
