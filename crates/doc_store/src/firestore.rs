//! Firestore REST client
//!
//! Reads group documents and lists token documents through the Firestore
//! REST API (v1). Only the two reads the dispatcher needs are implemented.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{ContractError, DocumentStore, Group, StoreConfig};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};

/// Resolved Firestore connection settings
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// API base URL, e.g. `https://firestore.googleapis.com`
    pub base_url: String,
    /// Cloud project id
    pub project_id: String,
    /// Database id
    pub database: String,
    /// Bearer token (None = unauthenticated, e.g. local emulator)
    pub access_token: Option<String>,
    /// Documents per list page
    pub page_size: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl FirestoreConfig {
    /// Build from service configuration, reading the token from the
    /// configured environment variable.
    pub fn from_store_config(config: &StoreConfig) -> Result<Self> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| StoreError::config("firestore store requires project_id"))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            project_id,
            database: config.database.clone(),
            access_token: std::env::var(&config.access_token_env).ok(),
            page_size: config.page_size,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }
}

/// Firestore-backed document store
pub struct FirestoreStore {
    client: reqwest::Client,
    config: FirestoreConfig,
    documents_url: Url,
}

impl FirestoreStore {
    /// Create a new store
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::config(format!("failed to build HTTP client: {e}")))?;

        let mut documents_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::config(format!("invalid base_url '{}': {e}", config.base_url)))?;
        documents_url
            .path_segments_mut()
            .map_err(|_| StoreError::config("base_url cannot be a base"))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                config.project_id.as_str(),
                "databases",
                config.database.as_str(),
                "documents",
            ]);

        Ok(Self {
            client,
            config,
            documents_url,
        })
    }

    fn document_url(&self, segments: &[&str]) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    #[instrument(name = "firestore_fetch_group", skip(self), fields(group_id = %group_id))]
    async fn fetch_group(&self, group_id: &str) -> Result<Option<Group>> {
        const OP: &str = "get_group";

        let url = self.document_url(&["groups", group_id]);
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|source| StoreError::Request { operation: OP, source })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(group_id, "Group document not found");
            return Ok(None);
        }
        let document: FirestoreDocument = decode(OP, response).await?;
        Ok(Some(document.into_group()))
    }

    #[instrument(name = "firestore_fetch_token_ids", skip(self), fields(uid = %uid))]
    async fn fetch_token_ids(&self, uid: &str) -> Result<Vec<String>> {
        const OP: &str = "list_token_ids";

        let mut tokens = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.document_url(&["users", uid, "fcmTokens"]);
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &self.config.page_size.to_string());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self
                .get(url)
                .send()
                .await
                .map_err(|source| StoreError::Request { operation: OP, source })?;

            if response.status() == StatusCode::NOT_FOUND {
                break;
            }
            let page: ListDocumentsResponse = decode(OP, response).await?;
            tokens.extend(page.documents.iter().filter_map(|d| d.id()));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(uid, tokens = tokens.len(), "Listed token documents");
        Ok(tokens)
    }
}

impl DocumentStore for FirestoreStore {
    async fn get_group(&self, group_id: &str) -> std::result::Result<Option<Group>, ContractError> {
        Ok(self.fetch_group(group_id).await?)
    }

    async fn list_token_ids(&self, uid: &str) -> std::result::Result<Vec<String>, ContractError> {
        Ok(self.fetch_token_ids(uid).await?)
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::HttpStatus {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| StoreError::Request { operation, source })?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
        operation,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Wire model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

impl FirestoreDocument {
    /// Last path segment of the document name
    fn id(&self) -> Option<String> {
        self.name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn into_group(self) -> Group {
        let member_uids = self
            .fields
            .get("memberUids")
            .and_then(|v| v.array_value.as_ref())
            .map(|array| {
                array
                    .values
                    .iter()
                    .filter_map(|v| v.string_value.clone())
                    .collect()
            })
            .unwrap_or_default();
        Group { member_uids }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    string_value: Option<String>,
    array_value: Option<ArrayValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<FirestoreValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const DOCS: &str = "/v1/projects/splitnest/databases/(default)/documents";

    fn store_for(server: &mockito::ServerGuard) -> FirestoreStore {
        FirestoreStore::new(FirestoreConfig {
            base_url: server.url(),
            project_id: "splitnest".into(),
            database: "(default)".into(),
            access_token: Some("secret".into()),
            page_size: 2,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_group_members() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("{DOCS}/groups/house").as_str())
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(
                r#"{"name":"projects/splitnest/databases/(default)/documents/groups/house",
                    "fields":{"memberUids":{"arrayValue":{"values":[
                        {"stringValue":"alice"},{"stringValue":"bob"}]}},
                    "name":{"stringValue":"House"}}}"#,
            )
            .create_async()
            .await;

        let store = store_for(&server);
        let group = store.get_group("house").await.unwrap().unwrap();
        assert_eq!(group.member_uids, vec!["alice", "bob"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_group_empty_array_and_missing_group() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{DOCS}/groups/empty").as_str())
            .with_status(200)
            .with_body(r#"{"name":"x/groups/empty","fields":{"memberUids":{"arrayValue":{}}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", format!("{DOCS}/groups/gone").as_str())
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let empty = store.get_group("empty").await.unwrap().unwrap();
        assert!(empty.member_uids.is_empty());
        assert!(store.get_group("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_tokens_follows_pages() {
        let mut server = mockito::Server::new_async().await;
        let path = format!("{DOCS}/users/alice/fcmTokens");
        let first_page = server
            .mock("GET", path.as_str())
            .match_query(Matcher::Exact("pageSize=2".into()))
            .with_status(200)
            .with_body(
                r#"{"documents":[
                    {"name":"p/documents/users/alice/fcmTokens/tok-1"},
                    {"name":"p/documents/users/alice/fcmTokens/tok-2"}],
                    "nextPageToken":"page-2"}"#,
            )
            .create_async()
            .await;
        let second_page = server
            .mock("GET", path.as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageSize".into(), "2".into()),
                Matcher::UrlEncoded("pageToken".into(), "page-2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"documents":[{"name":"p/documents/users/alice/fcmTokens/tok-3"}]}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let tokens = store.list_token_ids("alice").await.unwrap();
        assert_eq!(tokens, vec!["tok-1", "tok-2", "tok-3"]);
        first_page.assert_async().await;
        second_page.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_tokens_empty_collection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{DOCS}/users/bob/fcmTokens").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let store = store_for(&server);
        assert!(store.list_token_ids("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_store_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{DOCS}/groups/house").as_str())
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store.get_group("house").await.unwrap_err();
        assert!(matches!(err, ContractError::Store { .. }));
        assert!(err.to_string().contains("HTTP 503"), "got: {err}");
    }

    #[test]
    fn test_config_requires_project() {
        let config = StoreConfig::default();
        assert!(FirestoreConfig::from_store_config(&config).is_err());
    }
}
