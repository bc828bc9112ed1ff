//! REST store adapter
//!
//! HTTP client for the remote tabular store. Transport and status failures
//! are translated into the `StoreError` taxonomy so the publisher can pick a
//! retry policy without seeing HTTP types. The store signals capacity
//! pressure with 429/503 and rejects oversized payloads with 413.

use crate::adapters::store::traits::{
    RemoteStore, RowRange, StructuralOp, StructureInfo, UpdateOutcome,
};
use crate::domain::errors::StoreError;
use crate::domain::ids::TargetId;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    updated_row_count: usize,
}

#[derive(Debug, Deserialize)]
struct StructuresResponse {
    structures: Vec<StructureInfo>,
}

/// HTTP implementation of [`RemoteStore`]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_token: SecretString, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn rows_url(&self, target: &TargetId) -> String {
        format!("{}/structures/{}/rows", self.base_url, target.as_str())
    }

    fn range_query(range: RowRange) -> Vec<(&'static str, String)> {
        let mut query = vec![("start", range.start.to_string())];
        // An unbounded range omits the count parameter
        if range.count != usize::MAX {
            query.push(("count", range.count.to_string()));
        }
        query
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.api_token.expose_secret())
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(map_status(status.as_u16(), message).into())
    }
}

fn map_status(status: u16, message: String) -> StoreError {
    match status {
        429 | 503 => StoreError::Overloaded(format!("HTTP {status}: {message}")),
        413 => StoreError::PayloadTooLarge(message),
        401 | 403 => StoreError::AuthenticationFailed(format!("HTTP {status}")),
        404 => StoreError::StructureNotFound(message),
        _ => StoreError::Http { status, message },
    }
}

fn map_transport(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(e.to_string())
    } else if e.is_connect() {
        StoreError::Network(format!("connection failed: {e}"))
    } else {
        StoreError::Network(e.to_string())
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn get_range(&self, target: &TargetId, range: RowRange) -> Result<Vec<Vec<String>>> {
        let response = self
            .authorize(self.client.get(self.rows_url(target)))
            .query(&Self::range_query(range))
            .send()
            .await
            .map_err(map_transport)?;
        let body: RowsResponse = self
            .check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(body.rows)
    }

    async fn update_range(
        &self,
        target: &TargetId,
        range: RowRange,
        rows: &[Vec<String>],
    ) -> Result<UpdateOutcome> {
        let response = self
            .authorize(self.client.put(self.rows_url(target)))
            .query(&Self::range_query(range))
            .json(&serde_json::json!({ "rows": rows }))
            .send()
            .await
            .map_err(map_transport)?;
        let body: UpdateResponse = self
            .check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(UpdateOutcome {
            updated_row_count: body.updated_row_count,
        })
    }

    async fn clear_range(&self, target: &TargetId, range: RowRange) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.rows_url(target)))
            .query(&Self::range_query(range))
            .send()
            .await
            .map_err(map_transport)?;
        self.check(response).await?;
        Ok(())
    }

    async fn list_structures(&self) -> Result<Vec<StructureInfo>> {
        let response = self
            .authorize(self.client.get(format!("{}/structures", self.base_url)))
            .send()
            .await
            .map_err(map_transport)?;
        let body: StructuresResponse = self
            .check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(body.structures)
    }

    async fn batch_structural_update(&self, ops: &[StructuralOp]) -> Result<()> {
        let response = self
            .authorize(
                self.client
                    .post(format!("{}/structures/batch", self.base_url)),
            )
            .json(&serde_json::json!({ "operations": ops }))
            .send()
            .await
            .map_err(map_transport)?;
        self.check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn store(url: &str) -> RestStore {
        let token = crate::config::secret_string("test-token".to_string());
        RestStore::new(url, token, 30).unwrap()
    }

    fn target() -> TargetId {
        TargetId::new("roster").unwrap()
    }

    #[tokio::test]
    async fn test_get_range_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/structures/roster/rows")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::UrlEncoded("start".into(), "0".into()))
            .with_status(200)
            .with_body(r#"{"rows":[["1","alice"],["2","bob"]]}"#)
            .create_async()
            .await;

        let rows = store(&server.url())
            .get_range(&target(), RowRange::all())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "alice");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_range_reports_row_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/structures/roster/rows")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start".into(), "100".into()),
                Matcher::UrlEncoded("count".into(), "1".into()),
            ]))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "rows": [["1", "alice"]]
            })))
            .with_status(200)
            .with_body(r#"{"updatedRowCount":1}"#)
            .create_async()
            .await;

        let outcome = store(&server.url())
            .update_range(
                &target(),
                RowRange::new(100, 1),
                &[vec!["1".to_string(), "alice".to_string()]],
            )
            .await
            .unwrap();
        assert_eq!(outcome.updated_row_count, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_429_maps_to_overloaded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/structures/roster/rows")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = store(&server.url())
            .update_range(&target(), RowRange::new(0, 1), &[vec!["1".to_string()]])
            .await
            .unwrap_err();
        match err {
            SyncError::Store(e) => assert!(e.is_overload()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_413_maps_to_payload_too_large() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/structures/roster/rows")
            .match_query(Matcher::Any)
            .with_status(413)
            .create_async()
            .await;

        let err = store(&server.url())
            .update_range(&target(), RowRange::new(0, 1), &[vec!["1".to_string()]])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Store(StoreError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_404_maps_to_structure_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/structures/missing/rows")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let err = store(&server.url())
            .get_range(&TargetId::new("missing").unwrap(), RowRange::all())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Store(StoreError::StructureNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cut_over_travels_as_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/structures/batch")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "operations": [
                    { "op": "deleteStructure", "name": "roster" },
                    { "op": "renameStructure", "from": "roster__staging_ab12", "to": "roster" }
                ]
            })))
            .with_status(200)
            .create_async()
            .await;

        store(&server.url())
            .batch_structural_update(&[
                StructuralOp::DeleteStructure {
                    name: "roster".to_string(),
                },
                StructuralOp::RenameStructure {
                    from: "roster__staging_ab12".to_string(),
                    to: "roster".to_string(),
                },
            ])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_maps_to_authentication_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/structures")
            .with_status(401)
            .create_async()
            .await;

        let err = store(&server.url()).list_structures().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Store(StoreError::AuthenticationFailed(_))
        ));
    }
}
