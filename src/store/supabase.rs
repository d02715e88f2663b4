//! Supabase REST (PostgREST) client.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{Config, StoreSettings};
use crate::error::StoreError;
use crate::metrics;

use super::{RecordStore, Table};

/// Supabase table client scoped by `user_id`.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// `<project>/rest/v1/`, always ending in a slash.
    rest_url: Url,
    /// Access key.
    key: String,
}

impl SupabaseStore {
    /// Create a store client from validated settings.
    pub fn new(settings: &StoreSettings, config: &Config) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }

        let mut base = settings.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: builder.build()?,
            rest_url: base.join("rest/v1/")?,
            key: settings.key.clone(),
        })
    }

    fn table_url(&self, table: Table) -> Result<Url, StoreError> {
        Ok(self.rest_url.join(table.as_ref())?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    #[instrument(skip(self, table), fields(table = %table))]
    async fn list(&self, table: Table, user_id: &str) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table)?;
        let start = Instant::now();

        let response = self
            .authorized(self.http.get(url))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await;
        metrics::record_store_latency(start, table.as_ref(), "list");

        let rows = Self::rows(response?).await?;
        debug!(count = rows.len(), "Listed rows");
        Ok(rows)
    }

    #[instrument(skip(self, table, row), fields(table = %table))]
    async fn insert(
        &self,
        table: Table,
        row: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table)?;
        let start = Instant::now();

        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await;
        metrics::record_store_latency(start, table.as_ref(), "insert");

        let rows = Self::rows(response?).await?;
        debug!(count = rows.len(), "Inserted rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> SupabaseStore {
        let settings = StoreSettings {
            url: Url::parse(&server.uri()).unwrap(),
            key: "anon-key".to_string(),
        };
        SupabaseStore::new(&settings, &Config::default()).unwrap()
    }

    #[test]
    fn rest_url_keeps_project_path() {
        let settings = StoreSettings {
            url: Url::parse("https://proxy.example/supabase").unwrap(),
            key: "k".to_string(),
        };
        let store = SupabaseStore::new(&settings, &Config::default()).unwrap();

        assert_eq!(
            store.table_url(Table::Sessions).unwrap().as_str(),
            "https://proxy.example/supabase/rest/v1/sessions"
        );
    }

    #[tokio::test]
    async fn list_filters_by_user_and_orders_newest_first() {
        let server = MockServer::start().await;
        let rows = json!([
            { "id": 2, "user_id": "u1", "created_at": "2025-09-18T10:00:00Z" },
            { "id": 1, "user_id": "u1", "created_at": "2025-09-17T10:00:00Z" }
        ]);

        Mock::given(method("GET"))
            .and(path("/rest/v1/sessions"))
            .and(query_param("select", "*"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = store_for(&server).list(Table::Sessions, "u1").await.unwrap();
        assert_eq!(Value::Array(result), rows);
    }

    #[tokio::test]
    async fn insert_asks_for_representation() {
        let server = MockServer::start().await;
        let inserted = json!([{ "id": 7, "user_id": "u2", "food": "egg" }]);

        Mock::given(method("POST"))
            .and(path("/rest/v1/nutrition"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({ "user_id": "u2", "food": "egg" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(inserted.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let mut row = Map::new();
        row.insert("user_id".into(), json!("u2"));
        row.insert("food".into(), json!("egg"));

        let result = store_for(&server).insert(Table::Nutrition, row).await.unwrap();
        assert_eq!(Value::Array(result), inserted);
    }

    #[tokio::test]
    async fn error_status_becomes_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "message": "Invalid API key" })),
            )
            .mount(&server)
            .await;

        let err = store_for(&server)
            .list(Table::Nutrition, "u1")
            .await
            .unwrap_err();

        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
