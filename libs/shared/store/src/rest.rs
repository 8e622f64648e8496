use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::{DocumentStore, Filter, StoreError};

/// PostgREST-style HTTP backend. The backend process is the trusted tier,
/// so every request is signed with the service API key.
pub struct RestDocumentStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestDocumentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    fn path(&self, collection: &str, filter: &Filter) -> String {
        let mut path = format!("{}/rest/v1/{}", self.base_url, collection);
        let query: Vec<String> = filter
            .to_query()
            .into_iter()
            .map(|(field, condition)| {
                format!("{}={}", field, urlencoding::encode(&condition))
            })
            .collect();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        path
    }

    async fn request(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
        representation: bool,
    ) -> Result<Vec<Value>, StoreError> {
        debug!("Store request {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers(representation));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, detail);
            return Err(StoreError::Request(format!("{}: {}", status, detail)));
        }

        if !representation {
            return Ok(Vec::new());
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let filter = Filter::new().eq("id", id);
        let rows = self
            .request(Method::GET, self.path(collection, &filter), None, true)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.request(Method::GET, self.path(collection, filter), None, true)
            .await
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let rows = self
            .request(
                Method::POST,
                self.path(collection, &Filter::new()),
                Some(document),
                true,
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| StoreError::Request(
            format!("insert into {} returned no representation", collection),
        ))
    }

    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<Value, StoreError> {
        let filter = Filter::new().eq("id", id);
        let rows = self
            .request(Method::PATCH, self.path(collection, &filter), Some(patch), true)
            .await?;
        rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
        })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, StoreError> {
        let rows = self
            .request(Method::PATCH, self.path(collection, filter), Some(patch), true)
            .await?;
        Ok(rows.len() as u64)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let filter = Filter::new().eq("id", id);
        let rows = self
            .request(Method::DELETE, self.path(collection, &filter), None, true)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let rows = self
            .request(Method::DELETE, self.path(collection, filter), None, true)
            .await?;
        Ok(rows.len() as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let rows = self.list(collection, filter).await?;
        Ok(rows.len() as u64)
    }
}
