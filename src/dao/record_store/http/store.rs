use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::dao::{keys::RecordKey, record_store::RecordStore, storage::StorageResult};

use super::{
    config::HttpStoreConfig,
    error::{HttpStoreError, HttpStoreResult},
};

/// Collection under which records are addressed on the remote API.
const RECORDS_PATH: &str = "structured-memories";
/// Key probed by the health check; a 404 still proves the store answers.
const HEALTH_PROBE_KEY: &str = "health:probe";

/// Bearer-authenticated client for the remote whole-value record store.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: Arc<str>,
    api_key: Option<Arc<str>>,
}

impl HttpRecordStore {
    /// Build the HTTP client. No request is sent until the first operation.
    pub fn new(config: HttpStoreConfig) -> HttpStoreResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| HttpStoreError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            api_key: config.api_key.map(Arc::<str>::from),
        })
    }

    fn request(&self, method: Method, key: &str) -> HttpStoreResult<reqwest::RequestBuilder> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(HttpStoreError::MissingCredential)?;
        let url = format!("{}/{}/{}", self.base_url, RECORDS_PATH, key);
        Ok(self.client.request(method, url).bearer_auth(api_key.as_ref()))
    }

    async fn get_record(&self, key: &str) -> HttpStoreResult<Option<Value>> {
        let response = self
            .request(Method::GET, key)?
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                key: key.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(key, "record not found");
                Ok(None)
            }
            status if status.is_success() => response
                .json::<Value>()
                .await
                .map(|payload| Some(unwrap_envelope(payload)))
                .map_err(|source| HttpStoreError::DecodeResponse {
                    key: key.to_string(),
                    source,
                }),
            status => Err(HttpStoreError::RequestStatus {
                key: key.to_string(),
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn put_record(&self, key: &str, value: &Value) -> HttpStoreResult<()> {
        let response = self
            .request(Method::PUT, key)?
            .json(value)
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                key: key.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(HttpStoreError::RequestStatus {
                key: key.to_string(),
                status,
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// The store answers either with the raw document or with `{"value": <document>, ...}`.
fn unwrap_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("value") => {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

impl RecordStore for HttpRecordStore {
    fn get(&self, key: RecordKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.get_record(key.as_str()).await.map_err(Into::into) })
    }

    fn put(&self, key: RecordKey, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .put_record(key.as_str(), &value)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_record(HEALTH_PROBE_KEY)
                .await
                .map(|_| ())
                .map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;
    use serde_json::json;

    #[test]
    fn envelope_is_unwrapped_when_present() {
        let wrapped = json!({"id": "game:1", "value": {"gameId": "1"}});
        assert_eq!(unwrap_envelope(wrapped), json!({"gameId": "1"}));

        let bare = json!({"gameId": "1"});
        assert_eq!(unwrap_envelope(bare.clone()), bare);
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let store = HttpRecordStore::new(HttpStoreConfig::new("http://127.0.0.1:9")).unwrap();
        let err = store.get(RecordKey::raw("game:x")).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingCredential));
    }
}
