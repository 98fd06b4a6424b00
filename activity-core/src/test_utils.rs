use std::{collections::HashMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{Cancelled, HttpClient, SourceError, SourceResult};

#[derive(Clone, Debug)]
enum MockResponse {
    Json(Value),
    Fail,
    Hang,
}

/// A simple mock Http client which allows registering endpoint responses.
///
/// Responses are looked up first by `path?query` (query pairs sorted by
/// name) and then by bare `path`. Every call is counted, including calls
/// that hit no registered response.
#[derive(Clone, Debug, Default)]
pub struct MockHttpClient {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

/// Canonical `path?k=v&...` form used to key mock responses
pub fn endpoint(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_owned();
    }
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{path}?{}", pairs.join("&"))
}

impl MockHttpClient {
    /// Empty mock, every request fails until a response is registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a JSON value for a path, matching any query
    pub fn register_value(&self, path: impl Into<String>, value: impl Into<Value>) {
        self.responses
            .write()
            .insert(path.into(), MockResponse::Json(value.into()));
    }

    /// Register a JSON value for one exact path and query
    pub fn register_query(&self, path: &str, query: &[(&str, String)], value: impl Into<Value>) {
        self.responses
            .write()
            .insert(endpoint(path, query), MockResponse::Json(value.into()));
    }

    /// Make every request to `path` fail
    pub fn register_failure(&self, path: impl Into<String>) {
        self.responses.write().insert(path.into(), MockResponse::Fail);
    }

    /// Make every request to `path` hang until cancelled
    pub fn register_hang(&self, path: impl Into<String>) {
        self.responses.write().insert(path.into(), MockResponse::Hang);
    }

    /// All requested endpoints, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    /// Number of requests whose path equals `path`
    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.split('?').next() == Some(path))
            .count()
    }

    fn lookup(&self, path: &str, query: &[(&str, String)]) -> Option<MockResponse> {
        let responses = self.responses.read();
        responses
            .get(&endpoint(path, query))
            .or_else(|| responses.get(path))
            .cloned()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> SourceResult<T> {
        self.calls.write().push(endpoint(path, query));
        let value = match self.lookup(path, query) {
            Some(MockResponse::Json(value)) => value,
            Some(MockResponse::Fail) => {
                return Err(SourceError::from_other_str("mock endpoint failure"))
            }
            Some(MockResponse::Hang) => {
                cancel.cancelled().await;
                return Err(Cancelled.into());
            }
            None => {
                return Err(SourceError::malformed(
                    endpoint(path, query),
                    "no mock response registered",
                ))
            }
        };
        serde_json::from_value(value).map_err(|e| SourceError::malformed(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_query_takes_precedence() {
        let client = MockHttpClient::new();
        client.register_value("items", serde_json::json!([1]));
        client.register_query("items", &[("page", "2".to_owned())], serde_json::json!([2]));

        let cancel = CancellationToken::new();
        let first: Vec<u32> = client.get_json("items", &[], &cancel).await.unwrap();
        let second: Vec<u32> = client
            .get_json("items", &[("page", "2".to_owned())], &cancel)
            .await
            .unwrap();
        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![2]);
        assert_eq!(client.call_count("items"), 2);
    }

    #[tokio::test]
    async fn test_hanging_endpoint_reports_cancellation() {
        let client = MockHttpClient::new();
        client.register_hang("slow");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res: SourceResult<Value> = client.get_json("slow", &[], &cancel).await;
        assert!(res.unwrap_err().is_cancelled());
    }
}
