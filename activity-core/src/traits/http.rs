use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::SourceResult;

/// Base layer the source adapters use to talk to REST indexers.
#[async_trait]
pub trait HttpClient: Send + Sync + Debug {
    /// Makes a GET request to `path` (relative to the client's base url)
    /// and decodes the JSON body. The request is aborted when `cancel`
    /// fires.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> SourceResult<T>;
}
