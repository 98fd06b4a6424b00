use std::str::FromStr;

use activity_core::{cancel::cancellable, CancellationToken, HttpClient, SourceError, SourceResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

const CUSTOM_HEADER_PARAM: &str = "custom_header";

/// Errors that can occur while building a client from a configured url.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// Header name of a `custom_header` param is not a valid header name
    #[error("invalid header name: {0}")]
    InvalidHeaderName(InvalidHeaderName),
    /// Header value of a `custom_header` param is not a valid header value
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(InvalidHeaderValue),
    /// The reqwest client could not be built
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Parse `custom_header=Name:Value` query params into a HeaderMap and
/// return the url without them, preserving order of all other query params.
pub fn parse_custom_headers(url: &Url) -> Result<(HeaderMap, Url), HttpClientError> {
    let mut retained_queries: Vec<(String, String)> = Vec::new();
    let mut headers = HeaderMap::new();

    for (key, value) in url.query_pairs() {
        if key != CUSTOM_HEADER_PARAM {
            retained_queries.push((key.into_owned(), value.into_owned()));
            continue;
        }
        if let Some((name, value)) = value.split_once(':') {
            let name = HeaderName::from_str(name).map_err(HttpClientError::InvalidHeaderName)?;
            let mut value =
                HeaderValue::from_str(value).map_err(HttpClientError::InvalidHeaderValue)?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }
    }

    let mut new_url = url.clone();
    new_url.set_query(None);
    if !retained_queries.is_empty() {
        new_url.query_pairs_mut().extend_pairs(retained_queries);
    }
    Ok((headers, new_url))
}

/// Base Http client that performs REST-ful queries against one indexer.
///
/// Query parameters of the configured url (API keys and the like) are sent
/// with every request.
#[derive(Clone, Debug)]
pub struct BaseHttpClient {
    client: Client,
    base_url: String,
    base_query: Vec<(String, String)>,
}

impl BaseHttpClient {
    /// Build a client from a configured indexer url
    pub fn from_url(url: &Url) -> Result<Self, HttpClientError> {
        let (headers, url) = parse_custom_headers(url)?;
        let client = Client::builder().default_headers(headers).build()?;
        let base_query = url.query_pairs().into_owned().collect();
        let mut base_url = url;
        base_url.set_query(None);
        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            base_query,
        })
    }
}

#[async_trait]
impl HttpClient for BaseHttpClient {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> SourceResult<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        trace!(%url, ?query, "GET");
        let request = self
            .client
            .get(&url)
            .query(&self.base_query)
            .query(query);
        let response = cancellable(cancel, async move {
            let response = request.send().await?.error_for_status()?;
            response.json::<T>().await
        })
        .await?;
        response.map_err(|err| {
            if err.is_decode() {
                SourceError::malformed(path, err)
            } else {
                SourceError::from_other(err)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_parse_custom_headers() {
        let url = Url::parse(
            "http://dummy.local/api?custom_header=Authorization:Bearer%20abc&key=k1&custom_header=NoColon",
        )
        .unwrap();
        let (headers, filtered) = parse_custom_headers(&url).unwrap();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            &HeaderValue::from_static("Bearer abc")
        );
        assert_eq!(headers.len(), 1);
        assert_eq!(filtered.as_str(), "http://dummy.local/api?key=k1");
    }

    #[tokio::test]
    async fn test_get_json_sends_headers_and_base_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/operations"))
            .and(header("x-api-key", "secret"))
            .and(query_param("key", "k1"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!(
            "{}/v1/?custom_header=x-api-key:secret&key=k1",
            server.uri()
        ))
        .unwrap();
        let client = BaseHttpClient::from_url(&url).unwrap();
        let body: serde_json::Value = client
            .get_json("operations", &[("limit", "5".to_owned())], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_get_json_reports_status_and_decode_errors() {
        let server = MockServer::start().await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = BaseHttpClient::from_url(&Url::parse(&server.uri()).unwrap()).unwrap();
        let cancel = CancellationToken::new();
        let broken: SourceResult<serde_json::Value> = client.get_json("broken", &[], &cancel).await;
        assert!(matches!(broken, Err(SourceError::Other(_))));
        let garbage: SourceResult<serde_json::Value> =
            client.get_json("garbage", &[], &cancel).await;
        assert!(matches!(garbage, Err(SourceError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_get_json_aborts_on_cancel() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(std::time::Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let client = BaseHttpClient::from_url(&Url::parse(&server.uri()).unwrap()).unwrap();
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            child.cancel();
        });
        let res: SourceResult<serde_json::Value> = client.get_json("slow", &[], &cancel).await;
        assert!(res.unwrap_err().is_cancelled());
    }
}
