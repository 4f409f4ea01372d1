use crate::config::{self, OPENSEARCH_SECRET, OPENSEARCH_URLS, OPENSEARCH_USERNAME};
use crate::models::{DatastoreError, GetResponse, SearchResponse, WriteResponse};
use hyper::body::Bytes;
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Method, Response, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: usize = 5;

// These are all non-prod values
const DEFAULT_OPENSEARCH_ADDR: &str = "https://127.0.0.1:9200";
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct OpenSearchConfig {
    pub urls: Vec<String>,
    pub username: String,
    pub password: String,
    pub max_retries: usize,
    pub retry_on_status: Vec<StatusCode>,
    /// Development clusters run with self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for OpenSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchConfig")
            .field("urls", &self.urls)
            .field("username", &self.username)
            .field("max_retries", &self.max_retries)
            .field("retry_on_status", &self.retry_on_status)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish_non_exhaustive()
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        OpenSearchConfig {
            urls: vec![DEFAULT_OPENSEARCH_ADDR.to_owned()],
            username: DEFAULT_USERNAME.to_owned(),
            password: DEFAULT_PASSWORD.to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_on_status: vec![
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            accept_invalid_certs: true,
        }
    }
}

impl OpenSearchConfig {
    /// Reads `OPENSEARCH_URLS` (comma separated), `OPENSEARCH_USERNAME` and
    /// `OPENSEARCH_SECRET`, falling back to the local development defaults.
    pub fn from_env() -> Self {
        let mut urls = config::env_non_empty(OPENSEARCH_URLS)
            .map(|raw| config::split_list(&raw))
            .unwrap_or_default();
        if urls.is_empty() {
            urls.push(DEFAULT_OPENSEARCH_ADDR.to_owned());
        }

        OpenSearchConfig {
            urls,
            username: config::env_or(OPENSEARCH_USERNAME, DEFAULT_USERNAME),
            password: config::env_or(OPENSEARCH_SECRET, DEFAULT_PASSWORD),
            ..OpenSearchConfig::default()
        }
    }
}

#[derive(Serialize)]
struct PartialUpdate<'a, T: ?Sized + Serialize> {
    doc: &'a T,
}

pub struct OpenSearchClient {
    http: reqwest::Client,
    urls: Vec<Url>,
    username: String,
    password: String,
    max_retries: usize,
    retry_on_status: Vec<StatusCode>,
    next: AtomicUsize,
}

impl fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("urls", &self.urls)
            .field("username", &self.username)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenSearchClient {
    pub fn new(config: OpenSearchConfig) -> Result<Self, DatastoreError> {
        if config.urls.is_empty() {
            return Err(DatastoreError::InvalidUrl {
                url: String::new(),
                reason: "no url configured".to_owned(),
            });
        }
        let urls = config
            .urls
            .iter()
            .map(|raw| parse_base_url(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        tracing::info!(urls = ?config.urls, "OpenSearch client configured");
        Ok(OpenSearchClient {
            http,
            urls,
            username: config.username,
            password: config.password,
            max_retries: config.max_retries,
            retry_on_status: config.retry_on_status,
            next: AtomicUsize::new(0),
        })
    }

    pub fn default_client() -> Result<Self, DatastoreError> {
        Self::new(OpenSearchConfig::from_env())
    }

    /// The underlying HTTP client, for calls this wrapper does not cover.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub async fn create_document<T>(
        &self,
        index: &str,
        id: &str,
        document: &T,
    ) -> Result<WriteResponse, DatastoreError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(document)?;
        let response = self
            .send(Method::PUT, &[index, "_create", id], &[], Some(body))
            .await?;
        Ok(response.json().await?)
    }

    /// Partial update: the fields of `document` are merged into the stored one.
    pub async fn update_document<T>(
        &self,
        index: &str,
        id: &str,
        document: &T,
    ) -> Result<WriteResponse, DatastoreError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(&PartialUpdate { doc: document })?;
        let response = self
            .send(Method::POST, &[index, "_update", id], &[], Some(body))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<WriteResponse, DatastoreError> {
        let response = self
            .send(Method::DELETE, &[index, "_doc", id], &[], None)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn get_document<T>(
        &self,
        index: &str,
        id: &str,
    ) -> Result<GetResponse<T>, DatastoreError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.get_document_raw(index, id).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Body of the get response as returned by the cluster.
    pub async fn get_document_raw(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Bytes, DatastoreError> {
        let response = self
            .send(Method::GET, &[index, "_doc", id], &[], None)
            .await?;
        Ok(response.bytes().await?)
    }

    /// Creates an index with a single shard and no replicas.
    pub async fn create_index_with_defaults(&self, name: &str) -> Result<(), DatastoreError> {
        let settings = json!({
            "settings": {
                "index": {
                    "number_of_shards": 1,
                    "number_of_replicas": 0
                }
            }
        });
        self.create_index_with_settings(name, &settings).await
    }

    pub async fn create_index_with_settings(
        &self,
        name: &str,
        settings: &Value,
    ) -> Result<(), DatastoreError> {
        let body = serde_json::to_vec(settings)?;
        self.send(Method::PUT, &[name], &[], Some(body)).await?;
        Ok(())
    }

    pub async fn delete_index(&self, name: &str) -> Result<(), DatastoreError> {
        self.send(Method::DELETE, &[name], &[], None).await?;
        Ok(())
    }

    /// Runs a Lucene query-string search (`?q=`) against `index`.
    pub async fn search<T>(
        &self,
        index: &str,
        query: &str,
    ) -> Result<SearchResponse<T>, DatastoreError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(Method::GET, &[index, "_search"], &[("q", query)], None)
            .await?;
        Ok(response.json().await?)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Response, DatastoreError> {
        let mut attempt = 0;
        loop {
            let url = self.endpoint(segments)?;
            tracing::debug!(%method, %url, attempt, "opensearch request");

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .basic_auth(&self.username, Some(&self.password));
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .body(body.clone());
            }

            let retries_left = attempt < self.max_retries;
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if retries_left && self.retry_on_status.contains(&status) {
                        tracing::warn!(%url, %status, attempt, "retrying opensearch request");
                        attempt += 1;
                        continue;
                    }
                    return check_status(response).await;
                }
                Err(err) if retries_left && (err.is_connect() || err.is_timeout()) => {
                    tracing::warn!(%url, attempt, "retrying opensearch request: {}", err);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Joins `segments` onto the next node url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DatastoreError> {
        let position = self.next.fetch_add(1, Ordering::Relaxed) % self.urls.len();
        let mut url = self.urls[position].clone();
        url.path_segments_mut()
            .map_err(|_| DatastoreError::InvalidUrl {
                url: self.urls[position].to_string(),
                reason: "cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, DatastoreError> {
    let url = Url::parse(raw).map_err(|err| DatastoreError::InvalidUrl {
        url: raw.to_owned(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(DatastoreError::InvalidUrl {
            url: raw.to_owned(),
            reason: "cannot be a base".to_owned(),
        });
    }
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, DatastoreError> {
    let status = response.status();
    if status.as_u16() > 299 {
        let body = response.text().await.unwrap_or_default();
        return Err(DatastoreError::Status { status, body });
    }
    Ok(response)
}
