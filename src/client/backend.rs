//! Search backend used by the client aggregator / 客户端搜索后端

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::search::ScoredResult;
use crate::storage::NotebookEntry;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
}

/// Where search results and notebook children come from / 搜索数据来源
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ScoredResult>, ClientError>;

    /// Direct children of the notebook at `segments` / 笔记本子条目
    async fn list_children(&self, segments: &[String]) -> Result<Vec<NotebookEntry>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Backend talking to the search server over HTTP / HTTP 后端
#[derive(Clone)]
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

impl HttpSearchBackend {
    /// `base_url` without trailing slash, e.g. `http://127.0.0.1:8180`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_default();
            return Err(ClientError::Status { status: status.as_u16(), message });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<ScoredResult>, ClientError> {
        self.get_json("/api/search", &[("q", query)]).await
    }

    async fn list_children(&self, segments: &[String]) -> Result<Vec<NotebookEntry>, ClientError> {
        let path = segments.join("/");
        self.get_json("/api/notebooks", &[("path", path.as_str())]).await
    }
}
