//! GitHub document source
//!
//! Reads files from a repository through the contents API, which also works
//! for private repositories with a personal access token.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::RequestBuilder;
use serde::Deserialize;
use tenantctl_core::{DocumentSource, TenantError, TenantResult};
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    download_url: Option<String>,
}

pub struct GithubSource {
    client: reqwest::Client,
    api_base: String,
    user: String,
    token: String,
    repo: String,
}

impl GithubSource {
    pub fn new(user: impl Into<String>, token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GITHUB_API.to_string(),
            user: user.into(),
            token: token.into(),
            repo: repo.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn api_request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, "tenantctl")
    }

    /// Raw file download. The URL is pre-signed, so no credentials go along.
    fn download_request(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    async fn send(request: RequestBuilder, path: &str) -> TenantResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| TenantError::source_unavailable(path, e))?;

        if !response.status().is_success() {
            return Err(TenantError::source_unavailable(
                path,
                format!("GitHub returned {}", response.status()),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl DocumentSource for GithubSource {
    async fn read(&self, path: &str) -> TenantResult<Vec<u8>> {
        let url = self.contents_url(path);
        debug!(url = %url, "Fetching document metadata");

        let entry: ContentsEntry = Self::send(self.api_request(&url), path)
            .await?
            .json()
            .await
            .map_err(|e| TenantError::source_unavailable(path, e))?;

        let download_url = entry
            .download_url
            .ok_or_else(|| TenantError::source_unavailable(path, "not a file"))?;

        let body = Self::send(self.download_request(&download_url), path)
            .await?
            .bytes()
            .await
            .map_err(|e| TenantError::source_unavailable(path, e))?;

        Ok(body.to_vec())
    }
}
