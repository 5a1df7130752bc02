use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use url::form_urlencoded;
use url::Url;

use super::types::BuildsPageDto;
use crate::auth::Token;
use crate::error::{BuildLensError, Result};

const API_VERSION_HEADER: &str = "Travis-API-Version";

pub struct TravisClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl TravisClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("BuildLens/0.1.0")
            .build()
            .map_err(|e| BuildLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Without a trailing slash `join` would replace the last path segment.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let api_url = Url::parse(&base_url)
            .map_err(|e| BuildLensError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(API_VERSION_HEADER, "3");
        if let Some(token) = &self.token {
            request.header(AUTHORIZATION, token.authorization())
        } else {
            request
        }
    }

    /// `repo/{slug}/builds` with the slug's `/` percent-encoded.
    fn builds_url(&self, slug: &str) -> Result<Url> {
        let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
        self.api_url
            .join(&format!("repo/{encoded}/builds"))
            .map_err(|e| BuildLensError::Config(format!("Invalid builds URL: {e}")))
    }

    /// Fetch one page of a repository's builds, newest first.
    pub async fn fetch_builds_page(
        &self,
        slug: &str,
        offset: usize,
        limit: usize,
    ) -> Result<BuildsPageDto> {
        let url = self.builds_url(slug)?;
        let request = self
            .client
            .get(url)
            .query(&[("limit", limit), ("offset", offset)]);
        let response = self.auth_request(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BuildLensError::Api(format!(
                "Failed to fetch builds for {slug}: {status} - {body}"
            )));
        }

        let page = response.json::<BuildsPageDto>().await?;
        Ok(page)
    }
}
