//! Remote repository host: organization members, repositories, contributors.
//!
//! [`RepoHost`] is the injectable seam; [`GithubClient`] talks to the GitHub
//! REST API and [`crate::fakes::MemoryHost`] serves tests.

use std::future::Future;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::credential::Credential;
use crate::error::{GraderError, Result};
use crate::repo::RemoteRepo;

/// Default REST endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// Data source for organization membership and repository listings.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Logins of every member of `org`.
    async fn list_members(&self, org: &str) -> Result<Vec<String>>;

    /// Every repository owned by `org`, in listing order.
    async fn list_repos(&self, org: &str) -> Result<Vec<RemoteRepo>>;

    /// Login of the top contributor, or `None` for an empty repository.
    async fn primary_contributor(&self, repo: &RemoteRepo) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

/// GitHub REST client authenticated with a personal access token.
pub struct GithubClient {
    api_url: String,
    http_client: reqwest::Client,
}

impl GithubClient {
    pub fn new(credential: &Credential) -> Result<Self> {
        Self::with_api_url(credential, GITHUB_API_URL)
    }

    /// Client for a GitHub Enterprise or test endpoint.
    pub fn with_api_url(credential: &Credential, api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", credential.token()))
            .map_err(|e| GraderError::Host(format!("invalid token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("classgrade/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch every page of a list endpoint.
    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.api_url, path);
        collect_pages(|page| {
            let url = url.clone();
            async move {
                debug!(url = %url, page, "GitHub list request");
                let response = self
                    .http_client
                    .get(&url)
                    .query(&[("per_page", PER_PAGE), ("page", page)])
                    .send()
                    .await?;
                match check_status(response.status(), &url)? {
                    Body::Empty => Ok(None),
                    Body::Content => Ok(Some(response.json().await?)),
                }
            }
        })
        .await
    }
}

/// Whether a successful response carries a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Content,

    /// 204: the listing is empty (an empty repository has no contributors).
    Empty,
}

fn check_status(status: StatusCode, url: &str) -> Result<Body> {
    if status == StatusCode::NO_CONTENT {
        Ok(Body::Empty)
    } else if status.is_success() {
        Ok(Body::Content)
    } else {
        Err(GraderError::Host(format!("GET {url} returned {status}")))
    }
}

/// Drive `fetch_page` from page 1 until a short page or an empty response.
async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Option<Vec<T>>>>,
{
    let mut items = Vec::new();
    let mut page = 1usize;
    while let Some(batch) = fetch_page(page).await? {
        let len = batch.len();
        items.extend(batch);
        if len < PER_PAGE {
            break;
        }
        page += 1;
    }
    Ok(items)
}

#[async_trait]
impl RepoHost for GithubClient {
    async fn list_members(&self, org: &str) -> Result<Vec<String>> {
        let members: Vec<Account> = self.get_paged(&format!("/orgs/{org}/members")).await?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }

    async fn list_repos(&self, org: &str) -> Result<Vec<RemoteRepo>> {
        self.get_paged(&format!("/orgs/{org}/repos")).await
    }

    async fn primary_contributor(&self, repo: &RemoteRepo) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/contributors", self.api_url, repo.full_name);
        let response = self
            .http_client
            .get(&url)
            .query(&[("per_page", 1)])
            .send()
            .await?;

        let contributors: Vec<Account> = match check_status(response.status(), &url)? {
            Body::Empty => return Ok(None),
            Body::Content => response.json().await?,
        };
        Ok(contributors.into_iter().next().map(|c| c.login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let credential = Credential::new("t0ken");
        let client = GithubClient::with_api_url(&credential, "https://ghe.example.edu/api/v3/")
            .expect("client");
        assert_eq!(client.api_url(), "https://ghe.example.edu/api/v3");
    }

    #[test]
    fn test_default_api_url() {
        let client = GithubClient::new(&Credential::new("t0ken")).expect("client");
        assert_eq!(client.api_url(), GITHUB_API_URL);
    }

    #[test]
    fn test_token_with_newline_rejected() {
        // Credential::new trims, so only interior control characters remain invalid.
        let credential = Credential::new("bad\ntoken");
        assert!(GithubClient::new(&credential).is_err());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(check_status(StatusCode::OK, "u").unwrap(), Body::Content);
        assert_eq!(check_status(StatusCode::NO_CONTENT, "u").unwrap(), Body::Empty);
        let err = check_status(StatusCode::NOT_FOUND, "https://api.github.com/orgs/x/repos")
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let mut requested = Vec::new();
        let items: Vec<usize> = collect_pages(|page| {
            requested.push(page);
            let size = if page < 3 { PER_PAGE } else { 7 };
            async move { Ok(Some(vec![page; size])) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(items.len(), 2 * PER_PAGE + 7);
    }

    #[tokio::test]
    async fn test_pages_stop_on_empty_response() {
        let items: Vec<String> = collect_pages(|page| async move {
            if page == 1 {
                Ok(Some(vec!["alice".to_string(); PER_PAGE]))
            } else {
                Ok(None)
            }
        })
        .await
        .unwrap();
        assert_eq!(items.len(), PER_PAGE);
    }

    #[tokio::test]
    async fn test_page_error_propagates() {
        let result: Result<Vec<String>> = collect_pages(|_| async {
            Err(GraderError::Host("GET /orgs/cs56/members returned 403".to_string()))
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_account_deserializes() {
        let json = r#"[{"login": "alice", "id": 1}, {"login": "bob", "id": 2}]"#;
        let accounts: Vec<Account> = serde_json::from_str(json).unwrap();
        assert_eq!(accounts[1].login, "bob");
    }
}
