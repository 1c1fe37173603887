//! User directory reached over HTTP.

use async_trait::async_trait;
use common::UserId;
use reqwest::{StatusCode, Url};

use super::{DirectoryError, User, UserDirectory};

/// Client for a user directory exposing `GET {base_url}/users/{id}`.
///
/// A 404 is a missing user. Transport failures and any other non-success
/// status are reported as `Unavailable`.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, user_id: &UserId) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DirectoryError::Unavailable(format!("bad directory url: {e}")))?;

        // Push as a segment so IDs containing '/' or '?' stay one path component
        url.path_segments_mut()
            .map_err(|_| {
                DirectoryError::Unavailable(format!(
                    "directory url cannot take a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("users")
            .push(user_id.as_str());

        Ok(url)
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user(&self, user_id: &UserId) -> Result<User, DirectoryError> {
        let url = self.user_url(user_id)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(user_id.clone()));
        }
        if !status.is_success() {
            return Err(DirectoryError::Unavailable(format!(
                "directory returned status {}",
                status.as_u16()
            )));
        }

        resp.json::<User>()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("response decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_appends_segments() {
        let directory = HttpUserDirectory::new("http://users.internal:8080/api/");
        let url = directory.user_url(&UserId::new("U1")).unwrap();
        assert_eq!(url.as_str(), "http://users.internal:8080/api/users/U1");
    }

    #[test]
    fn test_user_url_escapes_id() {
        let directory = HttpUserDirectory::new("http://localhost:9000");
        let url = directory.user_url(&UserId::new("a/b c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/users/a%2Fb%20c");
    }

    #[test]
    fn test_bad_base_url_is_unavailable() {
        let directory = HttpUserDirectory::new("not a url");
        assert!(matches!(
            directory.user_url(&UserId::new("U1")),
            Err(DirectoryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_unavailable() {
        // Port 9 (discard) on loopback is not expected to accept connections
        let directory = HttpUserDirectory::new("http://127.0.0.1:9");
        let err = directory.get_user(&UserId::new("U1")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable(_)));
    }
}
