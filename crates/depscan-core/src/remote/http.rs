//! Shared HTTP plumbing for remote repositories.

use super::error::ResolveError;
use crate::error::Error;
use crate::version::user_agent;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Connect timeout for repository requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whole-request timeout for repository requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the HTTP client used by every repository in a session.
///
/// # Errors
/// Returns an error if the client cannot be created.
pub fn build_client() -> Result<Client, Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent())
        .build()
        .map_err(|e| Error::other(format!("Failed to create HTTP client: {e}")))
}

/// Parse a repository base URL, making sure relative joins stay below it.
///
/// # Errors
/// Returns an error if the URL is invalid or cannot be a base.
pub fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw.trim()).map_err(|e| Error::repository(raw, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(Error::repository(raw, "URL cannot be a base"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Join a relative path onto a base URL.
pub fn join(base: &Url, path: &str) -> Result<Url, ResolveError> {
    base.join(path)
        .map_err(|e| ResolveError::malformed(path, format!("Failed to build URL: {e}")))
}

/// GET a text body. `Ok(None)` means the server answered 404.
///
/// Any other non-success status is a network error so the next repository
/// gets a chance.
pub async fn get_text(client: &Client, url: &Url) -> Result<Option<String>, ResolveError> {
    let response = client.get(url.as_str()).send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ResolveError::network(
            url.as_str(),
            format!("Repository returned status {status}"),
        ));
    }

    Ok(Some(response.text().await?))
}
