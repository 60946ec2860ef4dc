//! HTTP plumbing for reading rows from the fleet database.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Issues a GET through `client` and decodes the JSON body.
///
/// Non-success responses are turned into errors carrying the status and body.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    req.headers_mut().insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%status, "Response received");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("Request failed with status {}: {}", status, body));
    }

    Ok(resp.json().await?)
}
