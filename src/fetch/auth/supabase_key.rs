use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that authenticates against a Supabase project.
///
/// PostgREST expects the project key twice: as the `apikey` header and as an
/// `Authorization: Bearer` token.
pub struct SupabaseKey<C> {
    inner: C,
    api_key: HeaderValue,
    bearer: HeaderValue,
}

impl<C> SupabaseKey<C> {
    pub fn new(inner: C, key: &str) -> Result<Self> {
        let mut api_key =
            HeaderValue::from_str(key).context("Supabase key is not a valid header value")?;
        api_key.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .context("Supabase key is not a valid header value")?;
        bearer.set_sensitive(true);

        Ok(Self {
            inner,
            api_key,
            bearer,
        })
    }

    fn authorize(&self, req: &mut reqwest::Request) {
        let headers = req.headers_mut();
        headers.insert(HeaderName::from_static("apikey"), self.api_key.clone());
        headers.insert(AUTHORIZATION, self.bearer.clone());
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for SupabaseKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.authorize(&mut req);
        self.inner.execute(req).await
    }
}
