// Short-link endpoints
//
// Creation is open to anonymous callers; the listing is scoped by the
// server to whoever owns the session cookie.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiShortUrl, CreateShortUrlRequest, CreatedShortUrl, UrlsEnvelope};

impl ApiClient {
    /// Shorten `full_url`, optionally under a caller-chosen slug.
    ///
    /// `POST /api/create` with `{"url": ..., "slug": ...}`. Returns the
    /// short link exactly as the server reports it.
    pub async fn create_short_url(
        &self,
        full_url: &str,
        custom_slug: Option<&str>,
    ) -> Result<String, Error> {
        let url = self.api_url("create")?;
        debug!(full_url, slug = ?custom_slug, "creating short url");
        let body = CreateShortUrlRequest {
            url: full_url,
            slug: custom_slug.filter(|s| !s.is_empty()),
        };
        let text = self.post_text(url, &body).await?;

        if let Ok(created) = serde_json::from_str::<CreatedShortUrl>(&text) {
            return Ok(created.into_inner());
        }
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('{') {
            return Err(Error::Deserialization {
                message: "create response carried no short url".into(),
                body: text,
            });
        }
        Ok(trimmed.to_owned())
    }

    /// List the caller's short links.
    ///
    /// `GET /api/user/urls`. An empty inventory is `Ok(vec![])`.
    pub async fn list_my_short_urls(&self) -> Result<Vec<ApiShortUrl>, Error> {
        let url = self.api_url("user/urls")?;
        debug!("listing short urls");
        let envelope: UrlsEnvelope = self.get(url).await?;
        Ok(envelope.urls)
    }
}
