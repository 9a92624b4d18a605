// ── Service seam ──
//
// Everything in the core reaches the network through `LinkApi`. The
// production implementation is `linksnap_api::ApiClient`; tests supply
// in-memory fakes. Implementations return `CoreError::Api` for any
// failure and leave classification to the caller.

use std::future::Future;

use linksnap_api::ApiClient;
use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::{ShortUrl, User};

/// The server operations this core consumes.
pub trait LinkApi: Send + Sync + 'static {
    /// Resolve the session the transport already carries, if any.
    fn current_user(&self) -> impl Future<Output = Result<User, CoreError>> + Send;

    fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, CoreError>> + Send;

    fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, CoreError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Returns the created short link as the server reports it.
    fn create_short_url(
        &self,
        full_url: &str,
        custom_slug: Option<&str>,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// The caller's own links; the server scopes the listing by session.
    fn list_my_short_urls(&self) -> impl Future<Output = Result<Vec<ShortUrl>, CoreError>> + Send;
}

impl LinkApi for ApiClient {
    async fn current_user(&self) -> Result<User, CoreError> {
        Ok(ApiClient::current_user(self).await?.into())
    }

    async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        Ok(ApiClient::login(self, email, password).await?.into())
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        Ok(ApiClient::register(self, name, email, password).await?.into())
    }

    async fn logout(&self) -> Result<(), CoreError> {
        Ok(ApiClient::logout(self).await?)
    }

    async fn create_short_url(
        &self,
        full_url: &str,
        custom_slug: Option<&str>,
    ) -> Result<String, CoreError> {
        Ok(ApiClient::create_short_url(self, full_url, custom_slug).await?)
    }

    async fn list_my_short_urls(&self) -> Result<Vec<ShortUrl>, CoreError> {
        let urls = ApiClient::list_my_short_urls(self).await?;
        Ok(urls.into_iter().map(ShortUrl::from).collect())
    }
}
