// Session endpoints
//
// Login, registration, logout, and "who am I". The server answers a
// successful login or registration by setting its session cookie, which
// the client's jar stores and replays; these methods only see the user.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiUser, UserEnvelope};

impl ApiClient {
    /// Resolve the session carried by the cookie jar.
    ///
    /// `GET /api/auth/me`. Fails with [`Error::Unauthorized`] when there
    /// is no valid session.
    pub async fn current_user(&self) -> Result<ApiUser, Error> {
        let url = self.api_url("auth/me")?;
        debug!("resolving current session");
        let envelope: UserEnvelope = self.get(url).await?;
        Ok(envelope.user)
    }

    /// Sign in with email and password.
    ///
    /// `POST /api/auth/login` with `{"email": ..., "password": ...}`.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<ApiUser, Error> {
        let url = self.api_url("auth/login")?;
        debug!(email, "logging in");
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let envelope: UserEnvelope = self.post(url, &body).await?;
        debug!(user_id = %envelope.user.id, "login successful");
        Ok(envelope.user)
    }

    /// Create an account; the server signs the new user in.
    ///
    /// `POST /api/auth/register` with `{"name": ..., "email": ..., "password": ...}`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<ApiUser, Error> {
        let url = self.api_url("auth/register")?;
        debug!(email, "registering account");
        let body = json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        });
        let envelope: UserEnvelope = self.post(url, &body).await?;
        Ok(envelope.user)
    }

    /// End the server-side session.
    ///
    /// `POST /api/auth/logout`.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("auth/logout")?;
        debug!("logging out");
        self.post_empty(url).await
    }
}
