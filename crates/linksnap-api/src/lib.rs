// linksnap-api: Async Rust client for the LinkSnap REST API
//
// A thin transport layer: cookie-carrying HTTP, URL construction, and
// normalization of non-2xx responses into typed errors. No state beyond
// the cookie jar lives here.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod urls;

pub use client::ApiClient;
pub use error::Error;
pub use models::{ApiShortUrl, ApiUser};
pub use transport::{TlsMode, TransportConfig};
