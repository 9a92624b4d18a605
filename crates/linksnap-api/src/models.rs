// Wire types for the LinkSnap REST API
//
// These mirror the JSON the service sends, Mongo-style `_id` included.
// `linksnap-core` converts them into its domain types; nothing outside
// this crate should depend on the exact field spellings.

use serde::{Deserialize, Serialize};

/// The authenticated principal as the server describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// One shortened-link record from the caller's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiShortUrl {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "fullUrl")]
    pub full_url: String,
    #[serde(alias = "shortUrl")]
    pub short_url: String,
    #[serde(default)]
    pub clicks: u64,
}

/// `{ "user": { ... } }`, returned by `me`, `login`, and `register`.
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: ApiUser,
}

/// `{ "urls": [ ... ] }`, returned by the per-user listing.
#[derive(Debug, Deserialize)]
pub(crate) struct UrlsEnvelope {
    #[serde(default)]
    pub urls: Vec<ApiShortUrl>,
}

/// Body of `POST /api/create`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateShortUrlRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<&'a str>,
}

/// The create endpoint answers either with an object or with the bare link.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedShortUrl {
    Object {
        #[serde(alias = "shortUrl", alias = "short_url", alias = "url")]
        short_url: String,
    },
    Bare(String),
}

impl CreatedShortUrl {
    pub(crate) fn into_inner(self) -> String {
        match self {
            Self::Object { short_url } | Self::Bare(short_url) => short_url,
        }
    }
}
