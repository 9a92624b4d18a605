// ── API-to-domain type conversions ──
//
// Bridges raw `linksnap_api` wire types into the canonical domain model.

use linksnap_api::{ApiShortUrl, ApiUser};

use crate::model::{ShortUrl, User};

impl From<ApiUser> for User {
    fn from(u: ApiUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

impl From<ApiShortUrl> for ShortUrl {
    fn from(s: ApiShortUrl) -> Self {
        Self {
            id: s.id,
            full_url: s.full_url,
            short_url: s.short_url,
            clicks: s.clicks,
        }
    }
}
