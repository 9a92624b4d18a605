// ── ShortUrl domain type ──

use serde::{Deserialize, Serialize};
use url::Url;

/// One shortened link owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrl {
    /// Stable, unique within a listing.
    pub id: String,
    /// The original target.
    pub full_url: String,
    /// Slug or path segment under the service root.
    pub short_url: String,
    /// Visits so far; never decreases on the server.
    pub clicks: u64,
}

impl ShortUrl {
    /// Absolute short link under `base` (e.g. `http://localhost:3000/demo`).
    ///
    /// A `short_url` that is already absolute is returned unchanged.
    pub fn link(&self, base: &Url) -> String {
        absolute_link(base, &self.short_url)
    }

    /// "1 click" / "N clicks".
    pub fn clicks_label(&self) -> String {
        if self.clicks == 1 {
            "1 click".to_owned()
        } else {
            format!("{} clicks", self.clicks)
        }
    }
}

/// Join a slug (or pass through an absolute URL) under the service root.
pub fn absolute_link(base: &Url, short_url: &str) -> String {
    if short_url.starts_with("http://") || short_url.starts_with("https://") {
        return short_url.to_owned();
    }
    let base = base.as_str().trim_end_matches('/');
    let slug = short_url.trim_start_matches('/');
    format!("{base}/{slug}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(short_url: &str, clicks: u64) -> ShortUrl {
        ShortUrl {
            id: "a1".into(),
            full_url: "https://example.com".into(),
            short_url: short_url.into(),
            clicks,
        }
    }

    #[test]
    fn link_joins_slug_under_base() {
        let base = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(sample("demo", 0).link(&base), "http://localhost:3000/demo");
        assert_eq!(sample("/demo", 0).link(&base), "http://localhost:3000/demo");
    }

    #[test]
    fn link_keeps_absolute_urls() {
        let base = Url::parse("http://localhost:3000").unwrap();
        assert_eq!(
            sample("https://lnk.example/demo", 0).link(&base),
            "https://lnk.example/demo"
        );
    }

    #[test]
    fn clicks_label_pluralizes() {
        assert_eq!(sample("d", 0).clicks_label(), "0 clicks");
        assert_eq!(sample("d", 1).clicks_label(), "1 click");
        assert_eq!(sample("d", 42).clicks_label(), "42 clicks");
    }
}
