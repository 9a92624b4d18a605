// ── Domain model ──
//
// Canonical types the core hands to UI consumers. Wire spellings from
// the REST API are converted away in `convert.rs`.

pub mod session;
pub mod short_url;
pub mod user;

pub use session::Session;
pub use short_url::{ShortUrl, absolute_link};
pub use user::User;
