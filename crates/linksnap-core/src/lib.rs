// linksnap-core: Session state and server-resource synchronization between
// linksnap-api and consumers (CLI or any other UI layer).
//
// Consumers read snapshots and subscribe; the only mutators are session
// login/logout, cache subscribe/invalidate/purge, and mutations.

pub mod api;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod linksnap;
pub mod model;
pub mod mutation;
pub mod session;
pub mod stream;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::LinkApi;
pub use cache::{CacheEntry, EntryStatus, ResourceCache, ResourceKey};
pub use config::{ClientConfig, TlsVerification};
pub use error::CoreError;
pub use linksnap::{LinkSnap, SLUG_REQUIRES_LOGIN};
pub use model::{Session, ShortUrl, User, absolute_link};
pub use mutation::MutationCoordinator;
pub use session::{BootstrapOutcome, SessionBootstrapper, SessionStore};
pub use stream::{Subscription, SubscriptionStream};
