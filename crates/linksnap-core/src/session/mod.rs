// ── Session state ──
//
// The process-wide record of who is signed in, and the one-shot startup
// check that primes it from the server's session cookie.

mod bootstrap;
mod store;

pub use bootstrap::{BootstrapOutcome, SessionBootstrapper};
pub use store::SessionStore;
