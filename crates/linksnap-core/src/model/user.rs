// ── User domain type ──

use serde::{Deserialize, Serialize};

/// The authenticated principal, as the server described it at login or
/// session resumption. Fields are opaque; nothing here validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    /// Single uppercase letter for an avatar badge, `U` when the name is blank.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('U')
    }
}
