//! The session record: one user's identity, role, and PIN-security state.
//!
//! The serialized layout is the installed-app storage format (camelCase
//! keys, security fields omitted until a PIN is configured), so records
//! written by earlier installs (no PIN yet) still deserialize cleanly.

use serde::{Deserialize, Serialize};

/// Closed set of marketplace roles.
///
/// The role decides which views the router resolves for an authenticated
/// session; adding a role is a compile-time exhaustiveness concern, not a
/// runtime fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Client,
    Professional,
    Admin,
}

impl UserRole {
    /// All roles in demo-cycle order.
    pub const ALL: &'static [UserRole] = &[
        UserRole::Client,
        UserRole::Professional,
        UserRole::Admin,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Client => "Client",
            UserRole::Professional => "Professional",
            UserRole::Admin => "Administrator",
        }
    }

    /// The next role in the demo cycle (Client → Professional → Admin → Client).
    pub fn next(self) -> Self {
        match self {
            UserRole::Client => UserRole::Professional,
            UserRole::Professional => UserRole::Admin,
            UserRole::Admin => UserRole::Client,
        }
    }
}

/// One authenticated-or-authenticating user.
///
/// Exclusively owned by the [`SessionStore`](super::SessionStore); the auth
/// gate holds the in-memory working copy and writes the whole record back
/// on every mutation. `failed_pin_attempts` and `lockout_until` are only
/// meaningful while `pin_hash` is set; a session without a configured PIN
/// is never locked out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque stable identifier, assigned by the login provider.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Marketplace role.
    pub role: UserRole,
    /// Contact address.
    pub email: String,
    /// Credit balance, informational to this crate (consumed by the
    /// marketplace views).
    #[serde(default)]
    pub credits: i64,
    /// One-way hash of the 6-digit PIN. Absent until setup completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    /// Consecutive failed verification attempts since the last success.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed_pin_attempts: u32,
    /// Epoch milliseconds until which verification is refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockout_until: Option<u64>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl SessionRecord {
    /// Create a fresh record with a generated id and no PIN configured.
    /// Login-provider stubs and tests use this; a real provider supplies
    /// its own id.
    pub fn new(name: &str, email: &str, role: UserRole) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            email: email.to_string(),
            credits: 0,
            pin_hash: None,
            failed_pin_attempts: 0,
            lockout_until: None,
        }
    }

    /// Whether a PIN has been configured for this session.
    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }
}
