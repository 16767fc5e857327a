use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;

/// Opaque bearer credential for an authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

fn default_tier() -> String {
    "free".to_string()
}

/// Identity record of the signed-in learner (or the on-device guest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_tier")]
    pub subscription_tier: String,
}

impl User {
    /// Pseudo-user for learners practicing without an account.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            id: UserId::GUEST,
            username: "Guest".to_string(),
            email: String::new(),
            subscription_tier: default_tier(),
        }
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.id.is_guest()
    }
}

/// Body of a successful register/login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSession {
    #[serde(default)]
    pub message: String,
    pub user: User,
    #[serde(alias = "token")]
    pub credential: Credential,
}
