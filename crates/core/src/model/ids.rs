use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking questions that were built on-device rather than issued by the backend.
pub const FALLBACK_ID_PREFIX: &str = "sample-";

/// Unique identifier for a user account.
///
/// `UserId::GUEST` (0) is reserved for the on-device guest and never exists server-side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const GUEST: Self = Self(0);

    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        *self == Self::GUEST
    }
}

/// Identifier of a question.
///
/// The backend issues numeric ids while fallback questions use `sample-<category>`;
/// the original representation is kept so submissions echo exactly what was received.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(Repr);

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Numeric(u64),
    Text(String),
}

impl QuestionId {
    #[must_use]
    pub fn numeric(id: u64) -> Self {
        Self(Repr::Numeric(id))
    }

    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self(Repr::Text(id.into()))
    }

    #[must_use]
    pub(crate) fn fallback(slug: &str) -> Self {
        Self::text(format!("{FALLBACK_ID_PREFIX}{slug}"))
    }

    /// True when the question was built locally and has no server-side record.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(&self.0, Repr::Text(text) if text.starts_with(FALLBACK_ID_PREFIX))
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({self})")
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Numeric(id) => write!(f, "{id}"),
            Repr::Text(id) => f.write_str(id),
        }
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
