/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trusted user identity extracted from a verified bearer token.
///
/// Only the token verifiers construct one from a token; repositories and
/// handlers take it as an explicit argument for every user-scoped access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Documents carrying an owner field.
pub trait Owned {
    fn owner(&self) -> Option<&str>;

    /// A document with no owner belongs to nobody.
    fn is_owned_by(&self, subject: &SubjectId) -> bool {
        self.owner() == Some(subject.as_str())
    }
}

/// Keep a fetched document only if the caller owns it.
///
/// Absent and foreign documents both come back as `None`, so callers cannot
/// tell them apart.
pub fn owned_by<T: Owned>(doc: Option<T>, subject: &SubjectId) -> Option<T> {
    doc.filter(|d| d.is_owned_by(subject))
}
