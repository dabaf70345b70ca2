//! Contact identity and profile types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque stable contact identifier.
///
/// Assigned by the directory service. The sync core never interprets its
/// contents, only compares identifiers for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Create a contact identifier from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// String form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ContactId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A contact in the user's roster.
///
/// Profile fields are refreshed wholesale by a directory reload; the
/// identifier is stable for the lifetime of the contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable identifier.
    pub id: ContactId,
    /// Name shown in the roster and matched by search.
    pub display_name: String,
    /// Reference to the contact's avatar image. `None` for the default.
    pub avatar: Option<String>,
    /// Short self-description. `None` if the contact never set one.
    pub bio: Option<String>,
}

impl Contact {
    /// Create a contact with the given identifier and display name.
    pub fn new(id: impl Into<ContactId>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into(), avatar: None, bio: None }
    }

    /// Attach an avatar reference.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Attach a bio.
    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }
}
