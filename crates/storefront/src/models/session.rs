//! Session-related types.
//!
//! The auth token lives in its own cookie; the session only carries the
//! profile returned at login and one-shot flash messages.

use serde::{Deserialize, Serialize};

/// Profile of the logged-in user, as returned by login and registration.
///
/// Every field is optional because the remote API does not guarantee any of
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl CurrentUser {
    /// Name to show next to the avatar.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("User")
    }
}

/// Tone of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    /// A success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// An error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Whether this is an error message (for styling).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in user's profile.
    pub const USER: &str = "user";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_partial_profile() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"id":3,"username":"nino","email":"n@example.com","avatar":null}"#)
                .unwrap();
        assert_eq!(user.id, Some(3));
        assert_eq!(user.avatar, None);
        assert_eq!(user.display_name(), "nino");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(CurrentUser::default().display_name(), "User");
    }

    #[test]
    fn test_flash_kinds() {
        assert!(Flash::error("nope").is_error());
        assert!(!Flash::success("yes").is_error());
    }
}
