//! Wishlist entries: a member's saved providers.

use serde::{Deserialize, Serialize};

use super::fallback;
use super::ids::UserId;

pub use super::ids::WishlistEntryId;

/// A wishlist row with the provider's name and email joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Row key.
    pub id: WishlistEntryId,
    /// Owner of the wishlist.
    pub user_id: UserId,
    /// Saved provider.
    pub provider_id: UserId,
    /// Joined provider name.
    pub provider_name: Option<String>,
    /// Joined provider email.
    pub provider_email: Option<String>,
}

impl WishlistEntry {
    /// Provider name with the wishlist fallback applied.
    #[must_use]
    pub fn provider_label(&self) -> &str {
        fallback::display_or(self.provider_name.as_deref(), fallback::WISHLIST_PROVIDER)
    }
}

/// Outcome of toggling a provider on the wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WishlistToggle {
    /// The provider was saved.
    Added,
    /// The provider was removed.
    Removed,
}

impl WishlistToggle {
    /// Direction of a toggle given the current state.
    #[must_use]
    pub fn from_current(wishlisted: bool) -> Self {
        if wishlisted { Self::Removed } else { Self::Added }
    }

    /// Whether the provider is saved after the toggle.
    #[must_use]
    pub const fn is_wishlisted(self) -> bool {
        matches!(self, Self::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Bo"), "Bo")]
    #[case(Some(" "), "Unknown")]
    #[case(None, "Unknown")]
    fn provider_label(#[case] name: Option<&str>, #[case] expected: &str) {
        let entry = WishlistEntry {
            id: WishlistEntryId::random(),
            user_id: UserId::random(),
            provider_id: UserId::random(),
            provider_name: name.map(str::to_owned),
            provider_email: None,
        };
        assert_eq!(entry.provider_label(), expected);
    }

    #[rstest]
    fn toggle_flips_state() {
        assert_eq!(WishlistToggle::from_current(false), WishlistToggle::Added);
        assert!(!WishlistToggle::from_current(true).is_wishlisted());
    }
}
