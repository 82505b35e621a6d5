//! Member profiles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::fallback;
use super::ids::UserId;

/// A profile row. Keyed by the auth subject; only its owner mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Same as the auth user id.
    pub id: UserId,
    /// Display name; empty when never set.
    #[serde(default)]
    pub full_name: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Short bio.
    pub about_me: Option<String>,
    /// Free-text contact details.
    pub contact_info: Option<String>,
    /// Public avatar URL.
    pub photo_url: Option<String>,
}

impl Profile {
    /// Name as seen by other members.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        fallback::display_or(Some(self.full_name.as_str()), fallback::PROVIDER_NAME)
    }

    /// Name as seen by the owner on their own profile page.
    #[must_use]
    pub fn own_name(&self) -> &str {
        fallback::display_or(Some(self.full_name.as_str()), fallback::OWN_PROFILE_NAME)
    }

    /// Avatar initials.
    #[must_use]
    pub fn initials(&self) -> String {
        fallback::initials(Some(self.full_name.as_str()))
    }

    /// The editable fields, pre-filled with empty strings where absent.
    #[must_use]
    pub fn edit_form(&self) -> ProfileEdit {
        ProfileEdit {
            full_name: self.full_name.clone(),
            about_me: self.about_me.clone().unwrap_or_default(),
            contact_info: self.contact_info.clone().unwrap_or_default(),
        }
    }

    /// Apply a saved edit locally.
    pub fn apply(&mut self, edit: &ProfileEdit) {
        self.full_name.clone_from(&edit.full_name);
        self.about_me = fallback::present(Some(edit.about_me.as_str())).map(str::to_owned);
        self.contact_info = fallback::present(Some(edit.contact_info.as_str())).map(str::to_owned);
    }
}

/// Raised when the edit form lacks a name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("full name is required")]
pub struct MissingFullName;

/// The profile edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileEdit {
    /// Display name; required.
    pub full_name: String,
    /// Bio; may be blank.
    pub about_me: String,
    /// Contact details; may be blank.
    pub contact_info: String,
}

impl ProfileEdit {
    /// Trim fields and require a name.
    pub fn validate(self) -> Result<Self, MissingFullName> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(MissingFullName);
        }
        Ok(Self {
            full_name: full_name.to_owned(),
            about_me: self.about_me.trim().to_owned(),
            contact_info: self.contact_info.trim().to_owned(),
        })
    }
}

/// Row written when a sign-in or sign-up makes sure a profile exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSeed {
    /// Auth subject.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Name from metadata, possibly empty.
    pub full_name: String,
}
