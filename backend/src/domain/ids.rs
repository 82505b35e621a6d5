//! Strongly typed identifiers for backend rows.
//!
//! Each identifier wraps a UUID and serialises as its hyphenated string form.

use thiserror::Error;

/// Raised when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a valid UUID, got {value:?}")]
pub struct InvalidId {
    /// Name of the identifier type.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Borrow the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::ids::InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| $crate::domain::ids::InvalidId {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::ids::InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Identity of a signed-in member; matches the auth subject and profile key.
    UserId,
    "user id"
);
define_id!(
    /// Identity of a listing (a posted service offer).
    ListingId,
    "listing id"
);
define_id!(
    /// Identity of a testimonial.
    TestimonialId,
    "testimonial id"
);
define_id!(
    /// Identity of a wishlist entry.
    WishlistEntryId,
    "wishlist entry id"
);
