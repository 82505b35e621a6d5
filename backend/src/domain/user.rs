//! Signed-in user identity as reported by the hosted auth service.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub use super::ids::UserId;

/// The authenticated subject of a session.
///
/// `full_name` comes from sign-up metadata and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Auth subject, also the profile key.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Name captured at sign-up or from the OAuth provider.
    #[serde(default)]
    pub full_name: String,
}

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Wrap a raw token value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(Zeroizing::new(value.into()))
            }

            /// Expose the raw token for transport.
            #[must_use]
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

secret_token!(
    /// Bearer token for calls made on behalf of a user.
    AccessToken
);
secret_token!(
    /// Token used to obtain a fresh access token.
    RefreshToken
);

/// A live session: the user plus the credentials to act as them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Session subject.
    pub user: AuthUser,
    /// Bearer token for table and storage calls.
    pub access_token: AccessToken,
    /// Refresh token, when the service issued one.
    pub refresh_token: Option<RefreshToken>,
}
