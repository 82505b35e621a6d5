//! Site header: navigation plus the signed-in user.
//!
//! The header is derived from the request's session and can follow auth
//! events from [`AuthStateChannel`](crate::domain::ports::AuthStateChannel)
//! subscribers; a sign-out clears the user.

use serde::Serialize;

use crate::domain::auth::Caller;
use crate::domain::fallback;
use crate::domain::ports::AuthEvent;
use crate::domain::user::AuthUser;

use super::NavLink;

const BROWSE: NavLink = NavLink::new("Browse", "/");
const MEMBER_LINKS: [NavLink; 3] = [
    NavLink::new("Post Service", "/post-service"),
    NavLink::new("Post Request", "/post-request"),
    NavLink::new("My Profile", "/profile"),
];
const SIGN_IN: NavLink = NavLink::new("Sign In", "/login");
const SIGN_OUT: NavLink = NavLink::new("Sign Out", "/auth/sign-out");

/// Header state for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderView {
    user: Option<AuthUser>,
}

/// A navigation entry with its highlight flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderLink {
    /// Target and label.
    #[serde(flatten)]
    pub link: NavLink,
    /// Whether the link matches the current path.
    pub active: bool,
}

/// Header as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSnapshot {
    /// Signed-in user's display name.
    pub user_name: Option<String>,
    /// Initials for the avatar chip.
    pub user_initials: Option<String>,
    /// Navigation entries.
    pub links: Vec<HeaderLink>,
    /// Sign in or sign out.
    pub auth_action: NavLink,
}

impl HeaderView {
    /// Header for the caller of the current request.
    #[must_use]
    pub fn from_caller(caller: &Caller) -> Self {
        Self {
            user: caller.user().cloned(),
        }
    }

    /// Signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Follow an auth state change.
    pub fn apply(&mut self, event: &AuthEvent) {
        match event {
            AuthEvent::SignedIn(user) => self.user = Some(user.clone()),
            AuthEvent::SignedOut(None) => self.user = None,
            AuthEvent::SignedOut(Some(id)) => {
                if self.user.as_ref().is_some_and(|user| user.id == *id) {
                    self.user = None;
                }
            }
        }
    }

    /// Navigation entries with `current_path` highlighted.
    #[must_use]
    pub fn links(&self, current_path: &str) -> Vec<HeaderLink> {
        let member_links = if self.user.is_some() {
            MEMBER_LINKS.as_slice()
        } else {
            &[]
        };
        std::iter::once(&BROWSE)
            .chain(member_links)
            .map(|link| HeaderLink {
                link: link.clone(),
                active: link.href == current_path,
            })
            .collect()
    }

    /// Serialisable view for `current_path`.
    #[must_use]
    pub fn snapshot(&self, current_path: &str) -> HeaderSnapshot {
        let name = self
            .user
            .as_ref()
            .map(|user| fallback::present(Some(user.full_name.as_str())).unwrap_or(&user.email));
        HeaderSnapshot {
            user_name: name.map(str::to_owned),
            user_initials: name.map(|shown| fallback::initials(Some(shown))),
            links: self.links(current_path),
            auth_action: if self.user.is_some() { SIGN_OUT } else { SIGN_IN },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pages::test_support::{signed_in, user};
    use rstest::rstest;

    fn hrefs(header: &HeaderView, path: &str) -> Vec<&'static str> {
        header.links(path).into_iter().map(|l| l.link.href).collect()
    }

    #[rstest]
    fn anonymous_header_offers_sign_in() {
        let header = HeaderView::from_caller(&Caller::anonymous());
        assert_eq!(hrefs(&header, "/"), ["/"]);
        let snapshot = header.snapshot("/");
        assert_eq!(snapshot.auth_action, SIGN_IN);
        assert!(snapshot.user_name.is_none());
    }

    #[rstest]
    fn member_header_lists_member_links() {
        let ann = user("Ann Lee");
        let header = HeaderView::from_caller(&signed_in(&ann));
        assert_eq!(
            hrefs(&header, "/profile"),
            ["/", "/post-service", "/post-request", "/profile"]
        );
        let snapshot = header.snapshot("/profile");
        let active: Vec<_> = snapshot
            .links
            .iter()
            .filter(|l| l.active)
            .map(|l| l.link.label)
            .collect();
        assert_eq!(active, ["My Profile"]);
        assert_eq!(snapshot.user_initials.as_deref(), Some("AL"));
        assert_eq!(snapshot.auth_action, SIGN_OUT);
    }

    #[rstest]
    fn sign_out_event_clears_user() {
        let ann = user("Ann");
        let mut header = HeaderView::from_caller(&signed_in(&ann));
        header.apply(&AuthEvent::SignedOut(Some(user("Bo").id)));
        assert!(header.user().is_some());
        header.apply(&AuthEvent::SignedOut(Some(ann.id)));
        assert!(header.user().is_none());
        header.apply(&AuthEvent::SignedIn(ann.clone()));
        assert_eq!(header.user(), Some(&ann));
        header.apply(&AuthEvent::SignedOut(None));
        assert!(header.user().is_none());
    }
}
