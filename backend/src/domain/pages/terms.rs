//! Terms and conditions prompt.
//!
//! Acceptance is one boolean per browser, kept in a long-lived cookie. The
//! browse page shows the prompt until the cookie is present.

use serde::Serialize;

/// Cookie recording acceptance.
pub const TERMS_COOKIE: &str = "husky_terms_accepted";
/// Value written on acceptance.
pub const TERMS_ACCEPTED: &str = "true";

const TITLE: &str = "Terms & Conditions";
const INTRO: &str = "Welcome to Husky Helpers! By using this platform, you agree to the following:";
const CLAUSES: [&str; 6] = [
    "You are a member of the University of Washington community.",
    "All services are offered and requested in good faith.",
    "You will not post inappropriate, misleading, or harmful content.",
    "Payment terms are agreed upon directly between service providers and receivers.",
    "Husky Helpers is a platform for connection and does not guarantee service quality.",
    "You agree to treat all community members with respect.",
];

/// Whether the stored cookie value records acceptance.
#[must_use]
pub fn is_accepted(cookie_value: Option<&str>) -> bool {
    cookie_value == Some(TERMS_ACCEPTED)
}

/// The terms text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsView {
    /// Dialog title.
    pub title: &'static str,
    /// Lead sentence.
    pub intro: &'static str,
    /// Individual terms.
    pub clauses: &'static [&'static str],
    /// Whether this browser already accepted.
    pub accepted: bool,
}

impl TermsView {
    /// Terms for a browser with the given cookie value.
    #[must_use]
    pub fn for_cookie(cookie_value: Option<&str>) -> Self {
        Self {
            title: TITLE,
            intro: INTRO,
            clauses: &CLAUSES,
            accepted: is_accepted(cookie_value),
        }
    }
}
