//! Display fallbacks for absent or empty values.
//!
//! Every placeholder shown in place of missing data is defined here so pages
//! stay consistent.

/// Provider name shown when the joined profile has no name.
pub const PROVIDER_NAME: &str = "Anonymous";
/// Testimonial author shown when the joined profile has no name.
pub const TESTIMONIAL_AUTHOR: &str = "Anonymous";
/// Wishlist provider shown when the joined profile has no name.
pub const WISHLIST_PROVIDER: &str = "Unknown";
/// Placeholder for the signed-in user's own empty name.
pub const OWN_PROFILE_NAME: &str = "Set your name";
/// Availability shown when a listing leaves it blank.
pub const AVAILABILITY: &str = "Flexible";
/// Initials shown when there is no name at all.
pub const INITIALS: &str = "?";
/// Rating label shown for a zero average.
pub const RATING_LABEL: &str = "No ratings yet";

/// Return `value` when it holds visible text, otherwise `fallback`.
///
/// # Examples
/// ```
/// use husky_helpers::domain::fallback::{display_or, PROVIDER_NAME};
///
/// assert_eq!(display_or(Some("Ada"), PROVIDER_NAME), "Ada");
/// assert_eq!(display_or(Some("  "), PROVIDER_NAME), "Anonymous");
/// assert_eq!(display_or(None, PROVIDER_NAME), "Anonymous");
/// ```
#[must_use]
pub fn display_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    present(value).unwrap_or(fallback)
}

/// Treat blank strings as absent.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Initials of a display name.
///
/// Takes the first character of each space-separated word, uppercased.
/// Missing or blank names give [`INITIALS`].
///
/// # Examples
/// ```
/// use husky_helpers::domain::fallback::initials;
///
/// assert_eq!(initials(Some("ada king lovelace")), "AKL");
/// assert_eq!(initials(None), "?");
/// ```
#[must_use]
pub fn initials(name: Option<&str>) -> String {
    let Some(shown) = present(name) else {
        return INITIALS.to_owned();
    };
    shown
        .split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
