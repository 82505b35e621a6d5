//! Browse search: free-text query plus category selector.

use super::category::CategoryFilter;
use super::listing_view::ListingView;

/// Case-insensitive substring query. The empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Lowercase the query; whitespace is significant.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    /// The normalised query.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether any of `fields` contains the query.
    #[must_use]
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(self.0.as_str()))
    }

    /// Title, description or provider name contains the query.
    #[must_use]
    pub fn matches_listing(&self, view: &ListingView) -> bool {
        let listing = view.listing();
        self.matches_any([
            listing.title.as_str(),
            listing.description.as_str(),
            view.provider_name(),
        ])
    }
}

/// Listings passing both the text query and the category selector, in their
/// original order.
///
/// The result is always a subset of `views`.
#[must_use]
pub fn filter_listings<'a>(
    views: &'a [ListingView],
    query: &SearchQuery,
    category: CategoryFilter,
) -> Vec<&'a ListingView> {
    views
        .iter()
        .filter(|view| query.matches_listing(view) && category.admits(view.listing().category))
        .collect()
}
