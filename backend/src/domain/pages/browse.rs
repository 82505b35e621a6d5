//! Browse page: every listing, searchable and filterable by category.
//!
//! Query and category edits re-derive the visible subset locally; they never
//! refetch. The page has no mutations.

use serde::Serialize;

use crate::domain::auth::Caller;
use crate::domain::category::CategoryFilter;
use crate::domain::listing_view::{ListingView, aggregate};
use crate::domain::ports::BackendPorts;
use crate::domain::search::{SearchQuery, filter_listings};
use crate::domain::user::AuthUser;
use crate::domain::view_state::{Applied, LoadTicket, PagePhase, PageState};
use crate::domain::Error;

use super::{NavLink, confirm_user};

/// Data fetched on mount.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseData {
    /// Aggregated listings, newest first.
    pub listings: Vec<ListingView>,
    /// Confirmed signed-in user.
    pub user: Option<AuthUser>,
}

/// Browse page controller.
#[derive(Debug, Default)]
pub struct BrowseController {
    state: PageState<BrowseData>,
    query: SearchQuery,
    category: CategoryFilter,
}

impl BrowseController {
    /// A controller with an empty query and the `All` category.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &PagePhase {
        self.state.phase()
    }

    /// Start loading.
    pub fn begin_mount(&mut self) -> LoadTicket {
        self.state.begin_load()
    }

    /// Apply the mount result.
    pub fn finish_mount(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<BrowseData, Error>,
    ) -> Applied {
        self.state.resolve(ticket, outcome)
    }

    /// Replace the search text.
    pub fn set_query(&mut self, raw: &str) {
        self.query = SearchQuery::new(raw);
    }

    /// Replace the category selector.
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
    }

    /// Listings passing the current query and category.
    #[must_use]
    pub fn visible(&self) -> Vec<&ListingView> {
        self.state
            .data()
            .map(|data| filter_listings(&data.listings, &self.query, self.category))
            .unwrap_or_default()
    }

    /// Hero call-to-action links.
    #[must_use]
    pub fn hero_actions(&self) -> Vec<NavLink> {
        let signed_in = self.state.data().is_some_and(|data| data.user.is_some());
        if signed_in {
            vec![
                NavLink::new("Offer a Service", "/post-service"),
                NavLink::new("Request Help", "/post-request"),
            ]
        } else {
            vec![NavLink::new("Sign In to Get Started", "/login")]
        }
    }

    /// Serializable view of the page.
    #[must_use]
    pub fn snapshot(&self, show_terms: bool) -> BrowseSnapshot<'_> {
        BrowseSnapshot {
            phase: self.state.phase(),
            query: self.query.as_str(),
            category: self.category.to_string(),
            categories: CategoryFilter::options().collect(),
            hero_actions: self.hero_actions(),
            listings: self.visible(),
            show_terms,
        }
    }
}

/// Browse page as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseSnapshot<'a> {
    /// Load phase.
    #[serde(flatten)]
    pub phase: &'a PagePhase,
    /// Normalised query text.
    pub query: &'a str,
    /// Selected category label.
    pub category: String,
    /// Category selector options.
    pub categories: Vec<&'static str>,
    /// Hero buttons.
    pub hero_actions: Vec<NavLink>,
    /// Visible listings; empty means "No services found".
    pub listings: Vec<&'a ListingView>,
    /// Whether the terms prompt must be shown.
    pub show_terms: bool,
}

/// Load listings and confirm the caller, concurrently.
pub async fn mount(
    controller: &mut BrowseController,
    ports: &BackendPorts,
    caller: &Caller,
) -> Applied {
    let ticket = controller.begin_mount();
    let (listings, user) = futures_util::join!(
        ports.listings.list_with_provider_and_ratings(caller),
        confirm_user(ports, caller)
    );
    let outcome = listings
        .map(|records| BrowseData {
            listings: aggregate(records),
            user,
        })
        .map_err(Error::from);
    controller.finish_mount(ticket, outcome)
}

#[cfg(test)]
#[path = "browse_tests.rs"]
mod tests;
