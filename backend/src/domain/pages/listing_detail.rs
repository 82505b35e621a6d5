//! Listing detail page: one listing, its provider, testimonials and the
//! caller's wishlist status.
//!
//! The listing and its testimonials are required; the provider's other
//! listings and the wishlist flag degrade to empty when their fetch fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::auth::Caller;
use crate::domain::fallback;
use crate::domain::listing::{Listing, ListingId, ListingSummary};
use crate::domain::ports::BackendPorts;
use crate::domain::profile::Profile;
use crate::domain::rating::{AverageRating, average_rating, review_count_label};
use crate::domain::testimonial::{FeedbackForm, Testimonial, TestimonialDraft};
use crate::domain::user::{AuthUser, UserId};
use crate::domain::view_state::{
    Applied, FormPhase, FormState, LoadTicket, MutationPolicy, PagePhase, PageState,
};
use crate::domain::wishlist::WishlistToggle;
use crate::domain::Error;

use super::{TestimonialCard, confirm_user, field_error};

/// Confirmation shown after leaving feedback.
pub const FEEDBACK_SUBMITTED: &str = "Feedback submitted!";
/// Confirmation shown when feedback was saved but the page could not reload.
pub const FEEDBACK_SUBMITTED_STALE: &str = "Feedback submitted! Refresh to see it.";
/// Shown when the backend refuses feedback.
pub const FEEDBACK_FAILED: &str = "Error submitting feedback.";

/// Reconciliation policy of the wishlist toggle.
pub const TOGGLE_WISHLIST_POLICY: MutationPolicy = MutationPolicy::Patch;
/// Reconciliation policy of feedback submission.
pub const SUBMIT_FEEDBACK_POLICY: MutationPolicy = MutationPolicy::Refetch;

/// Data fetched on mount.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetailData {
    /// The listing.
    pub listing: Listing,
    /// Provider profile, absent when the join found nothing.
    pub provider: Option<Profile>,
    /// The provider's other listings, excluding this one. Empty unless the
    /// provider has more than one listing.
    pub other_listings: Vec<Listing>,
    /// Testimonials left on this listing, newest first.
    pub testimonials: Vec<Testimonial>,
    /// Whether the caller has saved this provider.
    pub wishlisted: bool,
    /// Confirmed signed-in user.
    pub user: Option<AuthUser>,
}

impl ListingDetailData {
    /// Mean of the testimonial ratings.
    #[must_use]
    pub fn average_rating(&self) -> AverageRating {
        let ratings: Vec<_> = self.testimonials.iter().map(|t| t.rating).collect();
        average_rating(&ratings)
    }

    /// Signed in and not the provider.
    #[must_use]
    pub fn can_interact(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.id != self.listing.provider_id)
    }
}

/// Listing detail controller.
#[derive(Debug)]
pub struct ListingDetailController {
    id: ListingId,
    state: PageState<ListingDetailData>,
    feedback: FormState,
}

impl ListingDetailController {
    /// A controller for listing `id`.
    #[must_use]
    pub fn new(id: ListingId) -> Self {
        Self {
            id,
            state: PageState::new(),
            feedback: FormState::default(),
        }
    }

    /// The listing this page shows.
    #[must_use]
    pub const fn id(&self) -> ListingId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &PagePhase {
        self.state.phase()
    }

    /// Loaded data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&ListingDetailData> {
        self.state.data()
    }

    /// Feedback form phase.
    #[must_use]
    pub const fn feedback_phase(&self) -> &FormPhase {
        self.feedback.phase()
    }

    /// Start loading.
    pub fn begin_mount(&mut self) -> LoadTicket {
        self.state.begin_load()
    }

    /// Apply the mount result.
    pub fn finish_mount(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<ListingDetailData, Error>,
    ) -> Applied {
        self.state.resolve(ticket, outcome)
    }

    /// Record a completed wishlist toggle.
    pub fn apply_toggle(&mut self, toggle: WishlistToggle) -> Result<(), Error> {
        self.state
            .patch(|data| data.wishlisted = toggle.is_wishlisted())
    }

    /// Serialisable view of the page.
    #[must_use]
    pub fn snapshot(&self) -> ListingDetailSnapshot<'_> {
        let data = self.state.data();
        ListingDetailSnapshot {
            phase: self.state.phase(),
            listing: data.map(ListingDetailView::from_data),
            feedback: self.feedback.phase(),
        }
    }
}

/// Listing detail page as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetailSnapshot<'a> {
    /// Load phase.
    #[serde(flatten)]
    pub phase: &'a PagePhase,
    /// Page content once loaded.
    pub listing: Option<ListingDetailView<'a>>,
    /// Feedback form phase.
    pub feedback: &'a FormPhase,
}

/// Derived listing detail content.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetailView<'a> {
    /// The listing.
    pub listing: &'a Listing,
    /// Availability with the fallback applied.
    pub availability: &'a str,
    /// Provider name with the fallback applied.
    pub provider_name: &'a str,
    /// Provider avatar initials.
    pub provider_initials: String,
    /// Provider avatar URL.
    pub provider_photo_url: Option<&'a str>,
    /// Provider bio.
    pub provider_about: Option<&'a str>,
    /// Provider contact details.
    pub provider_contact: Option<&'a str>,
    /// Mean testimonial rating.
    pub average_rating: AverageRating,
    /// Filled star slots.
    pub stars: [bool; 5],
    /// Rating text, or the empty-rating fallback.
    pub rating_label: String,
    /// "(n reviews)".
    pub review_count: String,
    /// Testimonials, newest first.
    pub testimonials: Vec<TestimonialCard>,
    /// Provider's other listings.
    pub other_listings: Vec<ListingSummary>,
    /// Whether the provider is on the caller's wishlist.
    pub wishlisted: bool,
    /// Whether wishlist and feedback controls are shown.
    pub can_interact: bool,
}

impl<'a> ListingDetailView<'a> {
    fn from_data(data: &'a ListingDetailData) -> Self {
        let provider = data.provider.as_ref();
        let provider_name = provider.map_or(fallback::PROVIDER_NAME, Profile::provider_name);
        let average = data.average_rating();
        Self {
            listing: &data.listing,
            availability: data.listing.availability_label(),
            provider_name,
            provider_initials: provider.map_or_else(|| fallback::initials(None), Profile::initials),
            provider_photo_url: provider.and_then(|p| fallback::present(p.photo_url.as_deref())),
            provider_about: provider.and_then(|p| fallback::present(p.about_me.as_deref())),
            provider_contact: provider.and_then(|p| fallback::present(p.contact_info.as_deref())),
            average_rating: average,
            stars: average.glyphs(),
            rating_label: average.label(),
            review_count: review_count_label(data.testimonials.len()),
            testimonials: data.testimonials.iter().map(TestimonialCard::from).collect(),
            other_listings: data
                .other_listings
                .iter()
                .map(ListingSummary::from)
                .collect(),
            wishlisted: data.wishlisted,
            can_interact: data.can_interact(),
        }
    }
}

async fn other_listings(
    ports: &BackendPorts,
    caller: &Caller,
    provider_id: &UserId,
    current: ListingId,
) -> Vec<Listing> {
    match ports.listings.list_by_provider(caller, provider_id).await {
        Ok(listings) if listings.len() > 1 => listings
            .into_iter()
            .filter(|listing| listing.id != current)
            .collect(),
        Ok(_) => Vec::new(),
        Err(err) => {
            warn!(error = %err, "could not load provider's other listings");
            Vec::new()
        }
    }
}

async fn wishlist_status(
    ports: &BackendPorts,
    caller: &Caller,
    user: Option<&AuthUser>,
    provider_id: &UserId,
) -> bool {
    let Some(signed_in) = user else {
        return false;
    };
    match ports.wishlists.find(caller, &signed_in.id, provider_id).await {
        Ok(entry) => entry.is_some(),
        Err(err) => {
            warn!(error = %err, "could not load wishlist status");
            false
        }
    }
}

async fn load(
    ports: &BackendPorts,
    caller: &Caller,
    id: ListingId,
) -> Result<ListingDetailData, Error> {
    let (detail, testimonials, user) = futures_util::join!(
        ports.listings.find_detail(caller, &id),
        ports.testimonials.list_for_listing(caller, &id),
        confirm_user(ports, caller)
    );
    let detail = detail?.ok_or_else(|| Error::not_found("Service not found"))?;
    let testimonials = testimonials?;
    let provider_id = detail.listing.provider_id;
    let (other_listings, wishlisted) = futures_util::join!(
        other_listings(ports, caller, &provider_id, id),
        wishlist_status(ports, caller, user.as_ref(), &provider_id)
    );
    Ok(ListingDetailData {
        listing: detail.listing,
        provider: detail.provider,
        other_listings,
        testimonials,
        wishlisted,
        user,
    })
}

/// Load the listing and everything shown beside it.
pub async fn mount(
    controller: &mut ListingDetailController,
    ports: &BackendPorts,
    caller: &Caller,
) -> Applied {
    let ticket = controller.begin_mount();
    let outcome = load(ports, caller, controller.id).await;
    controller.finish_mount(ticket, outcome)
}

fn interacting_user<'a>(
    controller: &ListingDetailController,
    caller: &'a Caller,
) -> Result<(&'a AuthUser, UserId), Error> {
    let user = caller.require_user()?;
    let data = controller
        .data()
        .ok_or_else(|| Error::conflict("page is not ready"))?;
    let provider_id = data.listing.provider_id;
    if user.id == provider_id {
        return Err(Error::forbidden("you cannot do this on your own listing"));
    }
    Ok((user, provider_id))
}

/// Save or unsave the listing's provider.
///
/// # Errors
/// `unauthorized` when signed out, `forbidden` on one's own listing, or the
/// backend failure.
pub async fn toggle_wishlist(
    controller: &mut ListingDetailController,
    ports: &BackendPorts,
    caller: &Caller,
) -> Result<WishlistToggle, Error> {
    let (user, provider_id) = interacting_user(controller, caller)?;
    let wishlisted = controller.data().is_some_and(|data| data.wishlisted);
    let toggle = WishlistToggle::from_current(wishlisted);
    match toggle {
        WishlistToggle::Added => ports.wishlists.add(caller, &user.id, &provider_id).await?,
        WishlistToggle::Removed => {
            ports
                .wishlists
                .remove_provider(caller, &user.id, &provider_id)
                .await?;
        }
    }
    controller.apply_toggle(toggle)?;
    Ok(toggle)
}

/// Leave feedback on the listing, then reload the page.
///
/// Once the insert succeeds the call succeeds. A failed reload leaves the
/// page in its error phase over the previous data and the confirmation asks
/// the visitor to refresh.
///
/// # Errors
/// `unauthorized` when signed out, `invalid_request` with the field name for
/// a bad form, or the backend failure with the generic feedback message.
pub async fn submit_feedback(
    controller: &mut ListingDetailController,
    ports: &BackendPorts,
    caller: &Caller,
    form: &FeedbackForm,
) -> Result<(), Error> {
    let (user, provider_id) = interacting_user(controller, caller)?;
    let (rating, comment) = match form.validate() {
        Ok(valid) => valid,
        Err(err) => {
            controller.feedback.fail(err.to_string());
            return Err(field_error(err.field(), err.to_string()));
        }
    };
    controller.feedback.begin_submit()?;
    let draft = TestimonialDraft {
        from_user_id: user.id,
        to_user_id: provider_id,
        service_id: Some(controller.id),
        rating,
        comment,
    };
    if let Err(err) = ports.testimonials.insert(caller, &draft).await {
        warn!(error = %err, listing = %controller.id, "feedback insert failed");
        controller.feedback.fail(FEEDBACK_FAILED);
        return Err(Error::new(err.code(), FEEDBACK_FAILED));
    }
    controller.feedback.succeed(Some(FEEDBACK_SUBMITTED.to_owned()));
    if mount(controller, ports, caller).await == Applied::Stale {
        debug!(listing = %controller.id, "feedback refetch superseded");
        return Ok(());
    }
    if let PagePhase::Error { error } = controller.phase() {
        warn!(
            listing = %controller.id,
            error = %error.message,
            "feedback saved but the page could not reload"
        );
        controller
            .feedback
            .succeed(Some(FEEDBACK_SUBMITTED_STALE.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "listing_detail_tests.rs"]
mod tests;
