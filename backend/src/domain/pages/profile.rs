//! Profile page: the signed-in member's profile, listings, wishlist and
//! received testimonials.
//!
//! Every mutation here patches local state; the page never refetches after
//! loading.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::domain::auth::Caller;
use crate::domain::avatar::{AVATAR_BUCKET, AvatarUpload, cache_busted_url};
use crate::domain::ids::WishlistEntryId;
use crate::domain::listing::{Listing, ListingId};
use crate::domain::ports::{BackendPorts, StoredObject};
use crate::domain::profile::{Profile, ProfileEdit};
use crate::domain::rating::{AverageRating, average_rating, review_count_label};
use crate::domain::testimonial::Testimonial;
use crate::domain::user::AuthUser;
use crate::domain::view_state::{
    Applied, FormPhase, FormState, LoadTicket, MutationPolicy, PagePhase, PageState,
};
use crate::domain::wishlist::WishlistEntry;
use crate::domain::Error;

use super::{TestimonialCard, field_error};

/// Confirmation shown after saving the profile form.
pub const PROFILE_UPDATED: &str = "Profile updated!";
/// Confirmation shown after replacing the photo.
pub const PHOTO_UPDATED: &str = "Photo updated!";

/// Reconciliation policy of every profile page mutation.
pub const PROFILE_MUTATION_POLICY: MutationPolicy = MutationPolicy::Patch;

/// Data fetched on mount.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
    /// The caller.
    pub user: AuthUser,
    /// The caller's profile row, or an empty one if none exists yet.
    pub profile: Profile,
    /// Listings the caller provides.
    pub listings: Vec<Listing>,
    /// Saved providers.
    pub wishlist: Vec<WishlistEntry>,
    /// Testimonials about the caller.
    pub testimonials: Vec<Testimonial>,
}

impl ProfileData {
    /// Mean rating received.
    #[must_use]
    pub fn average_rating(&self) -> AverageRating {
        let ratings: Vec<_> = self.testimonials.iter().map(|t| t.rating).collect();
        average_rating(&ratings)
    }
}

/// Profile controller.
#[derive(Debug, Default)]
pub struct ProfileController {
    state: PageState<ProfileData>,
    editing: Option<ProfileEdit>,
    form: FormState,
    photo: FormState,
}

impl ProfileController {
    /// An idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &PagePhase {
        self.state.phase()
    }

    /// Loaded data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&ProfileData> {
        self.state.data()
    }

    /// The edit form while `Editing`.
    #[must_use]
    pub const fn editing(&self) -> Option<&ProfileEdit> {
        self.editing.as_ref()
    }

    /// Profile form phase.
    #[must_use]
    pub const fn form_phase(&self) -> &FormPhase {
        self.form.phase()
    }

    /// Photo upload phase.
    #[must_use]
    pub const fn photo_phase(&self) -> &FormPhase {
        self.photo.phase()
    }

    /// Start loading.
    pub fn begin_mount(&mut self) -> LoadTicket {
        self.state.begin_load()
    }

    /// Apply the mount result.
    pub fn finish_mount(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<ProfileData, Error>,
    ) -> Applied {
        self.state.resolve(ticket, outcome)
    }

    /// Enter `Editing` with the form pre-filled from the profile.
    ///
    /// # Errors
    /// Returns `conflict` unless the page is ready.
    pub fn begin_edit(&mut self) -> Result<(), Error> {
        let form = self
            .state
            .data()
            .filter(|_| self.state.is_ready())
            .map(|data| data.profile.edit_form())
            .ok_or_else(|| Error::conflict("page is not ready"))?;
        self.editing = Some(form);
        Ok(())
    }

    /// Leave `Editing` without saving.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Serialisable view of the page.
    #[must_use]
    pub fn snapshot(&self) -> ProfileSnapshot<'_> {
        ProfileSnapshot {
            phase: self.state.phase(),
            profile: self.state.data().map(ProfileView::from_data),
            editing: self.editing.as_ref(),
            form: self.form.phase(),
            photo: self.photo.phase(),
        }
    }
}

/// Profile page as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot<'a> {
    /// Load phase.
    #[serde(flatten)]
    pub phase: &'a PagePhase,
    /// Page content once loaded.
    pub profile: Option<ProfileView<'a>>,
    /// The edit form while editing.
    pub editing: Option<&'a ProfileEdit>,
    /// Profile form phase.
    pub form: &'a FormPhase,
    /// Photo upload phase.
    pub photo: &'a FormPhase,
}

/// Wishlist entry as rendered.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistCard<'a> {
    /// Row key, used for removal.
    pub id: WishlistEntryId,
    /// Provider name with the fallback applied.
    pub provider_name: &'a str,
    /// Provider email, if joined.
    pub provider_email: Option<&'a str>,
}

/// Derived profile content.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView<'a> {
    /// Profile row.
    pub profile: &'a Profile,
    /// Name, or the prompt to set one.
    pub display_name: &'a str,
    /// Avatar initials.
    pub initials: String,
    /// Mean rating received.
    pub average_rating: AverageRating,
    /// Filled star slots.
    pub stars: [bool; 5],
    /// Rating text, or the empty-rating fallback.
    pub rating_label: String,
    /// "(n reviews)".
    pub review_count: String,
    /// Own listings.
    pub listings: &'a [Listing],
    /// Saved providers.
    pub wishlist: Vec<WishlistCard<'a>>,
    /// Testimonials received.
    pub testimonials: Vec<TestimonialCard>,
}

impl<'a> ProfileView<'a> {
    fn from_data(data: &'a ProfileData) -> Self {
        let average = data.average_rating();
        Self {
            profile: &data.profile,
            display_name: data.profile.own_name(),
            initials: data.profile.initials(),
            average_rating: average,
            stars: average.glyphs(),
            rating_label: average.label(),
            review_count: review_count_label(data.testimonials.len()),
            listings: &data.listings,
            wishlist: data
                .wishlist
                .iter()
                .map(|entry| WishlistCard {
                    id: entry.id,
                    provider_name: entry.provider_label(),
                    provider_email: entry.provider_email.as_deref(),
                })
                .collect(),
            testimonials: data.testimonials.iter().map(TestimonialCard::from).collect(),
        }
    }
}

fn empty_profile(user: &AuthUser) -> Profile {
    Profile {
        id: user.id,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        about_me: None,
        contact_info: None,
        photo_url: None,
    }
}

async fn load(ports: &BackendPorts, caller: &Caller) -> Result<ProfileData, Error> {
    let user = caller.require_user()?.clone();
    let (profile, listings, wishlist, testimonials) = futures_util::join!(
        ports.profiles.find(caller, &user.id),
        ports.listings.list_by_provider(caller, &user.id),
        ports.wishlists.list_for_user(caller, &user.id),
        ports.testimonials.list_for_provider(caller, &user.id)
    );
    Ok(ProfileData {
        profile: profile?.unwrap_or_else(|| empty_profile(&user)),
        listings: listings?,
        wishlist: wishlist?,
        testimonials: testimonials?,
        user,
    })
}

/// Load everything the profile page shows.
///
/// A signed-out caller ends in the `unauthorized` error phase.
pub async fn mount(
    controller: &mut ProfileController,
    ports: &BackendPorts,
    caller: &Caller,
) -> Applied {
    let ticket = controller.begin_mount();
    let outcome = load(ports, caller).await;
    controller.finish_mount(ticket, outcome)
}

/// Save the edit form and leave `Editing`.
///
/// # Errors
/// `unauthorized` when signed out, `invalid_request` without a name, or the
/// backend failure.
pub async fn save_profile(
    controller: &mut ProfileController,
    ports: &BackendPorts,
    caller: &Caller,
    edit: ProfileEdit,
) -> Result<(), Error> {
    let user = caller.require_user()?;
    if !controller.state.is_ready() {
        return Err(Error::conflict("page is not ready"));
    }
    let valid = match edit.validate() {
        Ok(valid) => valid,
        Err(err) => {
            controller.form.fail(err.to_string());
            return Err(field_error("fullName", err.to_string()));
        }
    };
    controller.form.begin_submit()?;
    if let Err(err) = ports.profiles.update(caller, &user.id, &valid).await {
        let error = Error::from(err);
        controller.form.fail(error.message());
        return Err(error);
    }
    controller.state.patch(|data| data.profile.apply(&valid))?;
    controller.editing = None;
    controller.form.succeed(Some(PROFILE_UPDATED.to_owned()));
    Ok(())
}

/// Remove a saved provider.
///
/// # Errors
/// `unauthorized` when signed out, or the backend failure.
pub async fn remove_wishlist_entry(
    controller: &mut ProfileController,
    ports: &BackendPorts,
    caller: &Caller,
    id: WishlistEntryId,
) -> Result<(), Error> {
    caller.require_user()?;
    ports.wishlists.remove(caller, &id).await?;
    controller
        .state
        .patch(|data| data.wishlist.retain(|entry| entry.id != id))
}

/// Delete one of the caller's listings.
///
/// # Errors
/// `unauthorized` when signed out, `not_found` when the listing is not among
/// the caller's own, or the backend failure.
pub async fn delete_listing(
    controller: &mut ProfileController,
    ports: &BackendPorts,
    caller: &Caller,
    id: ListingId,
) -> Result<(), Error> {
    caller.require_user()?;
    let owned = controller
        .data()
        .is_some_and(|data| data.listings.iter().any(|listing| listing.id == id));
    if !owned {
        return Err(Error::not_found("Service not found"));
    }
    ports.listings.delete(caller, &id).await?;
    info!(listing = %id, "listing deleted");
    controller
        .state
        .patch(|data| data.listings.retain(|listing| listing.id != id))
}

/// Replace the profile photo.
///
/// The object is overwritten in place, so the stored URL carries a
/// cache-busting timestamp from `clock`.
///
/// # Errors
/// `unauthorized` when signed out, or the storage or profile failure.
pub async fn upload_photo(
    controller: &mut ProfileController,
    ports: &BackendPorts,
    caller: &Caller,
    upload: AvatarUpload,
    clock: &Arc<dyn Clock>,
) -> Result<Url, Error> {
    let user = caller.require_user()?;
    if !controller.state.is_ready() {
        return Err(Error::conflict("page is not ready"));
    }
    controller.photo.begin_submit()?;
    match store_photo(ports, caller, user, upload, clock).await {
        Ok(url) => {
            let stored = url.to_string();
            controller
                .state
                .patch(|data| data.profile.photo_url = Some(stored))?;
            controller.photo.succeed(Some(PHOTO_UPDATED.to_owned()));
            Ok(url)
        }
        Err(err) => {
            controller.photo.fail(err.message());
            Err(err)
        }
    }
}

async fn store_photo(
    ports: &BackendPorts,
    caller: &Caller,
    user: &AuthUser,
    upload: AvatarUpload,
    clock: &Arc<dyn Clock>,
) -> Result<Url, Error> {
    let path = upload.object_path(user.id);
    let object = StoredObject {
        bucket: AVATAR_BUCKET.to_owned(),
        content_type: upload.content_type().to_owned(),
        bytes: upload.into_bytes(),
        path,
        overwrite: true,
    };
    ports.storage.upload(caller, &object).await?;
    let public = ports.storage.public_url(&object.bucket, &object.path)?;
    let url = cache_busted_url(&public, clock.utc());
    ports.profiles.set_photo_url(caller, &user.id, &url).await?;
    Ok(url)
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
