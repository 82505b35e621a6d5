//! Wire shapes of the hosted backend's auth, REST and storage APIs.
//!
//! Rows arrive in snake_case with joined relations nested under the related
//! table's name. Conversion into domain types validates categories, rates and
//! ratings. A malformed row in a list is logged and skipped so one bad record
//! cannot hide the rest; a malformed single row is a decode error.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::category::Category;
use crate::domain::ids::{ListingId, TestimonialId, UserId, WishlistEntryId};
use crate::domain::listing::{HourlyRate, Listing, ListingDraft, ListingRecord, ProviderSummary};
use crate::domain::profile::{Profile, ProfileEdit, ProfileSeed};
use crate::domain::rating::Rating;
use crate::domain::service_request::ServiceRequestDraft;
use crate::domain::testimonial::{Testimonial, TestimonialDraft};
use crate::domain::user::{AccessToken, AuthSession, AuthUser, RefreshToken};
use crate::domain::wishlist::WishlistEntry;

/// Error bodies across the three APIs use different field names.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<Value>,
}

impl ErrorBodyDto {
    #[must_use]
    pub(super) fn into_text(self) -> Option<String> {
        let error = match self.error {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        [self.message, self.msg, self.error_description, error]
            .into_iter()
            .flatten()
            .map(|text| text.trim().to_owned())
            .find(|text| !text.is_empty())
    }
}

// --- auth -------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    id: UserId,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

impl From<UserDto> for AuthUser {
    fn from(dto: UserDto) -> Self {
        let full_name = dto
            .user_metadata
            .get("full_name")
            .or_else(|| dto.user_metadata.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Self {
            id: dto.id,
            email: dto.email.unwrap_or_default(),
            full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    access_token: String,
    refresh_token: Option<String>,
    user: UserDto,
}

impl From<SessionDto> for AuthSession {
    fn from(dto: SessionDto) -> Self {
        Self {
            user: dto.user.into(),
            access_token: AccessToken::new(dto.access_token),
            refresh_token: dto.refresh_token.map(RefreshToken::new),
        }
    }
}

/// Sign-up returns a session when confirmation is off, otherwise the user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    User(UserDto),
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpDataDto<'a> {
    pub(super) full_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: SignUpDataDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct PkceGrantDto<'a> {
    pub(super) auth_code: &'a str,
    pub(super) code_verifier: &'a str,
}

// --- profiles ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProfileRow {
    id: UserId,
    full_name: Option<String>,
    email: Option<String>,
    about_me: Option<String>,
    contact_info: Option<String>,
    photo_url: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            about_me: row.about_me,
            contact_info: row.contact_info,
            photo_url: row.photo_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileSeedRow<'a> {
    id: UserId,
    email: &'a str,
    full_name: &'a str,
}

impl<'a> From<&'a ProfileSeed> for ProfileSeedRow<'a> {
    fn from(seed: &'a ProfileSeed) -> Self {
        Self {
            id: seed.id,
            email: seed.email.as_str(),
            full_name: seed.full_name.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileEditRow<'a> {
    full_name: &'a str,
    about_me: Option<&'a str>,
    contact_info: Option<&'a str>,
}

impl<'a> From<&'a ProfileEdit> for ProfileEditRow<'a> {
    fn from(edit: &'a ProfileEdit) -> Self {
        let blank_to_null = |value: &'a str| (!value.is_empty()).then_some(value);
        Self {
            full_name: edit.full_name.as_str(),
            about_me: blank_to_null(edit.about_me.as_str()),
            contact_info: blank_to_null(edit.contact_info.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PhotoUrlRow<'a> {
    pub(super) photo_url: &'a str,
}

// --- services ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ServiceRow {
    id: ListingId,
    provider_id: UserId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    category: String,
    hourly_rate: f64,
    availability: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Listing {
    type Error = String;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse::<Category>()
            .map_err(|err| err.to_string())?;
        let hourly_rate = HourlyRate::new(row.hourly_rate).map_err(|err| err.to_string())?;
        Ok(Self {
            id: row.id,
            provider_id: row.provider_id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            category,
            hourly_rate,
            availability: row.availability,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProviderSummaryRow {
    full_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RatingRow {
    rating: i64,
}

/// `services` joined with its provider and testimonial ratings.
#[derive(Debug, Deserialize)]
pub(super) struct ServiceWithJoinsRow {
    #[serde(flatten)]
    service: ServiceRow,
    profiles: Option<ProviderSummaryRow>,
    testimonials: Option<Vec<RatingRow>>,
}

impl TryFrom<ServiceWithJoinsRow> for ListingRecord {
    type Error = String;

    fn try_from(row: ServiceWithJoinsRow) -> Result<Self, Self::Error> {
        let listing: Listing = row.service.try_into()?;
        let ratings = row.testimonials.map(|rows| {
            rows.into_iter()
                .filter_map(|r| match Rating::new(r.rating) {
                    Ok(rating) => Some(rating),
                    Err(err) => {
                        warn!(listing_id = %listing.id, error = %err, "skipping malformed rating");
                        None
                    }
                })
                .collect()
        });
        Ok(Self {
            listing,
            provider: row.profiles.map(|p| ProviderSummary {
                full_name: p.full_name,
                photo_url: p.photo_url,
            }),
            ratings,
        })
    }
}

/// `services` joined with the provider's full profile.
#[derive(Debug, Deserialize)]
pub(super) struct ServiceWithProviderRow {
    #[serde(flatten)]
    pub(super) service: ServiceRow,
    pub(super) profiles: Option<ProfileRow>,
}

#[derive(Debug, Serialize)]
pub(super) struct NewServiceRow<'a> {
    provider_id: UserId,
    title: &'a str,
    description: &'a str,
    category: &'static str,
    hourly_rate: f64,
    availability: Option<&'a str>,
}

impl<'a> NewServiceRow<'a> {
    #[must_use]
    pub(super) fn new(provider_id: UserId, draft: &'a ListingDraft) -> Self {
        Self {
            provider_id,
            title: draft.title.as_str(),
            description: draft.description.as_str(),
            category: draft.category.label(),
            hourly_rate: draft.hourly_rate.value(),
            availability: draft.availability.as_deref(),
        }
    }
}

// --- service_requests -------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct NewServiceRequestRow<'a> {
    requester_id: UserId,
    category: &'static str,
    date_needed: NaiveDate,
    time_needed: String,
    duration: &'a str,
    details: &'a str,
}

impl<'a> From<&'a ServiceRequestDraft> for NewServiceRequestRow<'a> {
    fn from(draft: &'a ServiceRequestDraft) -> Self {
        Self {
            requester_id: draft.requester_id,
            category: draft.category.label(),
            date_needed: draft.date_needed,
            time_needed: format_time(draft.time_needed),
            duration: draft.duration.as_str(),
            details: draft.details.as_str(),
        }
    }
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

// --- wishlists --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct WishlistProviderRow {
    full_name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WishlistRow {
    id: WishlistEntryId,
    user_id: UserId,
    provider_id: UserId,
    profiles: Option<WishlistProviderRow>,
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        let (provider_name, provider_email) = row
            .profiles
            .map_or((None, None), |p| (p.full_name, p.email));
        Self {
            id: row.id,
            user_id: row.user_id,
            provider_id: row.provider_id,
            provider_name,
            provider_email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WishlistIdRow {
    pub(super) id: WishlistEntryId,
}

#[derive(Debug, Serialize)]
pub(super) struct NewWishlistRow {
    pub(super) user_id: UserId,
    pub(super) provider_id: UserId,
}

// --- testimonials -----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct AuthorRow {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TestimonialRow {
    id: TestimonialId,
    rating: i64,
    #[serde(default)]
    comment: Option<String>,
    from_user_id: UserId,
    to_user_id: UserId,
    service_id: Option<ListingId>,
    created_at: DateTime<Utc>,
    profiles: Option<AuthorRow>,
}

impl TryFrom<TestimonialRow> for Testimonial {
    type Error = String;

    fn try_from(row: TestimonialRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            rating: Rating::new(row.rating).map_err(|err| err.to_string())?,
            comment: row.comment.unwrap_or_default(),
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            service_id: row.service_id,
            created_at: row.created_at,
            author_name: row.profiles.and_then(|author| author.full_name),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewTestimonialRow<'a> {
    from_user_id: UserId,
    to_user_id: UserId,
    service_id: Option<ListingId>,
    rating: u8,
    comment: &'a str,
}

impl<'a> From<&'a TestimonialDraft> for NewTestimonialRow<'a> {
    fn from(draft: &'a TestimonialDraft) -> Self {
        Self {
            from_user_id: draft.from_user_id,
            to_user_id: draft.to_user_id,
            service_id: draft.service_id,
            rating: draft.rating.get(),
            comment: draft.comment.as_str(),
        }
    }
}

/// Convert a list of rows into domain values, skipping rows that fail
/// validation.
#[must_use]
pub(super) fn convert_rows<Row, T>(rows: Vec<Row>) -> Vec<T>
where
    T: TryFrom<Row, Error = String>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "skipping malformed row");
                None
            }
        })
        .collect()
}
