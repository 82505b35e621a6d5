//! Listings: service offers posted by providers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::category::Category;
use super::fallback;
use super::rating::Rating;

pub use super::ids::ListingId;
use super::ids::UserId;

/// Non-negative, finite hourly rate in dollars.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct HourlyRate(f64);

/// Raised when a rate is negative, not finite, or not a number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hourly rate must be a non-negative number, got {0:?}")]
pub struct InvalidHourlyRate(pub String);

impl HourlyRate {
    /// Validate a rate.
    pub fn new(value: f64) -> Result<Self, InvalidHourlyRate> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidHourlyRate(value.to_string()))
        }
    }

    /// Dollar amount.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for HourlyRate {
    type Error = InvalidHourlyRate;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HourlyRate> for f64 {
    fn from(value: HourlyRate) -> Self {
        value.0
    }
}

impl std::str::FromStr for HourlyRate {
    type Err = InvalidHourlyRate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map_err(|_| InvalidHourlyRate(s.to_owned()))
            .and_then(Self::new)
    }
}

impl fmt::Display for HourlyRate {
    /// Rendered as `$<amount>/hr`, e.g. `$15/hr` or `$12.5/hr`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}/hr", self.0)
    }
}

/// A stored listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Row key.
    pub id: ListingId,
    /// Owner; only they may delete the listing.
    pub provider_id: UserId,
    /// Headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Category from the fixed set.
    pub category: Category,
    /// Asking rate.
    pub hourly_rate: HourlyRate,
    /// Free-text availability; may be absent.
    pub availability: Option<String>,
    /// Creation time, newest first in every list.
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Availability text with the fallback applied.
    #[must_use]
    pub fn availability_label(&self) -> &str {
        fallback::display_or(self.availability.as_deref(), fallback::AVAILABILITY)
    }
}

/// Provider fields joined onto a listing for browse cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    /// Display name, possibly absent.
    pub full_name: Option<String>,
    /// Avatar URL, possibly absent.
    pub photo_url: Option<String>,
}

/// Raw joined row: listing, optional provider, optional rating values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// The listing itself.
    pub listing: Listing,
    /// Joined provider profile, absent when the join found nothing.
    pub provider: Option<ProviderSummary>,
    /// Ratings of testimonials left on this listing, absent when not joined.
    pub ratings: Option<Vec<Rating>>,
}

/// Compact listing used for "other listings by this provider".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    /// Row key.
    pub id: ListingId,
    /// Headline.
    pub title: String,
    /// Category.
    pub category: Category,
    /// Asking rate.
    pub hourly_rate: HourlyRate,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title.clone(),
            category: listing.category,
            hourly_rate: listing.hourly_rate,
        }
    }
}

/// Validation failures for the post-listing form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    /// Title blank.
    #[error("title is required")]
    MissingTitle,
    /// Description blank.
    #[error("description is required")]
    MissingDescription,
    /// Category missing or unknown.
    #[error("choose a category")]
    InvalidCategory,
    /// Rate missing, negative, or not a number.
    #[error("hourly rate must be a non-negative number")]
    InvalidRate,
}

impl ListingValidationError {
    /// Form field the error belongs to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingTitle => "title",
            Self::MissingDescription => "description",
            Self::InvalidCategory => "category",
            Self::InvalidRate => "hourlyRate",
        }
    }
}

/// Raw post-listing form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingForm {
    /// Headline.
    pub title: String,
    /// Category label.
    pub category: String,
    /// Description.
    pub description: String,
    /// Rate as typed.
    pub hourly_rate: String,
    /// Availability, optional.
    pub availability: String,
}

/// A validated listing ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    /// Headline, trimmed.
    pub title: String,
    /// Description, trimmed.
    pub description: String,
    /// Category.
    pub category: Category,
    /// Asking rate.
    pub hourly_rate: HourlyRate,
    /// Availability; blank input becomes `None`.
    pub availability: Option<String>,
}

impl ListingForm {
    /// Validate the form.
    ///
    /// # Errors
    /// Returns the first failing field in form order.
    pub fn validate(&self) -> Result<ListingDraft, ListingValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ListingValidationError::MissingTitle);
        }
        let category = self
            .category
            .parse::<Category>()
            .map_err(|_| ListingValidationError::InvalidCategory)?;
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ListingValidationError::MissingDescription);
        }
        let hourly_rate = self
            .hourly_rate
            .parse::<HourlyRate>()
            .map_err(|_| ListingValidationError::InvalidRate)?;
        let availability = fallback::present(Some(self.availability.trim())).map(str::to_owned);
        Ok(ListingDraft {
            title: title.to_owned(),
            description: description.to_owned(),
            category,
            hourly_rate,
            availability,
        })
    }
}
