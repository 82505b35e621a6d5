//! Testimonials: star ratings with a comment, left by one member about a
//! provider. Never edited once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::fallback;
use super::ids::{ListingId, UserId};
use super::rating::Rating;

pub use super::ids::TestimonialId;

/// A testimonial row with the author's name joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    /// Row key.
    pub id: TestimonialId,
    /// Stars given.
    pub rating: Rating,
    /// Comment text.
    pub comment: String,
    /// Author.
    pub from_user_id: UserId,
    /// Provider being reviewed.
    pub to_user_id: UserId,
    /// Listing the testimonial was left on, if any.
    pub service_id: Option<ListingId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Joined author name.
    pub author_name: Option<String>,
}

impl Testimonial {
    /// Author name with the fallback applied.
    #[must_use]
    pub fn author_label(&self) -> &str {
        fallback::display_or(self.author_name.as_deref(), fallback::TESTIMONIAL_AUTHOR)
    }

    /// Single-letter avatar: the first character of the author's name.
    #[must_use]
    pub fn author_initial(&self) -> String {
        fallback::present(self.author_name.as_deref())
            .and_then(|name| name.chars().next())
            .map_or_else(
                || fallback::INITIALS.to_owned(),
                |first| first.to_uppercase().collect(),
            )
    }
}

/// Validation failures for the feedback form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestimonialValidationError {
    /// No star picked, or out of range.
    #[error("pick a rating between 1 and 5")]
    InvalidRating,
    /// Comment blank.
    #[error("comment is required")]
    MissingComment,
}

impl TestimonialValidationError {
    /// Form field the error belongs to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidRating => "rating",
            Self::MissingComment => "comment",
        }
    }
}

/// Raw feedback form; a rating of 0 means "nothing picked yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackForm {
    /// Stars picked.
    pub rating: i64,
    /// Comment text.
    pub comment: String,
}

/// A testimonial ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialDraft {
    /// Author.
    pub from_user_id: UserId,
    /// Provider being reviewed.
    pub to_user_id: UserId,
    /// Listing it was left on.
    pub service_id: Option<ListingId>,
    /// Stars.
    pub rating: Rating,
    /// Comment, trimmed.
    pub comment: String,
}

impl FeedbackForm {
    /// Validate the rating and comment.
    ///
    /// # Errors
    /// Rating is checked before the comment.
    pub fn validate(&self) -> Result<(Rating, String), TestimonialValidationError> {
        let rating =
            Rating::new(self.rating).map_err(|_| TestimonialValidationError::InvalidRating)?;
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(TestimonialValidationError::MissingComment);
        }
        Ok((rating, comment.to_owned()))
    }
}
