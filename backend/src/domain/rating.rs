//! Star ratings and their average.

use serde::{Deserialize, Serialize};

use super::fallback;

/// Highest star count.
pub const MAX_STARS: u8 = 5;

const STAR_SLOTS: [u8; 5] = [1, 2, 3, 4, 5];

/// A single star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

/// Raised when a rating lies outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct RatingOutOfRange(pub i64);

impl Rating {
    /// Validate a raw star count.
    ///
    /// # Errors
    /// Returns [`RatingOutOfRange`] for values outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingOutOfRange> {
        u8::try_from(value)
            .ok()
            .filter(|stars| (1..=MAX_STARS).contains(stars))
            .map(Self)
            .ok_or(RatingOutOfRange(value))
    }

    /// The star count.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Mean of a set of ratings, always within `[0, 5]`.
///
/// Zero means "no ratings".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(into = "f64")]
pub struct AverageRating(f64);

impl AverageRating {
    /// The raw mean.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whole stars to fill, rounding halves up.
    #[must_use]
    pub fn stars(self) -> u8 {
        let rounded = self.0.round().clamp(0.0, f64::from(MAX_STARS));
        STAR_SLOTS
            .into_iter()
            .rev()
            .find(|stars| f64::from(*stars) <= rounded)
            .unwrap_or(0)
    }

    /// Fill state of each of the five star glyphs.
    #[must_use]
    pub fn glyphs(self) -> [bool; 5] {
        let filled = self.stars();
        STAR_SLOTS.map(|position| position <= filled)
    }

    /// One-decimal label, or the fallback when there are no ratings.
    ///
    /// # Examples
    /// ```
    /// use husky_helpers::domain::rating::{average_rating, Rating};
    ///
    /// let ratings = [4, 5, 3].map(|n| Rating::new(n).unwrap());
    /// assert_eq!(average_rating(&ratings).label(), "4.0");
    /// assert_eq!(average_rating(&[]).label(), "No ratings yet");
    /// ```
    #[must_use]
    pub fn label(self) -> String {
        if self.0 > 0.0 {
            format!("{:.1}", self.0)
        } else {
            fallback::RATING_LABEL.to_owned()
        }
    }
}

impl From<AverageRating> for f64 {
    fn from(value: AverageRating) -> Self {
        value.0
    }
}

/// Arithmetic mean of `ratings`; zero for an empty slice.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the mean of at most a few hundred small integers is exact enough in f64"
)]
pub fn average_rating(ratings: &[Rating]) -> AverageRating {
    if ratings.is_empty() {
        return AverageRating::default();
    }
    let sum: u32 = ratings.iter().map(|rating| u32::from(rating.get())).sum();
    let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
    AverageRating(f64::from(sum) / f64::from(count))
}

/// Review count caption, e.g. `(1 review)` or `(3 reviews)`.
#[must_use]
pub fn review_count_label(count: usize) -> String {
    if count == 1 {
        "(1 review)".to_owned()
    } else {
        format!("({count} reviews)")
    }
}
