//! Listing aggregation: attach provider display fields and the average rating
//! to raw joined rows.
//!
//! Aggregation is a pure projection. The derived fields are computed only from
//! the record a view carries, so re-aggregating a view yields the same values.

use serde::Serialize;

use super::fallback;
use super::listing::{Listing, ListingRecord};
use super::rating::{AverageRating, average_rating};

/// A listing with its derived display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[serde(flatten)]
    listing: Listing,
    provider_name: String,
    provider_photo_url: Option<String>,
    provider_initials: String,
    average_rating: AverageRating,
    stars: u8,
    review_count: usize,
    #[serde(skip)]
    record: ListingRecord,
}

impl ListingView {
    /// The underlying listing.
    #[must_use]
    pub const fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Provider name, `Anonymous` when the join is empty.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider_name.as_str()
    }

    /// Provider avatar URL, if any.
    #[must_use]
    pub fn provider_photo_url(&self) -> Option<&str> {
        self.provider_photo_url.as_deref()
    }

    /// Avatar initials for the provider.
    #[must_use]
    pub fn provider_initials(&self) -> &str {
        self.provider_initials.as_str()
    }

    /// Mean rating of the joined testimonials; zero when none.
    #[must_use]
    pub const fn average_rating(&self) -> AverageRating {
        self.average_rating
    }

    /// Number of joined ratings.
    #[must_use]
    pub const fn review_count(&self) -> usize {
        self.review_count
    }

    /// The raw record the view was derived from.
    #[must_use]
    pub const fn record(&self) -> &ListingRecord {
        &self.record
    }
}

/// Derive the view of a single record.
#[must_use]
pub fn aggregate_one(record: ListingRecord) -> ListingView {
    let provider = record.provider.as_ref();
    let full_name = provider.and_then(|p| fallback::present(p.full_name.as_deref()));
    let provider_name = full_name.unwrap_or(fallback::PROVIDER_NAME).to_owned();
    let provider_initials = fallback::initials(full_name);
    let provider_photo_url = provider
        .and_then(|p| fallback::present(p.photo_url.as_deref()))
        .map(str::to_owned);
    let ratings = record.ratings.as_deref().unwrap_or_default();
    let average_rating = average_rating(ratings);
    ListingView {
        listing: record.listing.clone(),
        provider_name,
        provider_photo_url,
        provider_initials,
        average_rating,
        stars: average_rating.stars(),
        review_count: ratings.len(),
        record,
    }
}

/// Derive views for every record, preserving order.
#[must_use]
pub fn aggregate(records: impl IntoIterator<Item = ListingRecord>) -> Vec<ListingView> {
    records.into_iter().map(aggregate_one).collect()
}

/// Recompute views from the records they carry.
#[must_use]
pub fn reaggregate(views: &[ListingView]) -> Vec<ListingView> {
    aggregate(views.iter().map(|view| view.record.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::ids::{ListingId, UserId};
    use crate::domain::listing::{HourlyRate, ProviderSummary};
    use crate::domain::rating::Rating;
    use chrono::Utc;
    use rstest::rstest;

    fn record(name: Option<&str>, photo: Option<&str>, ratings: Option<&[i64]>) -> ListingRecord {
        ListingRecord {
            listing: Listing {
                id: ListingId::random(),
                provider_id: UserId::random(),
                title: "Math Tutoring".to_owned(),
                description: "Calc help".to_owned(),
                category: Category::Tutoring,
                hourly_rate: HourlyRate::new(20.0).expect("rate"),
                availability: None,
                created_at: Utc::now(),
            },
            provider: (name.is_some() || photo.is_some()).then(|| ProviderSummary {
                full_name: name.map(str::to_owned),
                photo_url: photo.map(str::to_owned),
            }),
            ratings: ratings.map(|values| {
                values
                    .iter()
                    .map(|v| Rating::new(*v).expect("rating"))
                    .collect()
            }),
        }
    }

    #[rstest]
    fn derives_name_photo_and_average() {
        let view = aggregate_one(record(
            Some("Ann Lee"),
            Some("https://cdn/ann.png"),
            Some(&[4, 5, 3]),
        ));
        assert_eq!(view.provider_name(), "Ann Lee");
        assert_eq!(view.provider_initials(), "AL");
        assert_eq!(view.provider_photo_url(), Some("https://cdn/ann.png"));
        assert!((view.average_rating().value() - 4.0).abs() < f64::EPSILON);
        assert_eq!(view.average_rating().stars(), 4);
        assert_eq!(view.review_count(), 3);
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(""), Some(""), Some(&[][..]))]
    fn missing_joins_fall_back(
        #[case] name: Option<&str>,
        #[case] photo: Option<&str>,
        #[case] ratings: Option<&[i64]>,
    ) {
        let view = aggregate_one(record(name, photo, ratings));
        assert_eq!(view.provider_name(), "Anonymous");
        assert_eq!(view.provider_initials(), "?");
        assert_eq!(view.provider_photo_url(), None);
        assert_eq!(view.average_rating().value(), 0.0);
        assert_eq!(view.average_rating().stars(), 0);
    }

    #[rstest]
    fn reaggregation_is_idempotent() {
        let first = aggregate(vec![
            record(Some("Ann"), None, Some(&[5, 4])),
            record(None, Some("https://cdn/x.png"), None),
        ]);
        let second = reaggregate(&first);
        assert_eq!(first, second);
    }

    #[rstest]
    fn order_is_preserved() {
        let records = vec![record(Some("A"), None, None), record(Some("B"), None, None)];
        let ids: Vec<_> = records.iter().map(|r| r.listing.id).collect();
        let views = aggregate(records);
        let view_ids: Vec<_> = views.iter().map(|v| v.listing().id).collect();
        assert_eq!(ids, view_ids);
    }

    #[rstest]
    fn serialises_flat_with_derived_fields() {
        let view = aggregate_one(record(Some("Ann"), None, Some(&[4])));
        let json = serde_json::to_value(&view).expect("serialise");
        assert_eq!(json["providerName"], "Ann");
        assert_eq!(json["title"], "Math Tutoring");
        assert_eq!(json["averageRating"], 4.0);
        assert_eq!(json["stars"], 4);
        assert!(json.get("record").is_none());
    }
}
