//! Listing categories and the browse category selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed set of service categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Academic help.
    Tutoring,
    /// Carrying boxes and furniture.
    #[serde(rename = "Moving Help")]
    MovingHelp,
    /// Room and apartment cleaning.
    Cleaning,
    /// Computer and phone help.
    #[serde(rename = "Tech Support")]
    TechSupport,
    /// Portraits and event shots.
    Photography,
    /// Pet sitting and walking.
    #[serde(rename = "Pet Care")]
    PetCare,
    /// Lifts and car pooling.
    Rides,
    /// Meals and baking.
    #[serde(rename = "Food & Cooking")]
    FoodAndCooking,
    /// Training partners and coaching.
    Fitness,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 10] = [
        Self::Tutoring,
        Self::MovingHelp,
        Self::Cleaning,
        Self::TechSupport,
        Self::Photography,
        Self::PetCare,
        Self::Rides,
        Self::FoodAndCooking,
        Self::Fitness,
        Self::Other,
    ];

    /// Human-facing label, also the stored value.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Tutoring => "Tutoring",
            Self::MovingHelp => "Moving Help",
            Self::Cleaning => "Cleaning",
            Self::TechSupport => "Tech Support",
            Self::Photography => "Photography",
            Self::PetCare => "Pet Care",
            Self::Rides => "Rides",
            Self::FoodAndCooking => "Food & Cooking",
            Self::Fitness => "Fitness",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a string names no known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// Category selector on the browse page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Sentinel that matches every listing.
    #[default]
    All,
    /// Exact category match.
    Only(Category),
}

impl CategoryFilter {
    /// Selector value for [`CategoryFilter::All`].
    pub const ALL_LABEL: &'static str = "All";

    /// Whether a listing in `category` passes the selector.
    #[must_use]
    pub fn admits(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }

    /// Selector options: the sentinel followed by every category.
    pub fn options() -> impl Iterator<Item = &'static str> {
        std::iter::once(Self::ALL_LABEL).chain(Category::ALL.into_iter().map(Category::label))
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    /// Blank input selects [`CategoryFilter::All`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == Self::ALL_LABEL {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL_LABEL),
            Self::Only(category) => category.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn labels_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.label().parse::<Category>(), Ok(category));
        }
    }

    #[rstest]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Category::FoodAndCooking).expect("serialise");
        assert_eq!(json, "\"Food & Cooking\"");
        let parsed: Category = serde_json::from_str("\"Pet Care\"").expect("deserialise");
        assert_eq!(parsed, Category::PetCare);
    }

    #[rstest]
    #[case("", CategoryFilter::All)]
    #[case("All", CategoryFilter::All)]
    #[case("Rides", CategoryFilter::Only(Category::Rides))]
    fn filter_parses(#[case] raw: &str, #[case] expected: CategoryFilter) {
        assert_eq!(raw.parse::<CategoryFilter>(), Ok(expected));
    }

    #[rstest]
    fn filter_rejects_unknown_and_case_variants() {
        assert!("rides".parse::<CategoryFilter>().is_err());
        assert!("Gardening".parse::<CategoryFilter>().is_err());
    }

    #[rstest]
    fn options_start_with_sentinel() {
        let options: Vec<_> = CategoryFilter::options().collect();
        assert_eq!(options.first(), Some(&"All"));
        assert_eq!(options.len(), 11);
    }

    #[rstest]
    fn admits_matches_exactly() {
        assert!(CategoryFilter::All.admits(Category::Other));
        assert!(CategoryFilter::Only(Category::Tutoring).admits(Category::Tutoring));
        assert!(!CategoryFilter::Only(Category::Tutoring).admits(Category::Fitness));
    }
}
