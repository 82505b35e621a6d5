//! Behaviour tests for the rating summary shown on listing cards.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;

use husky_helpers::domain::rating::{AverageRating, Rating, average_rating};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const NO_RATINGS: &str = "No ratings yet";

#[derive(Default)]
struct RatingWorld {
    ratings: RefCell<Vec<Rating>>,
    average: RefCell<Option<AverageRating>>,
}

#[fixture]
fn world() -> RatingWorld {
    RatingWorld::default()
}

#[given("testimonials rated {ratings}")]
fn testimonials_rated(world: &RatingWorld, ratings: String) {
    let parsed = if ratings == "none" {
        Vec::new()
    } else {
        ratings
            .split(',')
            .map(|value| {
                let value: i64 = value.trim().parse().expect("numeric rating");
                Rating::new(value).expect("rating in range")
            })
            .collect()
    };
    *world.ratings.borrow_mut() = parsed;
}

#[when("the average rating is computed")]
fn the_average_rating_is_computed(world: &RatingWorld) {
    let average = average_rating(&world.ratings.borrow());
    *world.average.borrow_mut() = Some(average);
}

#[then("the rating label reads {label}")]
fn the_rating_label_reads(world: &RatingWorld, label: String) {
    let average = world.average.borrow().expect("average computed");
    let expected = if label == "none" { NO_RATINGS } else { &label };
    assert_eq!(average.label(), expected);
}

#[then("{stars} stars are filled")]
fn stars_are_filled(world: &RatingWorld, stars: u8) {
    let average = world.average.borrow().expect("average computed");
    assert_eq!(average.stars(), stars);
    let filled = average.glyphs().iter().filter(|lit| **lit).count();
    assert_eq!(filled, usize::from(stars));
}

#[scenario(path = "tests/features/average_rating.feature")]
fn average_rating_display(world: RatingWorld, ratings: String, label: String, stars: String) {
    drop((world, ratings, label, stars));
}
