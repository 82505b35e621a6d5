//! Tests for the listing detail controller.

use super::*;
use crate::domain::category::Category;
use crate::domain::ids::{TestimonialId, WishlistEntryId};
use crate::domain::pages::test_support::{MockPorts, listing, signed_in, user};
use crate::domain::ports::{
    ListingDetailRecord, ListingRepositoryError, TestimonialRepositoryError,
    WishlistRepositoryError,
};
use crate::domain::rating::Rating;
use crate::domain::ErrorCode;
use chrono::Utc;
use mockall::predicate::eq;
use rstest::rstest;

struct Scene {
    provider: AuthUser,
    visitor: AuthUser,
    current: Listing,
    other: Listing,
}

impl Scene {
    fn new() -> Self {
        let provider = user("Ann Lee");
        let current = listing(provider.id, "Math Tutoring", Category::Tutoring);
        let other = listing(provider.id, "Physics Help", Category::Tutoring);
        Self {
            provider,
            visitor: user("Bo"),
            current,
            other,
        }
    }

    fn testimonial(&self, stars: i64) -> Testimonial {
        Testimonial {
            id: TestimonialId::random(),
            rating: Rating::new(stars).expect("rating"),
            comment: "Great".to_owned(),
            from_user_id: self.visitor.id,
            to_user_id: self.provider.id,
            service_id: Some(self.current.id),
            created_at: Utc::now(),
            author_name: Some(self.visitor.full_name.clone()),
        }
    }

    /// Mocks for a full mount; `wishlisted` controls the status lookup.
    fn mocks(&self, confirmed: Option<AuthUser>, wishlisted: bool) -> MockPorts {
        let mut mocks = MockPorts::default();
        let record = ListingDetailRecord {
            listing: self.current.clone(),
            provider: None,
        };
        mocks
            .listings
            .expect_find_detail()
            .returning(move |_, _| Ok(Some(record.clone())));
        let by_provider = vec![self.current.clone(), self.other.clone()];
        mocks
            .listings
            .expect_list_by_provider()
            .with(mockall::predicate::always(), eq(self.provider.id))
            .returning(move |_, _| Ok(by_provider.clone()));
        let testimonials = vec![self.testimonial(4), self.testimonial(5)];
        mocks
            .testimonials
            .expect_list_for_listing()
            .returning(move |_, _| Ok(testimonials.clone()));
        mocks.wishlists.expect_find().returning(move |_, _, _| {
            Ok(wishlisted.then(WishlistEntryId::random))
        });
        mocks.confirm(confirmed);
        mocks
    }
}

#[rstest]
#[tokio::test]
async fn mount_derives_rating_and_other_listings() {
    let scene = Scene::new();
    let ports = scene.mocks(Some(scene.visitor.clone()), true).into_ports();
    let mut controller = ListingDetailController::new(scene.current.id);

    let applied = mount(&mut controller, &ports, &signed_in(&scene.visitor)).await;

    assert_eq!(applied, Applied::Current);
    let data = controller.data().expect("loaded");
    assert!((data.average_rating().value() - 4.5).abs() < f64::EPSILON);
    assert_eq!(data.other_listings, vec![scene.other.clone()]);
    assert!(data.wishlisted);
    assert!(data.can_interact());

    let view = controller.snapshot();
    let json = serde_json::to_value(&view).expect("serialise");
    assert_eq!(json["phase"], "ready");
    assert_eq!(json["listing"]["providerName"], "Anonymous");
    assert_eq!(json["listing"]["reviewCount"], "(2 reviews)");
    assert_eq!(json["listing"]["availability"], "Flexible");
}

#[rstest]
#[tokio::test]
async fn single_listing_provider_has_no_other_listings() {
    let scene = Scene::new();
    let mut mocks = MockPorts::default();
    let record = ListingDetailRecord {
        listing: scene.current.clone(),
        provider: None,
    };
    mocks
        .listings
        .expect_find_detail()
        .returning(move |_, _| Ok(Some(record.clone())));
    let only = vec![scene.current.clone()];
    mocks
        .listings
        .expect_list_by_provider()
        .returning(move |_, _| Ok(only.clone()));
    mocks
        .testimonials
        .expect_list_for_listing()
        .returning(|_, _| Ok(Vec::new()));
    mocks.confirm(None);
    let ports = mocks.into_ports();
    let mut controller = ListingDetailController::new(scene.current.id);

    let _ = mount(&mut controller, &ports, &Caller::anonymous()).await;

    let data = controller.data().expect("loaded");
    assert!(data.other_listings.is_empty());
    assert!(!data.can_interact());
    assert_eq!(data.average_rating().label(), "No ratings yet");
}

#[rstest]
#[tokio::test]
async fn missing_listing_is_not_found() {
    let mut mocks = MockPorts::default();
    mocks
        .listings
        .expect_find_detail()
        .returning(|_, _| Ok(None));
    mocks
        .testimonials
        .expect_list_for_listing()
        .returning(|_, _| Ok(Vec::new()));
    mocks.confirm(None);
    let ports = mocks.into_ports();
    let mut controller = ListingDetailController::new(ListingId::random());

    let _ = mount(&mut controller, &ports, &Caller::anonymous()).await;

    assert!(matches!(
        controller.phase(),
        PagePhase::Error { error } if error.code == ErrorCode::NotFound
    ));
}

#[rstest]
#[tokio::test]
async fn optional_slices_degrade() {
    let scene = Scene::new();
    let mut mocks = MockPorts::default();
    let record = ListingDetailRecord {
        listing: scene.current.clone(),
        provider: None,
    };
    mocks
        .listings
        .expect_find_detail()
        .returning(move |_, _| Ok(Some(record.clone())));
    mocks
        .listings
        .expect_list_by_provider()
        .returning(|_, _| Err(ListingRepositoryError::unavailable("timeout")));
    mocks
        .testimonials
        .expect_list_for_listing()
        .returning(|_, _| Ok(Vec::new()));
    mocks
        .wishlists
        .expect_find()
        .returning(|_, _, _| Err(WishlistRepositoryError::unavailable("timeout")));
    mocks.confirm(Some(scene.visitor.clone()));
    let ports = mocks.into_ports();
    let mut controller = ListingDetailController::new(scene.current.id);

    let _ = mount(&mut controller, &ports, &signed_in(&scene.visitor)).await;

    assert_eq!(controller.phase(), &PagePhase::Ready);
    let data = controller.data().expect("loaded");
    assert!(!data.wishlisted);
    assert!(data.other_listings.is_empty());
}

#[rstest]
#[tokio::test]
async fn toggle_adds_by_provider_id_and_patches() {
    let scene = Scene::new();
    let mut mocks = scene.mocks(Some(scene.visitor.clone()), false);
    mocks
        .wishlists
        .expect_add()
        .with(
            mockall::predicate::always(),
            eq(scene.visitor.id),
            eq(scene.provider.id),
        )
        .times(1)
        .returning(|_, _, _| Ok(()));
    let ports = mocks.into_ports();
    let caller = signed_in(&scene.visitor);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let toggle = toggle_wishlist(&mut controller, &ports, &caller)
        .await
        .expect("toggle");

    assert_eq!(toggle, WishlistToggle::Added);
    assert!(controller.data().expect("loaded").wishlisted);
    assert_eq!(TOGGLE_WISHLIST_POLICY, MutationPolicy::Patch);
}

#[rstest]
#[tokio::test]
async fn signed_out_toggle_is_unauthorized() {
    let scene = Scene::new();
    let ports = scene.mocks(None, false).into_ports();
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &Caller::anonymous()).await;

    let err = toggle_wishlist(&mut controller, &ports, &Caller::anonymous())
        .await
        .expect_err("signed out");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn providers_cannot_review_themselves() {
    let scene = Scene::new();
    let ports = scene.mocks(Some(scene.provider.clone()), false).into_ports();
    let caller = signed_in(&scene.provider);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let form = FeedbackForm {
        rating: 5,
        comment: "I am great".to_owned(),
    };
    let err = submit_feedback(&mut controller, &ports, &caller, &form)
        .await
        .expect_err("own listing");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn feedback_is_validated_before_sending() {
    let scene = Scene::new();
    let ports = scene.mocks(Some(scene.visitor.clone()), false).into_ports();
    let caller = signed_in(&scene.visitor);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let form = FeedbackForm {
        rating: 0,
        comment: "ok".to_owned(),
    };
    let err = submit_feedback(&mut controller, &ports, &caller, &form)
        .await
        .expect_err("no rating");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
        Some("rating")
    );
}

#[rstest]
#[tokio::test]
async fn feedback_success_refetches() {
    let scene = Scene::new();
    let mut mocks = scene.mocks(Some(scene.visitor.clone()), false);
    let listing_id = scene.current.id;
    mocks
        .testimonials
        .expect_insert()
        .withf(move |_, draft| {
            draft.service_id == Some(listing_id) && draft.rating.get() == 5 && draft.comment == "Thanks"
        })
        .times(1)
        .returning(|_, _| Ok(()));
    let ports = mocks.into_ports();
    let caller = signed_in(&scene.visitor);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let form = FeedbackForm {
        rating: 5,
        comment: " Thanks ".to_owned(),
    };
    submit_feedback(&mut controller, &ports, &caller, &form)
        .await
        .expect("submitted");

    assert_eq!(
        controller.feedback_phase(),
        &FormPhase::Succeeded {
            message: Some(FEEDBACK_SUBMITTED.to_owned())
        }
    );
    assert_eq!(controller.phase(), &PagePhase::Ready);
    assert_eq!(SUBMIT_FEEDBACK_POLICY, MutationPolicy::Refetch);
}

#[rstest]
#[tokio::test]
async fn feedback_saved_but_reload_failed_asks_for_refresh() {
    let scene = Scene::new();
    let mut mocks = MockPorts::default();
    let record = ListingDetailRecord {
        listing: scene.current.clone(),
        provider: None,
    };
    mocks
        .listings
        .expect_find_detail()
        .returning(move |_, _| Ok(Some(record.clone())));
    mocks
        .listings
        .expect_list_by_provider()
        .returning(|_, _| Ok(Vec::new()));
    let testimonials = vec![scene.testimonial(4)];
    let mut seq = mockall::Sequence::new();
    mocks
        .testimonials
        .expect_list_for_listing()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_, _| Ok(testimonials.clone()));
    mocks
        .testimonials
        .expect_list_for_listing()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(TestimonialRepositoryError::unavailable("timed out")));
    mocks
        .testimonials
        .expect_insert()
        .times(1)
        .returning(|_, _| Ok(()));
    mocks.wishlists.expect_find().returning(|_, _, _| Ok(None));
    mocks.confirm(Some(scene.visitor.clone()));
    let ports = mocks.into_ports();
    let caller = signed_in(&scene.visitor);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let form = FeedbackForm {
        rating: 5,
        comment: "Thanks".to_owned(),
    };
    submit_feedback(&mut controller, &ports, &caller, &form)
        .await
        .expect("insert stands");

    assert_eq!(
        controller.feedback_phase(),
        &FormPhase::Succeeded {
            message: Some(FEEDBACK_SUBMITTED_STALE.to_owned())
        }
    );
    assert!(matches!(controller.phase(), PagePhase::Error { .. }));
    let data = controller.data().expect("previous data kept");
    assert_eq!(data.testimonials.len(), 1);
}

#[rstest]
#[tokio::test]
async fn feedback_failure_shows_generic_message() {
    let scene = Scene::new();
    let mut mocks = scene.mocks(Some(scene.visitor.clone()), false);
    mocks
        .testimonials
        .expect_insert()
        .returning(|_, _| Err(TestimonialRepositoryError::rejected("violates policy")));
    let ports = mocks.into_ports();
    let caller = signed_in(&scene.visitor);
    let mut controller = ListingDetailController::new(scene.current.id);
    let _ = mount(&mut controller, &ports, &caller).await;

    let form = FeedbackForm {
        rating: 3,
        comment: "Fine".to_owned(),
    };
    let err = submit_feedback(&mut controller, &ports, &caller, &form)
        .await
        .expect_err("rejected");

    assert_eq!(err.message(), FEEDBACK_FAILED);
    assert_eq!(
        controller.feedback_phase(),
        &FormPhase::Failed {
            message: FEEDBACK_FAILED.to_owned()
        }
    );
}
