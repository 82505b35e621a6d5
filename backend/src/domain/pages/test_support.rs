//! Mock port bundle for page controller tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::domain::auth::Caller;
use crate::domain::category::Category;
use crate::domain::ids::{ListingId, UserId};
use crate::domain::listing::{HourlyRate, Listing};
use crate::domain::ports::{
    BackendPorts, MockAuthGateway, MockAvatarStorage, MockListingRepository,
    MockProfileRepository, MockServiceRequestRepository, MockTestimonialRepository,
    MockWishlistRepository,
};
use crate::domain::user::{AccessToken, AuthSession, AuthUser};

/// One mock per port. Unset expectations panic when called.
#[derive(Default)]
pub(crate) struct MockPorts {
    pub auth: MockAuthGateway,
    pub profiles: MockProfileRepository,
    pub listings: MockListingRepository,
    pub requests: MockServiceRequestRepository,
    pub wishlists: MockWishlistRepository,
    pub testimonials: MockTestimonialRepository,
    pub storage: MockAvatarStorage,
}

impl MockPorts {
    pub(crate) fn into_ports(self) -> BackendPorts {
        BackendPorts {
            auth: Arc::new(self.auth),
            profiles: Arc::new(self.profiles),
            listings: Arc::new(self.listings),
            requests: Arc::new(self.requests),
            wishlists: Arc::new(self.wishlists),
            testimonials: Arc::new(self.testimonials),
            storage: Arc::new(self.storage),
        }
    }

    /// Make the auth mock confirm `user` for any token.
    pub(crate) fn confirm(&mut self, user: Option<AuthUser>) {
        self.auth
            .expect_current_user()
            .returning(move |_| Ok(user.clone()));
    }
}

pub(crate) fn user(name: &str) -> AuthUser {
    AuthUser {
        id: UserId::random(),
        email: format!("{}@uw.edu", name.to_lowercase()),
        full_name: name.to_owned(),
    }
}

pub(crate) fn signed_in(user: &AuthUser) -> Caller {
    Caller::authenticated(AuthSession {
        user: user.clone(),
        access_token: AccessToken::new(format!("token-{}", user.id)),
        refresh_token: None,
    })
}

pub(crate) fn listing(provider_id: UserId, title: &str, category: Category) -> Listing {
    Listing {
        id: ListingId::random(),
        provider_id,
        title: title.to_owned(),
        description: format!("{title} description"),
        category,
        hourly_rate: HourlyRate::new(15.0).expect("valid rate"),
        availability: None,
        created_at: Utc
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}
