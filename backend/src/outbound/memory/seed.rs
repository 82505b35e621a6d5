//! Demo accounts, listings and testimonials for the fixture backend.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{Account, Store};
use crate::domain::category::Category;
use crate::domain::ids::TestimonialId;
use crate::domain::listing::{HourlyRate, Listing, ListingId};
use crate::domain::profile::Profile;
use crate::domain::rating::Rating;
use crate::domain::testimonial::Testimonial;
use crate::domain::user::{AuthUser, UserId};

/// Password shared by every seeded account.
pub const FIXTURE_PASSWORD: &str = "husky-demo";

/// An account to register in the fixture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    /// Account id.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Sign-in password.
    pub password: String,
    /// Profile name.
    pub full_name: String,
    /// Profile bio.
    pub about_me: Option<String>,
}

impl SeedAccount {
    /// Account with the shared fixture password and no bio.
    #[must_use]
    pub fn new(id: UserId, email: &str, full_name: &str) -> Self {
        Self {
            id,
            email: email.to_owned(),
            password: FIXTURE_PASSWORD.to_owned(),
            full_name: full_name.to_owned(),
            about_me: None,
        }
    }
}

pub(super) fn insert_account(store: &mut Store, seed: &SeedAccount) -> AuthUser {
    let user = AuthUser {
        id: seed.id,
        email: seed.email.clone(),
        full_name: seed.full_name.clone(),
    };
    store.accounts.push(Account {
        user: user.clone(),
        password: seed.password.clone(),
    });
    store.profiles.insert(
        seed.id,
        Profile {
            id: seed.id,
            full_name: seed.full_name.clone(),
            email: seed.email.clone(),
            about_me: seed.about_me.clone(),
            contact_info: None,
            photo_url: None,
        },
    );
    user
}

pub(super) const HARRY: UserId = UserId::from_uuid(Uuid::from_u128(0x5eed_0001));
pub(super) const DANA: UserId = UserId::from_uuid(Uuid::from_u128(0x5eed_0002));
pub(super) const GUEST: UserId = UserId::from_uuid(Uuid::from_u128(0x5eed_0003));

struct SeedListing {
    id: u128,
    provider: UserId,
    title: &'static str,
    description: &'static str,
    category: Category,
    rate: f64,
    availability: Option<&'static str>,
}

const LISTINGS: [SeedListing; 4] = [
    SeedListing {
        id: 0x11_0001,
        provider: HARRY,
        title: "Calculus tutoring",
        description: "Math 124 through 126, exam prep and weekly problem sets.",
        category: Category::Tutoring,
        rate: 25.0,
        availability: Some("Weeknights after 6pm"),
    },
    SeedListing {
        id: 0x11_0002,
        provider: HARRY,
        title: "Laptop tune-ups",
        description: "Clean installs, malware removal and backup setup.",
        category: Category::TechSupport,
        rate: 30.0,
        availability: None,
    },
    SeedListing {
        id: 0x11_0003,
        provider: DANA,
        title: "Dorm move-in crew",
        description: "Two people and a hand truck for move-in weekend.",
        category: Category::MovingHelp,
        rate: 40.0,
        availability: Some("Weekends"),
    },
    SeedListing {
        id: 0x11_0004,
        provider: DANA,
        title: "Graduation portraits",
        description: "An hour on campus with edited photos within a week.",
        category: Category::Photography,
        rate: 55.5,
        availability: Some("Spring quarter"),
    },
];

const TESTIMONIALS: [(u128, UserId, UserId, u128, i64, &str); 3] = [
    (0x22_0001, DANA, HARRY, 0x11_0001, 5, "Patient and clear explanations."),
    (0x22_0002, GUEST, HARRY, 0x11_0001, 4, "Helped me pass the midterm."),
    (0x22_0003, HARRY, DANA, 0x11_0003, 5, "Fast and careful with my boxes."),
];

/// Fill `store` with the demo data. Returns the OAuth fixture account.
pub(super) fn populate(store: &mut Store, now: DateTime<Utc>) -> Option<UserId> {
    let accounts = [
        SeedAccount {
            about_me: Some("Math major who likes fixing laptops.".to_owned()),
            ..SeedAccount::new(HARRY, "harry@uw.edu", "Harry Husky")
        },
        SeedAccount::new(DANA, "dana@uw.edu", "Dana Dubs"),
        SeedAccount::new(GUEST, "guest@gmail.com", "Guest Visitor"),
    ];
    for account in &accounts {
        insert_account(store, account);
    }

    for (age, seed) in (0_i64..).zip(LISTINGS.iter()) {
        let Ok(hourly_rate) = HourlyRate::new(seed.rate) else {
            continue;
        };
        store.listings.push(Listing {
            id: ListingId::from_uuid(Uuid::from_u128(seed.id)),
            provider_id: seed.provider,
            title: seed.title.to_owned(),
            description: seed.description.to_owned(),
            category: seed.category,
            hourly_rate,
            availability: seed.availability.map(str::to_owned),
            created_at: now - Duration::days(age),
        });
    }

    for (age, (id, from, to, listing, stars, comment)) in (0_i64..).zip(TESTIMONIALS) {
        let Ok(rating) = Rating::new(stars) else {
            continue;
        };
        store.testimonials.push(Testimonial {
            id: TestimonialId::from_uuid(Uuid::from_u128(id)),
            rating,
            comment: comment.to_owned(),
            from_user_id: from,
            to_user_id: to,
            service_id: Some(ListingId::from_uuid(Uuid::from_u128(listing))),
            created_at: now - Duration::hours(age),
            author_name: None,
        });
    }

    accounts.first().map(|account| account.id)
}
