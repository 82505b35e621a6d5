//! Reqwest adapters for the hosted backend-as-a-service.
//!
//! One [`BaasClient`] is shared by every adapter. The adapters own transport
//! details only: URLs, select expressions, headers and JSON decoding.

mod auth;
pub(crate) mod client;
mod dto;
mod listings;
mod profiles;
mod requests;
mod storage;
mod testimonials;
mod wishlists;

use std::sync::Arc;

pub use auth::BaasAuthGateway;
pub use client::BaasClient;
pub use listings::BaasListingRepository;
pub use profiles::BaasProfileRepository;
pub use requests::BaasServiceRequestRepository;
pub use storage::BaasAvatarStorage;
pub use testimonials::BaasTestimonialRepository;
pub use wishlists::BaasWishlistRepository;

use crate::domain::ports::{AuthStateChannel, BackendPorts};

/// Wire every port to the hosted backend behind `client`.
#[must_use]
pub fn backend_ports(client: &BaasClient, events: AuthStateChannel) -> BackendPorts {
    BackendPorts {
        auth: Arc::new(BaasAuthGateway::with_channel(client.clone(), events)),
        profiles: Arc::new(BaasProfileRepository::new(client.clone())),
        listings: Arc::new(BaasListingRepository::new(client.clone())),
        requests: Arc::new(BaasServiceRequestRepository::new(client.clone())),
        wishlists: Arc::new(BaasWishlistRepository::new(client.clone())),
        testimonials: Arc::new(BaasTestimonialRepository::new(client.clone())),
        storage: Arc::new(BaasAvatarStorage::new(client.clone())),
    }
}
