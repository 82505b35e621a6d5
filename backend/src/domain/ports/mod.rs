//! Domain ports for the hexagonal boundary.
//!
//! Driven ports describe the hosted backend: its auth service, its tables and
//! its object storage. Adapters live under `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod avatar_storage;
mod listing_repository;
mod profile_repository;
mod service_request_repository;
mod testimonial_repository;
mod wishlist_repository;

use std::sync::Arc;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{
    AuthEvent, AuthGateway, AuthGatewayError, AuthStateChannel, SignUpOutcome,
};
#[cfg(test)]
pub use avatar_storage::MockAvatarStorage;
pub use avatar_storage::{AvatarStorage, AvatarStorageError, StoredObject};
#[cfg(test)]
pub use listing_repository::MockListingRepository;
pub use listing_repository::{ListingDetailRecord, ListingRepository, ListingRepositoryError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use service_request_repository::MockServiceRequestRepository;
pub use service_request_repository::{ServiceRequestRepository, ServiceRequestRepositoryError};
#[cfg(test)]
pub use testimonial_repository::MockTestimonialRepository;
pub use testimonial_repository::{TestimonialRepository, TestimonialRepositoryError};
#[cfg(test)]
pub use wishlist_repository::MockWishlistRepository;
pub use wishlist_repository::{WishlistRepository, WishlistRepositoryError};

/// Every driven port the pages need, shared across requests.
#[derive(Clone)]
pub struct BackendPorts {
    /// Hosted auth service.
    pub auth: Arc<dyn AuthGateway>,
    /// `profiles` table.
    pub profiles: Arc<dyn ProfileRepository>,
    /// `services` table.
    pub listings: Arc<dyn ListingRepository>,
    /// `service_requests` table.
    pub requests: Arc<dyn ServiceRequestRepository>,
    /// `wishlists` table.
    pub wishlists: Arc<dyn WishlistRepository>,
    /// `testimonials` table.
    pub testimonials: Arc<dyn TestimonialRepository>,
    /// Object storage.
    pub storage: Arc<dyn AvatarStorage>,
}

impl std::fmt::Debug for BackendPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendPorts").finish_non_exhaustive()
    }
}
