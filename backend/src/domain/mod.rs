//! Domain primitives, derivations and page controllers.
//!
//! Purpose: Define strongly typed marketplace entities, the pure derivations
//! the pages show (aggregation, search, ratings, fallbacks), and the page
//! view-state controllers. Nothing here knows about HTTP or the hosted
//! backend's wire format; adapters reach the backend through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - Credentials, EmailDomain, RedirectPath — sign-in inputs and policy.
//! - TraceId — request correlation identifier.

pub mod auth;
pub mod avatar;
pub mod category;
pub mod error;
pub mod fallback;
pub mod ids;
pub mod listing;
pub mod listing_view;
pub mod pages;
pub mod ports;
pub mod profile;
pub mod rating;
pub mod search;
pub mod service_request;
pub mod testimonial;
pub mod trace_id;
pub mod user;
pub mod view_state;
pub mod wishlist;

pub use self::auth::{
    Caller, CallbackOrigin, Credentials, DeployEnvironment, EmailDomain, LoginValidationError,
    RedirectPath, SignUpDetails,
};
pub use self::category::{Category, CategoryFilter};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::trace_id::TraceId;
pub use self::user::{AuthSession, AuthUser, UserId};
