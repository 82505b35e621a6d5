//! Outbound adapters implementing domain ports.
//!
//! - **baas**: the hosted backend's REST, auth and storage APIs over `reqwest`
//! - **memory**: an in-memory fixture backend for local development and tests
//!
//! Adapters translate between domain types and wire rows. They hold no page
//! logic.

pub mod baas;
pub mod memory;
