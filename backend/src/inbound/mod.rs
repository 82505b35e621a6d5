//! Inbound adapters that translate external requests into page controller
//! calls while keeping framework details at the edge.

pub mod http;
