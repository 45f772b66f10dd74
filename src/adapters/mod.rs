//! Adapters - concrete implementations of the ports plus the HTTP surface.

pub mod extraction;
pub mod http;
pub mod persistence;
pub mod semantic;
pub mod session;
