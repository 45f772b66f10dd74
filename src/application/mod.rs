//! Application layer - use-case handlers wiring the domain to the ports.

pub mod handlers;
