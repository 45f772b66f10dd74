//! Coverbot - Conversational intake engine for insurance onboarding and claims.
//!
//! This crate implements a dialog state machine that walks users through
//! question flows (medical, motor, claim), validates answers per slot,
//! splices follow-up questions at runtime, and merges OCR-extracted document
//! fields into the collected responses.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
