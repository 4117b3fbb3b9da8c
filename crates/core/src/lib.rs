//! Reseller Portal Core - Shared types library.
//!
//! This crate provides common types used across all portal components:
//! - `portal` - The public-facing portal server
//! - `integration-tests` - Router-level test suite
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   role/plan/payment-status enums that gate portal access

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
