//! Ecom Core - Shared domain types for the admin backend.
//!
//! This crate provides the types shared by the `admin` server, the `cli`
//! tooling, and the integration tests:
//! - Products and their create/update inputs
//! - Typed identifiers
//! - Prices and email addresses
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Database encoding is opt-in through the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and the product document

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
