//! Shoplist Core - Shared domain types.
//!
//! This crate provides the validated types used across all Shoplist components:
//! - `server` - HTTP API for accounts, shopping lists, items and analytics
//! - `cli` - Command-line tools for migrations and account maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no database
//! access, no HTTP. Everything that reaches the storage layer has already passed
//! through one of these constructors.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, public identifiers, emails, names, quantities and
//!   analytics bucket granularity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
