//! Core types and trait definitions for the Roster contacts service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Validation and the ownership policy live here so every surface applies
//! the same rules.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures in `store`.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod policy;
pub mod store;
pub mod user;
pub mod validation;

pub use error::{Error, Result};
