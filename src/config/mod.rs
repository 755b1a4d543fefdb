//! # Result Engine Configuration
//!
//! Compile-time defaults live in [`constants`]. Runtime settings are never
//! global: they are collected by [`ResultBuilder`](crate::ResultBuilder) and
//! threaded into each row store as a [`StoreConfig`](crate::result::StoreConfig).
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
