//! # PRIDE Testkit
//!
//! Test utilities for the PRIDE archive data-access layer.
//!
//! This crate provides:
//! - Archive fixtures over in-memory and on-disk stores
//! - Canned data sets (PSMs, proteins, file pages)
//! - Property-based generators for filter strings
//! - Cross-module integration checks
//! - Concurrency stress helpers for sequences and inserts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pride_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_archive() {
//!     with_temp_archive(|archive| {
//!         let files = archive.files();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
