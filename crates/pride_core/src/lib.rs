//! # PRIDE Core
//!
//! Data-access layer of the PRIDE proteomics archive.
//!
//! This crate provides:
//! - Accession minting from atomic sequence counters (`PXF00000000001`,
//!   `PXDA000001`)
//! - The filter mini-language (`field=operator=value,...`) and its
//!   compilation against per-collection field allow-lists
//! - Paged queries returning items plus a total count
//! - An embedded, log-backed document store
//! - Typed repositories and services for files, analyses, proteins,
//!   peptides and PSMs
//!
//! ## Key Invariants
//!
//! - A sequence value is handed out at most once, across threads and
//!   processes sharing a store
//! - An accession, once assigned, is never overwritten
//! - Filter clauses are ANDed; an unknown field is an error, never ignored
//!
//! ## Example
//!
//! ```rust
//! use pride_core::model::ArchiveFile;
//! use pride_core::service::FileService;
//! use pride_core::store::Database;
//! use pride_core::{Config, PageRequest};
//! use std::sync::Arc;
//!
//! let store = Arc::new(Database::open_in_memory().unwrap());
//! let files = FileService::new(store, &Config::default());
//!
//! let mut file = ArchiveFile::new("run1.raw").with_projects(["PXD000001"]);
//! assert_eq!(files.insert(&mut file).unwrap(), "PXF00000000001");
//!
//! let page = files
//!     .search_files("projectAccessions=all=PXD000001", &PageRequest::first(10).unwrap())
//!     .unwrap();
//! assert_eq!(page.total_elements, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod accession;
mod config;
pub mod document;
mod error;
pub mod filter;
pub mod model;
mod page;
pub mod query;
pub mod repository;
pub mod sequence;
pub mod service;
pub mod store;
mod types;

pub use accession::{
    AccessionFactory, AccessionFormat, Accessioned, ANALYSIS_ACCESSION, FILE_ACCESSION,
};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use page::{Page, PageRequest, PaginatedQueryExecutor};
pub use sequence::SequenceAllocator;
pub use types::DocumentId;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
