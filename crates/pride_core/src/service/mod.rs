//! Archive services.
//!
//! Each service is built from an injected [`crate::store::SharedStore`] and
//! owns the repositories it needs.

mod analyses;
mod files;
mod molecules;
mod psms;

pub use analyses::AnalysisService;
pub use files::{BatchItem, FileService};
pub use molecules::{MoleculesService, PeptideQuery};
pub use psms::PsmService;
