//! Compiled queries.
//!
//! [`CriteriaBuilder`] turns parsed [`crate::filter::FilterClause`]s into a
//! [`Predicate`] tree, checking every field against the collection's
//! [`FieldSet`]. A [`Predicate`] is what a [`crate::store::DocumentStore`]
//! executes.

mod criteria;
mod predicate;

pub use criteria::{CriteriaBuilder, FieldSet};
pub use predicate::{MatchKind, Predicate, WildcardPattern};
