//! The filter mini-language accepted by search operations.
//!
//! A filter is a comma-separated list of clauses, all of which must hold:
//!
//! ```text
//! filter   := clause (',' clause)*
//! clause   := field '=' [token '='] value
//! token    := '=' | 'in' | 'all'
//! ```
//!
//! `field=value` and `field==value` test equality, `field=in=a,b` tests
//! membership in a set, `field=all=a,b` requires a multi-valued field to hold
//! every listed value, and a value with a leading or trailing `*` is a
//! case-insensitive wildcard whatever token precedes it.
//!
//! Commas separate both clauses and list elements, so values containing a
//! literal comma cannot be expressed.

mod clause;
mod parser;

pub use clause::{FilterClause, Operator};
pub use parser::parse_filter;
