//! Property-based test generators using proptest.
//!
//! Provides strategies for generating filter clauses together with
//! their textual form, and paging shapes.

use pride_core::filter::FilterClause;
use proptest::prelude::*;

/// Strategy for generating valid field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z]{0,15}").expect("Invalid regex")
}

/// Strategy for generating plain filter values.
///
/// Values never contain `=`, `,` or `*`, and never start with a space.
pub fn filter_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9:_.-]{0,11}").expect("Invalid regex")
}

/// Strategy for generating one clause and the text that expresses it.
pub fn clause_strategy() -> impl Strategy<Value = (FilterClause, String)> {
    let values = || prop::collection::vec(filter_value_strategy(), 1..4);
    prop_oneof![
        (field_name_strategy(), filter_value_strategy(), any::<bool>()).prop_map(
            |(field, value, double)| {
                let text = if double {
                    format!("{field}=={value}")
                } else {
                    format!("{field}={value}")
                };
                (FilterClause::equals(field, value), text)
            }
        ),
        (field_name_strategy(), values()).prop_map(|(field, values)| {
            let text = format!("{field}=in={}", values.join(","));
            (FilterClause::any_of(field, values), text)
        }),
        (field_name_strategy(), values()).prop_map(|(field, values)| {
            let text = format!("{field}=all={}", values.join(","));
            (FilterClause::all_of(field, values), text)
        }),
        (field_name_strategy(), filter_value_strategy(), any::<bool>()).prop_map(
            |(field, value, leading)| {
                let pattern = if leading {
                    format!("*{value}")
                } else {
                    format!("{value}*")
                };
                let text = format!("{field}={pattern}");
                (FilterClause::wildcard(field, pattern), text)
            }
        ),
    ]
}

/// Strategy for generating a whole filter and the clauses it parses to.
pub fn filter_strategy() -> impl Strategy<Value = (Vec<FilterClause>, String)> {
    prop::collection::vec(clause_strategy(), 1..6).prop_map(|pairs| {
        let text = pairs
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let clauses = pairs.into_iter().map(|(clause, _)| clause).collect();
        (clauses, text)
    })
}

/// Strategy for generating a collection size and a page size.
pub fn page_split_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0u64..60, 1u64..15)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
