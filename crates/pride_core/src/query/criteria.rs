//! Compiling filter clauses against a collection's queryable fields.

use super::predicate::{Predicate, WildcardPattern};
use crate::error::{CoreError, CoreResult};
use crate::filter::FilterClause;
use std::collections::BTreeSet;

/// The fields a collection exposes to filters.
///
/// Names are matched exactly, case included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    collection: String,
    fields: BTreeSet<String>,
}

impl FieldSet {
    /// Creates the allow-list for `collection`.
    pub fn new<I, S>(collection: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection: collection.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether `field` may be filtered on.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Allowed field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Translates [`FilterClause`]s into a [`Predicate`] for one collection.
#[derive(Debug, Clone)]
pub struct CriteriaBuilder {
    fields: FieldSet,
}

impl CriteriaBuilder {
    /// Creates a builder validating against `fields`.
    pub fn new(fields: FieldSet) -> Self {
        Self { fields }
    }

    /// The allow-list in use.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Compiles `clauses` into their conjunction.
    ///
    /// An empty clause list compiles to [`Predicate::All`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for the first clause whose field is
    /// not in the allow-list, and [`CoreError::FilterSyntax`] if a wildcard
    /// pattern cannot be compiled.
    pub fn compile(&self, clauses: &[FilterClause]) -> CoreResult<Predicate> {
        let mut predicates = Vec::with_capacity(clauses.len());
        for clause in clauses {
            predicates.push(self.compile_clause(clause)?);
        }
        Ok(Predicate::and_all(predicates))
    }

    fn compile_clause(&self, clause: &FilterClause) -> CoreResult<Predicate> {
        let field = clause.field();
        if !self.fields.contains(field) {
            return Err(CoreError::unknown_field(field, self.fields.collection()));
        }

        Ok(match clause {
            FilterClause::Equals { field, value } => Predicate::Equals {
                field: field.clone(),
                value: value.clone(),
            },
            FilterClause::In { field, values } => Predicate::In {
                field: field.clone(),
                values: values.clone(),
            },
            FilterClause::AllOf { field, values } => Predicate::AllOf {
                field: field.clone(),
                values: values.clone(),
            },
            FilterClause::Wildcard { field, pattern } => Predicate::Matches {
                field: field.clone(),
                pattern: WildcardPattern::compile(pattern)?,
            },
        })
    }
}
