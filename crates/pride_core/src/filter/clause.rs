//! Parsed filter clauses.

use std::fmt;

/// How a clause compares a field against its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Exact, case-sensitive equality.
    Equals,
    /// Equality with any member of a set.
    In,
    /// A multi-valued field holds every member of a set.
    AllOf,
    /// Case-insensitive prefix, suffix or substring match.
    Wildcard,
}

impl Operator {
    /// The token that selects this operator in filter text, if any.
    #[must_use]
    pub const fn token(self) -> Option<&'static str> {
        match self {
            Operator::Equals => Some("="),
            Operator::In => Some("in"),
            Operator::AllOf => Some("all"),
            Operator::Wildcard => None,
        }
    }
}

/// One `field=operator=value` predicate of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// `field` equals `value`.
    Equals {
        /// Field name.
        field: String,
        /// Expected value.
        value: String,
    },
    /// `field` equals one of `values`.
    In {
        /// Field name.
        field: String,
        /// Accepted values, in input order.
        values: Vec<String>,
    },
    /// `field` contains every one of `values`.
    AllOf {
        /// Field name.
        field: String,
        /// Required values, in input order.
        values: Vec<String>,
    },
    /// `field` matches `pattern`, whose leading and trailing `*` are wildcards.
    Wildcard {
        /// Field name.
        field: String,
        /// Pattern text including its `*` markers.
        pattern: String,
    },
}

impl FilterClause {
    /// Equality clause.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Set-membership clause.
    pub fn any_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// All-of clause.
    pub fn all_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Wildcard clause.
    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// The field this clause tests.
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. }
            | Self::In { field, .. }
            | Self::AllOf { field, .. }
            | Self::Wildcard { field, .. } => field,
        }
    }

    /// The operator of this clause.
    pub fn operator(&self) -> Operator {
        match self {
            Self::Equals { .. } => Operator::Equals,
            Self::In { .. } => Operator::In,
            Self::AllOf { .. } => Operator::AllOf,
            Self::Wildcard { .. } => Operator::Wildcard,
        }
    }
}

/// Renders the clause back into filter syntax.
impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => write!(f, "{field}=={value}"),
            Self::In { field, values } => write!(f, "{field}=in={}", values.join(",")),
            Self::AllOf { field, values } => write!(f, "{field}=all={}", values.join(",")),
            Self::Wildcard { field, pattern } => write!(f, "{field}={pattern}"),
        }
    }
}
