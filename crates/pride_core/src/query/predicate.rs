//! Predicate trees and document matching.

use crate::document::{Document, Value};
use crate::error::{CoreError, CoreResult};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

/// A store-executable test over one document.
///
/// Matching is textual: text compares as is, integers by their decimal
/// rendering and booleans as `true`/`false`. Missing and null fields never
/// match. Against a multi-valued field, `Equals`, `In` and `Matches` hold if
/// any element matches, and `AllOf` requires every listed value to be an
/// element.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document.
    All,
    /// Every inner predicate holds.
    And(Vec<Predicate>),
    /// Field equals the value, case-sensitively.
    Equals {
        /// Field name.
        field: String,
        /// Expected value.
        value: String,
    },
    /// Field equals one of the values.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// Field holds every one of the values.
    AllOf {
        /// Field name.
        field: String,
        /// Required values.
        values: Vec<String>,
    },
    /// Field matches a wildcard pattern, case-insensitively.
    Matches {
        /// Field name.
        field: String,
        /// The compiled pattern.
        pattern: WildcardPattern,
    },
}

impl Predicate {
    /// Equality predicate.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Membership predicate.
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

    /// Conjunction of `predicates`, flattened.
    ///
    /// No predicates gives [`Predicate::All`]; a single one is returned as is.
    pub fn and_all(predicates: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            match predicate {
                Predicate::All => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    /// Returns this predicate ANDed with `other`.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::and_all(vec![self, other])
    }

    /// Tests `document` against this predicate.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(inner) => inner.iter().all(|p| p.matches(document)),
            Predicate::Equals { field, value } => {
                field_texts(document, field).iter().any(|text| text == value)
            }
            Predicate::In { field, values } => field_texts(document, field)
                .iter()
                .any(|text| values.iter().any(|v| v == text)),
            Predicate::AllOf { field, values } => {
                let texts = field_texts(document, field);
                !values.is_empty() && values.iter().all(|v| texts.iter().any(|t| t == v))
            }
            Predicate::Matches { field, pattern } => field_texts(document, field)
                .iter()
                .any(|text| pattern.is_match(text)),
        }
    }
}

fn field_texts<'a>(document: &'a Document, field: &str) -> Vec<Cow<'a, str>> {
    match document.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::match_text).collect(),
        Some(value) => value.match_text().into_iter().collect(),
        None => Vec::new(),
    }
}

/// Where a wildcard pattern anchors its literal part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `abc*`
    Prefix,
    /// `*abc`
    Suffix,
    /// `*abc*`
    Contains,
    /// `*`: any present value.
    Any,
}

/// A compiled `*`-pattern.
///
/// Only stars at the edges are wildcards; stars inside the literal part
/// match a literal `*`. Matching ignores case.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    raw: String,
    literal: String,
    kind: MatchKind,
    regex: Regex,
}

impl WildcardPattern {
    /// Compiles `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FilterSyntax`] if `raw` has no leading or trailing
    /// `*`, or the pattern cannot be compiled.
    pub fn compile(raw: &str) -> CoreResult<Self> {
        let leading = raw.starts_with('*');
        let trailing = raw.ends_with('*');
        let literal = raw.trim_matches('*');

        let kind = match (leading, trailing) {
            _ if literal.is_empty() => MatchKind::Any,
            (true, true) => MatchKind::Contains,
            (false, true) => MatchKind::Prefix,
            (true, false) => MatchKind::Suffix,
            (false, false) => {
                return Err(CoreError::filter_syntax(
                    raw,
                    "wildcard pattern needs a leading or trailing '*'",
                ))
            }
        };

        let source = format!(
            "{}{}{}",
            if leading { "" } else { "^" },
            regex::escape(literal),
            if trailing { "" } else { "$" }
        );
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| CoreError::filter_syntax(raw, e.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            literal: literal.to_string(),
            kind,
            regex,
        })
    }

    /// Tests `text` against the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern as written, stars included.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The literal part between the edge stars.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Where the literal part is anchored.
    pub fn kind(&self) -> MatchKind {
        self.kind
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
