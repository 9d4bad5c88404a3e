//! Filter text to clause list.

use crate::error::{CoreError, CoreResult};
use crate::filter::clause::FilterClause;

/// Parses a filter string into clauses, preserving input order.
///
/// Empty segments between commas are ignored. A segment without `=` extends
/// the value of the clause before it, which is how `in` and `all` lists are
/// written.
///
/// # Errors
///
/// Returns [`CoreError::FilterSyntax`] naming the offending clause when a
/// clause lacks a field or value, uses an unknown operator token, or a list
/// element appears before any clause.
///
/// # Example
///
/// ```rust
/// use pride_core::filter::{parse_filter, FilterClause};
///
/// let clauses = parse_filter("projectAccessions=all=PXD1,PXD2,status==approved").unwrap();
/// assert_eq!(
///     clauses,
///     vec![
///         FilterClause::all_of("projectAccessions", ["PXD1", "PXD2"]),
///         FilterClause::equals("status", "approved"),
///     ]
/// );
/// ```
pub fn parse_filter(input: &str) -> CoreResult<Vec<FilterClause>> {
    let mut texts: Vec<String> = Vec::new();

    for segment in input.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if segment.contains('=') {
            texts.push(segment.to_string());
            continue;
        }
        match texts.last_mut() {
            Some(text) => {
                text.push(',');
                text.push_str(segment);
            }
            None => {
                return Err(CoreError::filter_syntax(
                    segment,
                    "expected field=value before list element",
                ))
            }
        }
    }

    texts.iter().map(|text| parse_clause(text)).collect()
}

enum Token {
    Equals,
    In,
    AllOf,
}

fn parse_clause(text: &str) -> CoreResult<FilterClause> {
    let (field, rest) = text
        .split_once('=')
        .ok_or_else(|| CoreError::filter_syntax(text, "expected field=value"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(CoreError::filter_syntax(text, "missing field name"));
    }

    let (token, value) = if let Some(value) = rest.strip_prefix('=') {
        (Token::Equals, value)
    } else if let Some((token, value)) = rest.split_once('=') {
        match token.trim() {
            "in" => (Token::In, value),
            "all" => (Token::AllOf, value),
            other => {
                return Err(CoreError::filter_syntax(
                    text,
                    format!("unknown operator token '{other}'"),
                ))
            }
        }
    } else {
        (Token::Equals, rest)
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::filter_syntax(text, "missing value"));
    }

    if value.starts_with('*') || value.ends_with('*') {
        return Ok(FilterClause::wildcard(field, value));
    }

    match token {
        Token::Equals if value.contains(',') => Err(CoreError::filter_syntax(
            text,
            "several values need the 'in' or 'all' operator",
        )),
        Token::Equals => Ok(FilterClause::equals(field, value)),
        Token::In => Ok(FilterClause::any_of(field, split_list(text, value)?)),
        Token::AllOf => Ok(FilterClause::all_of(field, split_list(text, value)?)),
    }
}

fn split_list(text: &str, value: &str) -> CoreResult<Vec<String>> {
    let values: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(CoreError::filter_syntax(text, "empty value list"));
    }
    Ok(values)
}
