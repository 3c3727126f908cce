//! Guard collaborators: evaluation and free-variable extraction.
//!
//! The expression language lives outside this crate. The machine only needs
//! two things from it: a boolean verdict for a guard (which also drives the
//! guard's relation list) and the set of names a guard refers to.

use crate::core::RelationList;
use std::collections::BTreeSet;
use thiserror::Error;

/// Failure of the host evaluator on one guard.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Cannot evaluate guard '{guard}': {message}")]
pub struct GuardError {
    pub guard: String,
    pub message: String,
}

impl GuardError {
    pub fn new(guard: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            guard: guard.into(),
            message: message.into(),
        }
    }
}

/// Guard text that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Evaluates guards for the machine.
///
/// Implementations must report every relational sub-expression of the guard
/// through [`RelationList::set_relation`], using the same index for the same
/// sub-expression on every call. Indices are dense and first reported in
/// increasing order from 0; a relation reported past the end of the list is
/// dropped. Speculative evaluations are fine; nothing is committed here.
pub trait GuardEvaluator {
    fn evaluate(&mut self, guard: &str, relations: &mut RelationList) -> Result<bool, GuardError>;
}

impl<F> GuardEvaluator for F
where
    F: FnMut(&str, &mut RelationList) -> Result<bool, GuardError>,
{
    fn evaluate(&mut self, guard: &str, relations: &mut RelationList) -> Result<bool, GuardError> {
        self(guard, relations)
    }
}

/// Extracts the names a guard refers to.
pub trait GuardParser {
    fn free_variables(&self, guard: &str) -> Result<BTreeSet<String>, ParseError>;
}

/// Lightweight free-variable scanner for C-like guard expressions.
///
/// Collects identifiers, skipping numeric and string literals, names used as
/// functions or fields, and the literals `true` and `false`. Unbalanced
/// brackets and unterminated strings are parse errors.
///
/// # Example
///
/// ```rust
/// use fsm_causality::machine::{GuardParser, IdentifierCollector};
///
/// let names = IdentifierCollector.free_variables("abs(x - 1.5e3) > limit && go_isPresent").unwrap();
/// let names: Vec<_> = names.iter().map(String::as_str).collect();
/// assert_eq!(names, vec!["go_isPresent", "limit", "x"]);
///
/// assert!(IdentifierCollector.free_variables("(x > 1").is_err());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentifierCollector;

impl GuardParser for IdentifierCollector {
    fn free_variables(&self, guard: &str) -> Result<BTreeSet<String>, ParseError> {
        let chars: Vec<(usize, char)> = guard.char_indices().collect();
        let mut names = BTreeSet::new();
        let mut brackets: Vec<(char, usize)> = Vec::new();
        let mut previous_significant: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let (offset, c) = chars[i];

            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if c == '"' || c == '\'' {
                i = skip_string(&chars, i)?;
                previous_significant = Some(c);
                continue;
            }

            let starts_number = c.is_ascii_digit()
                || (c == '.' && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit()));
            if starts_number {
                i = skip_number(&chars, i);
                previous_significant = Some('0');
                continue;
            }

            if is_identifier_start(c) {
                let start = i;
                while i < chars.len() && is_identifier_part(chars[i].1) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|(_, ch)| *ch).collect();
                let next = chars[i..].iter().map(|(_, ch)| *ch).find(|ch| !ch.is_whitespace());

                let is_call = next == Some('(');
                let is_member = previous_significant == Some('.');
                let is_literal = name == "true" || name == "false";
                if !(is_call || is_member || is_literal) {
                    names.insert(name);
                }
                previous_significant = Some('a');
                continue;
            }

            match c {
                '(' | '[' | '{' => brackets.push((c, offset)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => return Err(ParseError::new(format!("Unexpected '{c}'"), offset)),
                    }
                }
                _ => {}
            }
            previous_significant = Some(c);
            i += 1;
        }

        if let Some((open, offset)) = brackets.pop() {
            return Err(ParseError::new(format!("Unclosed '{open}'"), offset));
        }

        Ok(names)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Returns the index just past the closing quote.
fn skip_string(chars: &[(usize, char)], start: usize) -> Result<usize, ParseError> {
    let (offset, quote) = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(ParseError::new("Unterminated string literal", offset))
}

/// Returns the index just past the numeric literal, including any exponent
/// and type suffix.
fn skip_number(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i].1;
        if (c == 'e' || c == 'E')
            && chars
                .get(i + 1)
                .is_some_and(|(_, n)| *n == '+' || *n == '-')
        {
            i += 2;
        } else if c.is_alphanumeric() || c == '.' || c == '_' {
            i += 1;
        } else {
            break;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(guard: &str) -> Vec<String> {
        IdentifierCollector
            .free_variables(guard)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn empty_guard_has_no_names() {
        assert!(names("").is_empty());
        assert!(names("   ").is_empty());
    }

    #[test]
    fn collects_relational_operands() {
        assert_eq!(names("x > 0"), vec!["x"]);
        assert_eq!(names("a + b >= 10 || c == 2"), vec!["a", "b", "c"]);
    }

    #[test]
    fn skips_literals_calls_and_members() {
        assert_eq!(names("true && flag"), vec!["flag"]);
        assert_eq!(names("sin(t) < 1e-3 && r.x > 2"), vec!["r", "t"]);
        assert_eq!(names("mode == \"run x\""), vec!["mode"]);
        assert_eq!(names("count > 10ub"), vec!["count"]);
    }

    #[test]
    fn reports_unbalanced_brackets() {
        let err = IdentifierCollector.free_variables("(x > 1").unwrap_err();
        assert_eq!(err.offset, 0);

        let err = IdentifierCollector.free_variables("x > 1)").unwrap_err();
        assert_eq!(err.offset, 5);

        assert!(IdentifierCollector.free_variables("a[(1]").is_err());
    }

    #[test]
    fn reports_unterminated_string() {
        let err = IdentifierCollector.free_variables("s == \"open").unwrap_err();
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn closure_evaluator_drives_relations() {
        let mut evaluator = |guard: &str, relations: &mut RelationList| {
            relations.set_relation(0, crate::core::RelationType::GreaterThan, 1.0);
            Ok::<_, GuardError>(!guard.is_empty())
        };
        let mut relations = RelationList::new();

        assert!(evaluator.evaluate("x > 0", &mut relations).unwrap());
        assert_eq!(relations.len(), 1);
    }
}
