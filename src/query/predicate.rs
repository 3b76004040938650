//! Selection predicates with bound arguments.
//!
//! # Responsibilities
//! - Hold predicate text and argument values as separate parts
//! - Count positional `?` placeholders
//! - Reject text that is not self-contained (unbalanced parentheses,
//!   open quotes, comments, `;`)
//! - Combine predicates with `AND`
//!
//! # Design Decisions
//! - Values never enter the predicate text; they are always bound
//! - `?` inside quoted literals or identifiers is not a placeholder
//! - A non-empty left side is parenthesised before combining; together with
//!   the balance check, caller `OR` clauses cannot escape the conjunction

use serde::{Deserialize, Serialize};

use crate::query::value::Value;

/// A filter expression plus the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    text: String,
    args: Vec<Value>,
}

impl Predicate {
    /// A predicate with no filter.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(text: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            args,
        }
    }

    /// Equality on a single column, value bound as an argument.
    pub fn column_equals(column: &str, value: impl Into<Value>) -> Self {
        Self::new(format!("{} = ?", column), vec![value.into()])
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// True when there is no filter text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Check the text is self-contained and every placeholder has exactly
    /// one argument.
    ///
    /// Self-contained means balanced parentheses, closed quotes, and no
    /// comments or statement separators, so wrapping the text in
    /// parentheses keeps all of it inside them.
    pub fn validate(&self) -> Result<(), String> {
        let shape = scan(&self.text);
        if let Some(problem) = shape.problem {
            return Err(format!("predicate {:?} {}", self.text, problem));
        }
        if shape.placeholders != self.args.len() {
            return Err(format!(
                "predicate {:?} has {} placeholder(s) but {} argument(s)",
                self.text,
                shape.placeholders,
                self.args.len()
            ));
        }
        Ok(())
    }

    /// Conjunction of `self` and `other`. An empty side is dropped.
    ///
    /// Both sides must already pass [`Predicate::validate`].
    pub fn and(self, other: Predicate) -> Predicate {
        if self.is_empty() {
            return Predicate {
                text: other.text,
                args: join_args(self.args, other.args),
            };
        }
        if other.is_empty() {
            return Predicate {
                text: self.text,
                args: join_args(self.args, other.args),
            };
        }

        Predicate {
            text: format!("({}) AND {}", self.text.trim(), other.text),
            args: join_args(self.args, other.args),
        }
    }
}

fn join_args(mut left: Vec<Value>, right: Vec<Value>) -> Vec<Value> {
    left.extend(right);
    left
}

/// Outcome of one pass over predicate text.
#[derive(Debug, Default, PartialEq, Eq)]
struct Shape {
    placeholders: usize,
    problem: Option<&'static str>,
}

/// Count `?` placeholders and find the first structural problem, ignoring
/// anything inside quoted regions.
fn scan(text: &str) -> Shape {
    let mut shape = Shape::default();
    let mut quote: Option<char> = None;
    let mut depth: usize = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            // Doubled quotes close and reopen, so they balance out.
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '[' => quote = Some(']'),
            '?' => shape.placeholders += 1,
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => flag(&mut shape, "closes a parenthesis it never opened"),
            },
            ';' => flag(&mut shape, "contains a statement separator"),
            '-' if chars.peek() == Some(&'-') => flag(&mut shape, "contains a comment"),
            '/' if chars.peek() == Some(&'*') => flag(&mut shape, "contains a comment"),
            _ => {}
        }
    }

    if quote.is_some() {
        flag(&mut shape, "has an unterminated quote");
    }
    if depth > 0 {
        flag(&mut shape, "leaves a parenthesis open");
    }
    shape
}

fn flag(shape: &mut Shape, problem: &'static str) {
    shape.problem.get_or_insert(problem);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_count() {
        assert_eq!(scan("").placeholders, 0);
        assert_eq!(scan("a = ? AND b = ?").placeholders, 2);
        assert_eq!(scan("title = 'who?'").placeholders, 0);
        assert_eq!(scan("\"odd?col\" = ?").placeholders, 1);
        assert_eq!(scan("[x?] = ? OR y = ?").placeholders, 2);
        assert_eq!(scan("t = 'it''s?' AND a = ?").placeholders, 1);
    }

    #[test]
    fn test_validate_arity() {
        assert!(Predicate::new("a = ?", vec![Value::Integer(1)]).validate().is_ok());
        assert!(Predicate::new("a = ?", vec![]).validate().is_err());
        assert!(Predicate::new("", vec![Value::Integer(1)]).validate().is_err());
        assert!(Predicate::empty().validate().is_ok());
    }

    #[test]
    fn test_validate_parentheses() {
        assert!(Predicate::new("(a = 1 OR b = 2) AND (c = 3)", vec![]).validate().is_ok());
        assert!(Predicate::new("title = ')('", vec![]).validate().is_ok());
        assert!(Predicate::new("[odd)col] = 1", vec![]).validate().is_ok());

        let err = Predicate::new("1=1) OR (1", vec![]).validate().unwrap_err();
        assert!(err.contains("never opened"), "{err}");
        let err = Predicate::new("(a = 1", vec![]).validate().unwrap_err();
        assert!(err.contains("parenthesis open"), "{err}");
        assert!(Predicate::new("a = 1))((", vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_quotes_comments_and_separators() {
        assert!(Predicate::new("title = 'open", vec![]).validate().is_err());
        assert!(Predicate::new("a = 1 -- rest", vec![]).validate().is_err());
        assert!(Predicate::new("a = 1 /* rest", vec![]).validate().is_err());
        assert!(Predicate::new("a = 1; DROP TABLE books", vec![]).validate().is_err());
        assert!(Predicate::new("a = 1 - -1", vec![]).validate().is_ok());
        assert!(Predicate::new("title = 'a--b; /*'", vec![]).validate().is_ok());
    }

    #[test]
    fn test_and_with_empty_left() {
        let combined = Predicate::empty().and(Predicate::column_equals("id", 7i64));
        assert_eq!(combined.text(), "id = ?");
        assert_eq!(combined.args(), [Value::Integer(7)]);
    }

    #[test]
    fn test_and_with_whitespace_left() {
        let combined = Predicate::new("   ", vec![]).and(Predicate::column_equals("id", 7i64));
        assert_eq!(combined.text(), "id = ?");
    }

    #[test]
    fn test_and_parenthesises_left() {
        let caller = Predicate::new(
            "genre = ? OR genre = ?",
            vec![Value::from("sf"), Value::from("fantasy")],
        );
        let combined = caller.and(Predicate::column_equals("_id", 3i64));
        assert_eq!(combined.text(), "(genre = ? OR genre = ?) AND _id = ?");
        assert_eq!(
            combined.args(),
            [Value::from("sf"), Value::from("fantasy"), Value::Integer(3)]
        );
        assert!(combined.validate().is_ok());
    }

    #[test]
    fn test_value_never_spliced_into_text() {
        let combined = Predicate::empty().and(Predicate::column_equals("id", 7i64));
        assert!(!combined.text().contains('7'));
    }
}
