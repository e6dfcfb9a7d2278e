//! Content expressions: the grammar describing which children a node accepts.
//!
//! ```text
//! expr  := term*
//! term  := atom quant?
//! atom  := name | "(" name ("|" name)* ")"
//! quant := "*" | "+" | "?"
//! ```
//!
//! A name matches a child whose type or group has that name.

use smol_str::SmolStr;

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    fn bounds(self) -> (usize, usize) {
        match self {
            Quantifier::One => (1, 1),
            Quantifier::ZeroOrOne => (0, 1),
            Quantifier::ZeroOrMore => (0, usize::MAX),
            Quantifier::OneOrMore => (1, usize::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    names: Vec<SmolStr>,
    quantifier: Quantifier,
}

/// A parsed content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    source: SmolStr,
    terms: Vec<Term>,
}

impl ContentExpr {
    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let err = |reason: &str| SchemaError::InvalidContentExpression {
            expr: source.to_owned(),
            reason: reason.to_owned(),
        };

        let mut terms = Vec::new();
        let mut chars = source.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let Some(&c) = chars.peek() else { break };

            let names = if c == '(' {
                chars.next();
                let mut names = Vec::new();
                loop {
                    while chars.next_if(|c| c.is_whitespace()).is_some() {}
                    let name = take_name(&mut chars);
                    if name.is_empty() {
                        return Err(err("expected a name inside group"));
                    }
                    names.push(name);
                    while chars.next_if(|c| c.is_whitespace()).is_some() {}
                    match chars.next() {
                        Some('|') => continue,
                        Some(')') => break,
                        _ => return Err(err("unclosed group")),
                    }
                }
                names
            } else {
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(err(&format!("unexpected character {c:?}")));
                }
                vec![name]
            };

            let quantifier = match chars.peek() {
                Some('*') => Quantifier::ZeroOrMore,
                Some('+') => Quantifier::OneOrMore,
                Some('?') => Quantifier::ZeroOrOne,
                _ => Quantifier::One,
            };
            if quantifier != Quantifier::One {
                chars.next();
            }
            terms.push(Term { names, quantifier });
        }

        Ok(Self {
            source: SmolStr::new(source),
            terms,
        })
    }

    /// The expression text as registered.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True for leaf nodes, which accept no children at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All names referenced by the expression.
    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.terms.iter().flat_map(|t| t.names.iter())
    }

    /// Check a sequence of children, each given as `(type name, group)`.
    pub fn matches<'a, I>(&self, children: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let children: Vec<_> = children.into_iter().collect();
        self.match_from(0, 0, &children)
    }

    fn match_from(&self, term_idx: usize, child_idx: usize, children: &[(&str, Option<&str>)]) -> bool {
        let Some(term) = self.terms.get(term_idx) else {
            return child_idx == children.len();
        };
        let (min, max) = term.quantifier.bounds();

        let available = children[child_idx..]
            .iter()
            .take_while(|&&(name, group)| {
                term.names
                    .iter()
                    .any(|n| n.as_str() == name || group.is_some_and(|g| n.as_str() == g))
            })
            .count()
            .min(max);

        if available < min {
            return false;
        }
        (min..=available)
            .rev()
            .any(|taken| self.match_from(term_idx + 1, child_idx + taken, children))
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> SmolStr {
    let mut name = String::new();
    while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_' || *c == '-') {
        name.push(c);
    }
    SmolStr::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kids<'a>(items: &'a [(&'a str, Option<&'a str>)]) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        items.iter().copied()
    }

    #[test]
    fn test_empty_expression_is_leaf() {
        let expr = ContentExpr::parse("").unwrap();
        assert!(expr.is_empty());
        assert!(expr.matches(kids(&[])));
        assert!(!expr.matches(kids(&[("text", Some("inline"))])));
    }

    #[test]
    fn test_star_accepts_any_count() {
        let expr = ContentExpr::parse("text*").unwrap();
        assert!(expr.matches(kids(&[])));
        assert!(expr.matches(kids(&[("text", None), ("text", None)])));
        assert!(!expr.matches(kids(&[("image", Some("inline"))])));
    }

    #[test]
    fn test_group_names_match() {
        let expr = ContentExpr::parse("inline*").unwrap();
        assert!(expr.matches(kids(&[("text", Some("inline")), ("image", Some("inline"))])));
        assert!(!expr.matches(kids(&[("paragraph", Some("block"))])));
    }

    #[test]
    fn test_plus_requires_one() {
        let expr = ContentExpr::parse("block+").unwrap();
        assert!(!expr.matches(kids(&[])));
        assert!(expr.matches(kids(&[("paragraph", Some("block"))])));
    }

    #[test]
    fn test_sequence_backtracks() {
        let expr = ContentExpr::parse("block* paragraph").unwrap();
        assert!(expr.matches(kids(&[
            ("paragraph", Some("block")),
            ("paragraph", Some("block")),
        ])));
        assert!(!expr.matches(kids(&[("heading", Some("block"))])));
    }

    #[test]
    fn test_alternation() {
        let expr = ContentExpr::parse("(paragraph | heading)+ image?").unwrap();
        assert!(expr.matches(kids(&[("heading", None), ("paragraph", None), ("image", None)])));
        assert!(!expr.matches(kids(&[("image", None)])));
    }

    #[test]
    fn test_parse_errors() {
        assert!(ContentExpr::parse("(a | b").is_err());
        assert!(ContentExpr::parse("()").is_err());
        assert!(ContentExpr::parse("a & b").is_err());
    }
}
