//! Boolean query parser + evaluator (spec §4.H).
//!
//! Grammar (case-insensitive keywords):
//! `expr = term ((AND|OR) term)* ; term = NOT term | '(' expr ')' | atom ;`
//! `atom = field? (quoted | word) ; field = name: | type: | tag: | observation:`
//!
//! The parser is a standard iterative shunting-yard-style precedence climb
//! (no recursive descent), so expression depth is bounded only by an
//! explicit counter, never by the call stack.

use kgraph_core::{Entity, Error, Result};
use kgraph_storage::GraphView;
use rustc_hash::FxHashSet;

const DEFAULT_MAX_DEPTH: usize = 64;
const DEFAULT_MAX_TERMS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Any,
    Name,
    Type,
    Tag,
    Observation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom { field: Field, text: String },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Word(&'a str),
}

fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }
        if c == '"' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] as char != '"' {
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            tokens.push(Token::Word(&input[start..i]));
            continue;
        }
        let start = i;
        while i < bytes.len() && !(bytes[i] as char).is_whitespace() && bytes[i] as char != '(' && bytes[i] as char != ')' {
            i += 1;
        }
        let word = &input[start..i];
        match word.to_ascii_uppercase().as_str() {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            "NOT" => tokens.push(Token::Not),
            _ => tokens.push(Token::Word(word)),
        }
    }
    tokens
}

fn parse_atom(word: &str) -> Expr {
    let (field, rest) = if let Some(stripped) = word.strip_prefix("name:") {
        (Field::Name, stripped)
    } else if let Some(stripped) = word.strip_prefix("type:") {
        (Field::Type, stripped)
    } else if let Some(stripped) = word.strip_prefix("tag:") {
        (Field::Tag, stripped)
    } else if let Some(stripped) = word.strip_prefix("observation:") {
        (Field::Observation, stripped)
    } else {
        (Field::Any, word)
    };
    let text = rest.trim_matches('"').to_lowercase();
    Expr::Atom { field, text }
}

/// Iterative precedence-climbing parser: operator/operand stacks driven by
/// an explicit loop, with depth (paren nesting) and term-count limits
/// enforced as the token stream is consumed — no recursion, so neither
/// limit can be bypassed by stack overflow.
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    max_depth: usize,
    max_terms: usize,
    term_count: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>, max_depth: usize, max_terms: usize) -> Self {
        Parser { tokens, pos: 0, max_depth, max_terms, term_count: 0 }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self, depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(Error::InvalidQuery { message: format!("expression nesting exceeds max depth {}", self.max_depth) });
        }
        let mut left = self.parse_term(depth)?;
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.advance();
                    let right = self.parse_term(depth)?;
                    left = Expr::And(Box::new(left), Box::new(right));
                }
                Some(Token::Or) => {
                    self.advance();
                    let right = self.parse_term(depth)?;
                    left = Expr::Or(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self, depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(Error::InvalidQuery { message: format!("expression nesting exceeds max depth {}", self.max_depth) });
        }
        match self.peek() {
            Some(Token::Not) => {
                self.advance();
                let inner = self.parse_term(depth + 1)?;
                Ok(Expr::Not(Box::new(inner)))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expr(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Error::InvalidQuery { message: "unbalanced parentheses".to_string() }),
                }
            }
            Some(Token::Word(w)) => {
                self.advance();
                self.term_count += 1;
                if self.term_count > self.max_terms {
                    return Err(Error::InvalidQuery { message: format!("expression exceeds max term count {}", self.max_terms) });
                }
                Ok(parse_atom(w))
            }
            other => Err(Error::InvalidQuery { message: format!("unexpected token in boolean expression: {other:?}") }),
        }
    }
}

/// Parses `input` into an [`Expr`] tree, rejecting expressions beyond the
/// configured depth/term limits (defaults: depth 64, terms 256).
pub fn parse(input: &str) -> Result<Expr> {
    parse_with_limits(input, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TERMS)
}

pub fn parse_with_limits(input: &str, max_depth: usize, max_terms: usize) -> Result<Expr> {
    let tokens = lex(input);
    if tokens.is_empty() {
        return Err(Error::InvalidQuery { message: "empty boolean expression".to_string() });
    }
    let mut parser = Parser::new(tokens, max_depth, max_terms);
    let expr = parser.parse_expr(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(Error::InvalidQuery { message: "trailing tokens after expression".to_string() });
    }
    Ok(expr)
}

/// True if `input` contains any reserved boolean keyword or field
/// qualifier — used by the dispatcher's auto-method heuristic (spec §4.K).
pub fn looks_boolean(input: &str) -> bool {
    lex(input).iter().any(|t| matches!(t, Token::And | Token::Or | Token::Not))
        || ["name:", "type:", "tag:", "observation:"].iter().any(|p| input.to_lowercase().contains(p))
}

fn entity_matches_atom(entity: &Entity, field: &Field, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    match field {
        Field::Name => entity.name.to_lowercase().contains(text),
        Field::Type => entity.entity_type.to_lowercase().contains(text),
        Field::Tag => entity.tags.as_ref().is_some_and(|tags| tags.iter().any(|t| t.contains(text))),
        Field::Observation => entity.observations.iter().any(|o| o.to_lowercase().contains(text)),
        Field::Any => {
            entity.name.to_lowercase().contains(text)
                || entity.entity_type.to_lowercase().contains(text)
                || entity.observations.iter().any(|o| o.to_lowercase().contains(text))
                || entity.tags.as_ref().is_some_and(|tags| tags.iter().any(|t| t.contains(text)))
        }
    }
}

/// Evaluates `expr` against `view` as set-algebra over matching names:
/// AND is postings intersection, OR is union, NOT is complement within the
/// full corpus (spec §4.H).
pub fn evaluate(expr: &Expr, view: &GraphView) -> FxHashSet<String> {
    match expr {
        Expr::Atom { field, text } => view
            .entities
            .values()
            .filter(|e| entity_matches_atom(e, field, text))
            .map(|e| e.name.clone())
            .collect(),
        Expr::Not(inner) => {
            let matched = evaluate(inner, view);
            view.entities.keys().filter(|name| !matched.contains(*name)).cloned().collect()
        }
        Expr::And(a, b) => {
            let left = evaluate(a, view);
            let right = evaluate(b, view);
            left.intersection(&right).cloned().collect()
        }
        Expr::Or(a, b) => {
            let mut left = evaluate(a, view);
            left.extend(evaluate(b, view));
            left
        }
    }
}

/// Parses and evaluates `query` in one call.
pub fn search(query: &str, view: &GraphView) -> Result<FxHashSet<String>> {
    let expr = parse(query)?;
    Ok(evaluate(&expr, view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;

    fn sample_view() -> GraphView {
        let mut v = GraphView::new();
        v.entities.insert("Alice".into(), Entity::new("Alice", "person", vec!["Engineer".into()]).with_tags(vec!["team-a".into()]));
        v.entities.insert("Bob".into(), Entity::new("Bob", "person", vec!["Manager".into()]).with_tags(vec!["team-b".into()]));
        v.entities.insert("Acme".into(), Entity::new("Acme", "company", vec![]));
        v
    }

    #[test]
    fn and_intersects_postings() {
        let view = sample_view();
        let result = search("type:person AND name:alice", &view).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Alice".to_string()]));
    }

    #[test]
    fn or_unions_postings() {
        let view = sample_view();
        let result = search("name:alice OR name:acme", &view).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Alice".to_string(), "Acme".to_string()]));
    }

    #[test]
    fn not_is_complement_within_corpus() {
        let view = sample_view();
        let result = search("NOT type:person", &view).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Acme".to_string()]));
    }

    #[test]
    fn parenthesised_grouping_changes_precedence() {
        let view = sample_view();
        let result = search("type:company OR (type:person AND tag:team-a)", &view).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Acme".to_string(), "Alice".to_string()]));
    }

    #[test]
    fn quoted_phrase_matches_whole_substring() {
        let view = sample_view();
        let result = search("observation:\"Engineer\"", &view).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Alice".to_string()]));
    }

    #[test]
    fn unbalanced_parens_is_invalid_query() {
        assert!(parse("(type:person AND name:alice").is_err());
    }

    #[test]
    fn excess_depth_is_rejected() {
        let deeply_nested: String = "(".repeat(10) + "name:x" + &")".repeat(10);
        assert!(parse_with_limits(&deeply_nested, 3, 256).is_err());
    }

    #[test]
    fn unqualified_atom_matches_tags() {
        let mut v = GraphView::new();
        v.entities.insert(
            "Alice".into(),
            Entity::new("Alice", "person", vec!["Developer".into()]).with_tags(vec!["team-a".into()]),
        );
        v.entities.insert(
            "Bob".into(),
            Entity::new("Bob", "person", vec!["Manager".into()]).with_tags(vec!["team-b".into()]),
        );
        v.entities.insert(
            "Charlie".into(),
            Entity::new("Charlie", "person", vec!["Developer".into()]).with_tags(vec!["team-c".into()]),
        );
        let result = search("Developer AND (team-a OR team-b)", &v).unwrap();
        assert_eq!(result, FxHashSet::from_iter(["Alice".to_string()]));
    }

    #[test]
    fn looks_boolean_detects_operators_and_fields() {
        assert!(looks_boolean("type:person AND active"));
        assert!(looks_boolean("name:alice"));
        assert!(!looks_boolean("just some words"));
    }
}
