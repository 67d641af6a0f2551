//! Pest-based parser for filter/formula expressions

use std::iter::Peekable;
use std::num::NonZeroUsize;
use std::str::CharIndices;
use std::sync::Once;

use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::ast::*;

#[derive(Parser)]
#[grammar = "expr.pest"]
pub struct ExprParser;

/// Deepest bracket or CASE nesting accepted before the grammar runs
pub const MAX_NESTING: usize = 32;

/// Rule invocations allowed in one pest parse
const CALL_LIMIT: usize = 5_000_000;

static CALL_LIMIT_INIT: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {col}: {message}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("Empty expression")]
    Empty,

    #[error("Expression is nested too deeply (limit {limit})")]
    TooDeep { limit: usize },

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Malformed parse tree: missing {0}")]
    Malformed(&'static str),
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let err = err.renamed_rules(|rule| describe_rule(*rule).to_string());
        let (line, col) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        ParseError::Syntax {
            line,
            col,
            message: err.variant.message().into_owned(),
        }
    }
}

/// Human-readable rule names used in syntax error messages
fn describe_rule(rule: Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::expression | Rule::expr | Rule::or_expr | Rule::and_expr | Rule::cmp_expr
        | Rule::add_expr | Rule::mul_expr | Rule::arg_slot => "expression",
        Rule::or_op | Rule::and_op => "logical operator",
        Rule::cmp_op => "comparison operator",
        Rule::add_op | Rule::mul_op => "arithmetic operator",
        Rule::case_expr => "CASE expression",
        Rule::when_clause => "WHEN clause",
        Rule::else_clause => "ELSE clause",
        Rule::cast_expr => "CAST expression",
        Rule::type_name => "type name",
        Rule::func_call => "function call",
        Rule::arg_list => "arguments",
        Rule::number => "number",
        Rule::string | Rule::dq_inner | Rule::sq_inner => "string",
        Rule::field | Rule::ident | Rule::quoted_ident | Rule::quoted_name => "field",
        Rule::keyword => "keyword",
        Rule::case_kw => "CASE",
        Rule::when_kw => "WHEN",
        Rule::then_kw => "THEN",
        Rule::else_kw => "ELSE",
        Rule::end_kw => "END",
        Rule::cast_kw => "CAST",
        Rule::as_kw => "AS",
        _ => "token",
    }
}

/// Parse expression text into an AST
pub fn parse(source: &str) -> Result<Node, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    if nesting_depth(source) > MAX_NESTING {
        tracing::trace!(limit = MAX_NESTING, "expression nests too deeply");
        return Err(ParseError::TooDeep { limit: MAX_NESTING });
    }

    CALL_LIMIT_INIT.call_once(|| pest::set_call_limit(NonZeroUsize::new(CALL_LIMIT)));

    let mut pairs = ExprParser::parse(Rule::expression, source).map_err(|e| {
        tracing::trace!(error = %e, "expression failed to parse");
        ParseError::from(e)
    })?;
    let expression = next_pair(&mut pairs, "expression")?;
    let expr = next_pair(&mut expression.into_inner(), "expr")?;

    parse_expr(expr, 0)
}

/// Deepest `(` or CASE nesting in `source`, ignoring quoted text.
///
/// The grammar recurses once per level, so this runs before pest does.
fn nesting_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            '"' | '\'' | '`' => skip_quoted(&mut chars, c),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_' || next == '.') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let word = &source[start..end];
                if word.eq_ignore_ascii_case("case") {
                    depth += 1;
                    deepest = deepest.max(depth);
                } else if word.eq_ignore_ascii_case("end") {
                    depth = depth.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    deepest
}

fn skip_quoted(chars: &mut Peekable<CharIndices<'_>>, quote: char) {
    while let Some((_, c)) = chars.next() {
        if c == quote {
            break;
        }
        if c == '\\' && quote != '`' {
            chars.next();
        }
    }
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, what: &'static str) -> Result<Pair<'i, Rule>, ParseError> {
    pairs.next().ok_or(ParseError::Malformed(what))
}

/// `depth` is the level the produced node will sit at; the root is 0.
fn parse_expr(pair: Pair<Rule>, depth: usize) -> Result<Node, ParseError> {
    if depth > MAX_DEPTH {
        return Err(ParseError::TooDeep { limit: MAX_DEPTH });
    }

    match pair.as_rule() {
        Rule::expr => parse_expr(next_pair(&mut pair.into_inner(), "expression")?, depth),
        Rule::or_expr | Rule::and_expr | Rule::cmp_expr | Rule::add_expr | Rule::mul_expr => {
            // Flat sequence: operand (op operand)*, folded left-associatively.
            // The first operand ends up one level below every operator.
            let mut inner = pair.into_inner();
            let mut level = inner.clone().count() / 2;
            let mut left = parse_expr(next_pair(&mut inner, "left operand")?, depth + level)?;

            while let Some(op_pair) = inner.next() {
                let operator = Operator::from_symbol(op_pair.as_str())
                    .ok_or(ParseError::Malformed("operator"))?;
                let right = parse_expr(next_pair(&mut inner, "right operand")?, depth + level)?;
                level = level.saturating_sub(1);

                left = Node::BinaryExpression {
                    operator,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                };
            }

            Ok(left)
        }
        Rule::case_expr => parse_case(pair, depth),
        Rule::cast_expr => parse_cast(pair, depth),
        Rule::func_call => parse_func_call(pair, depth),
        Rule::number => parse_number(pair),
        Rule::string => parse_string(pair),
        Rule::field => parse_field(pair),
        _ => Err(ParseError::Malformed("expression")),
    }
}

fn parse_case(pair: Pair<Rule>, depth: usize) -> Result<Node, ParseError> {
    let mut whens = Vec::new();
    let mut else_branch = None;

    for clause in pair.into_inner() {
        match clause.as_rule() {
            Rule::when_clause => {
                let mut exprs = clause.into_inner().filter(|p| p.as_rule() == Rule::expr);
                let condition = parse_expr(exprs.next().ok_or(ParseError::Malformed("WHEN condition"))?, depth + 1)?;
                let result = parse_expr(exprs.next().ok_or(ParseError::Malformed("THEN result"))?, depth + 1)?;
                whens.push(WhenClause {
                    condition: Some(condition),
                    result: Some(result),
                });
            }
            Rule::else_clause => {
                let expr = clause
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::expr)
                    .ok_or(ParseError::Malformed("ELSE result"))?;
                else_branch = Some(Box::new(parse_expr(expr, depth + 1)?));
            }
            _ => {}
        }
    }

    Ok(Node::CaseExpression { whens, else_branch })
}

fn parse_cast(pair: Pair<Rule>, depth: usize) -> Result<Node, ParseError> {
    let mut value = None;
    let mut target_type = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::expr => value = Some(Box::new(parse_expr(part, depth + 1)?)),
            Rule::type_name => target_type = Some(part.as_str().to_string()),
            _ => {}
        }
    }

    Ok(Node::CastFunction {
        value,
        target_type: target_type.ok_or(ParseError::Malformed("cast target type"))?,
    })
}

fn parse_func_call(pair: Pair<Rule>, depth: usize) -> Result<Node, ParseError> {
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, "function name")?.as_str().to_string();

    let arguments = match inner.next() {
        Some(arg_list) => arg_list
            .into_inner()
            .map(|slot| match slot.into_inner().next() {
                Some(expr) => parse_expr(expr, depth + 1).map(Some),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };

    Ok(Node::FunctionCall { name, arguments })
}

fn parse_number(pair: Pair<Rule>) -> Result<Node, ParseError> {
    let text = pair.as_str();
    let value = text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))?;
    Ok(Node::NumberLiteral { value })
}

fn parse_string(pair: Pair<Rule>) -> Result<Node, ParseError> {
    let body = next_pair(&mut pair.into_inner(), "string body")?;
    Ok(Node::StringLiteral {
        value: unescape(body.as_str()),
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_field(pair: Pair<Rule>) -> Result<Node, ParseError> {
    let inner = next_pair(&mut pair.into_inner(), "field name")?;
    let name = match inner.as_rule() {
        Rule::quoted_ident => next_pair(&mut inner.into_inner(), "quoted field name")?
            .as_str()
            .to_string(),
        _ => inner.as_str().to_string(),
    };
    Ok(Node::Field { name })
}
