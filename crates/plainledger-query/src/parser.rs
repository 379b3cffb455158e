//! Filter expression parser.
//!
//! Uses chumsky for parser combinators over the preprocessed text form:
//!
//! ```text
//! expr  := or
//! or    := and ( "or" and )*
//! and   := value ( "and" value )*
//! value := "regex"+ | "(" expr ")" | "not" expr
//! ```
//!
//! Adjacent quoted terms with no keyword between them are OR'd.

use chumsky::prelude::*;
use regex::Regex;

use crate::ast::FilterExpr;
use crate::error::FilterError;

type ParserInput<'a> = &'a str;
type ParserExtra<'a> = extra::Err<Rich<'a, char>>;

const KEYWORDS: [&str; 3] = ["and", "or", "not"];

/// Compile command-line tokens into a filter expression.
///
/// Returns `Ok(None)` when there are no tokens, meaning "match everything".
///
/// ```
/// use plainledger_query::compile;
///
/// let filter = compile(&["Expenses", "and", "Chat", "or", "Travel"]).unwrap().unwrap();
/// assert!(filter.matches("Expenses:Chats"));
/// assert!(filter.matches("Income:Travel"));
/// assert!(!filter.matches("Expenses:Dinning"));
/// ```
pub fn compile<S: AsRef<str>>(tokens: &[S]) -> Result<Option<FilterExpr>, FilterError> {
    let text = preprocess(tokens)?;
    if text.is_empty() {
        return Ok(None);
    }
    parse(&text).map(Some)
}

/// Rewrite raw tokens into the textual grammar.
///
/// `and`, `or` and `not` pass through unquoted. Every other token becomes a
/// quoted regex literal; leading `(` and trailing `)` characters are split off
/// and kept as grouping parentheses.
pub fn preprocess<S: AsRef<str>>(tokens: &[S]) -> Result<String, FilterError> {
    let mut parts = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim();
        let body = token.trim_start_matches('(');
        let inner = body.trim_end_matches(')');
        let (opens, closes) = (token.len() - body.len(), body.len() - inner.len());

        parts.extend(std::iter::repeat("(".to_string()).take(opens));
        if KEYWORDS.contains(&inner) {
            parts.push(inner.to_string());
        } else if !inner.is_empty() {
            Regex::new(inner).map_err(|e| FilterError::InvalidPattern {
                pattern: inner.to_string(),
                message: e.to_string(),
            })?;
            parts.push(quote(inner));
        }
        parts.extend(std::iter::repeat(")".to_string()).take(closes));
    }
    Ok(parts.join(" "))
}

fn quote(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('"');
    for c in pattern.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parse a filter expression in its textual form.
pub fn parse(source: &str) -> Result<FilterExpr, FilterError> {
    let (result, errs) = filter_parser()
        .then_ignore(ws())
        .then_ignore(end())
        .parse(source)
        .into_output_errors();

    match (result, errs.first()) {
        (Some(expr), None) => Ok(expr),
        (_, Some(e)) => Err(FilterError::syntax(e.span().start, e.to_string())),
        (None, None) => Err(FilterError::syntax(0, "empty expression")),
    }
}

/// Parse whitespace.
fn ws<'a>() -> impl Parser<'a, ParserInput<'a>, (), ParserExtra<'a>> + Clone {
    one_of(" \t").repeated().ignored()
}

fn kw<'a>(keyword: &'static str) -> impl Parser<'a, ParserInput<'a>, (), ParserExtra<'a>> + Clone {
    text::keyword(keyword).ignored()
}

fn string_literal<'a>() -> impl Parser<'a, ParserInput<'a>, String, ParserExtra<'a>> + Clone {
    just('"')
        .ignore_then(
            none_of("\"\\")
                .or(just('\\').ignore_then(any()))
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just('"'))
}

fn filter_parser<'a>() -> impl Parser<'a, ParserInput<'a>, FilterExpr, ParserExtra<'a>> {
    ws().ignore_then(recursive(|expr| {
        let term = string_literal().try_map(|pattern: String, span| {
            Regex::new(&pattern)
                .map(FilterExpr::Match)
                .map_err(|e| Rich::custom(span, e.to_string()))
        });

        // Juxtaposed terms
        let terms = term.clone().foldl(
            ws().ignore_then(term).repeated(),
            FilterExpr::or,
        );

        let group = just('(')
            .ignore_then(ws())
            .ignore_then(expr.clone())
            .then_ignore(ws())
            .then_ignore(just(')'));

        let negation = kw("not")
            .ignore_then(ws())
            .ignore_then(expr)
            .map(FilterExpr::not);

        let value = choice((terms, group, negation));

        let and_expr = value.clone().foldl(
            ws().ignore_then(kw("and"))
                .ignore_then(ws())
                .ignore_then(value)
                .repeated(),
            FilterExpr::and,
        );

        // OR (lowest precedence)
        and_expr.clone().foldl(
            ws().ignore_then(kw("or"))
                .ignore_then(ws())
                .ignore_then(and_expr)
                .repeated(),
            FilterExpr::or,
        )
    }))
}
