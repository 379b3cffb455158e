//! Tokenizer for amounts and price annotations using Logos.
//!
//! Everything on a posting line after the account name is lexed here:
//! the amount, `{lot}` / `{{lot}}` prices, the `[date]` lot date, `@` / `@@`
//! cost prices, the `= balance` assertion and the trailing `; note`.

use logos::Logos;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use plainledger_core::Commodity;

/// Token types produced by the Logos lexer.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
pub enum Token<'src> {
    /// A date inside a lot-date annotation: `2024/01/15`, `2024-01-15`.
    #[regex(r"[0-9]+[/.\-][0-9]+[/.\-][0-9]+")]
    Date(&'src str),

    /// An unsigned number with optional thousands separators and decimals.
    #[regex(r"[0-9][0-9,]*(\.[0-9]+)?")]
    Number(&'src str),

    /// A double-quoted commodity name; the slice includes the quotes.
    #[regex(r#""[^"\n]*""#)]
    Quoted(&'src str),

    /// A bare commodity symbol: `$`, `USD`, `€`.
    #[regex(r#"[^ \t\n0-9\-@{}\[\]=;"(),.]+"#)]
    Symbol(&'src str),

    /// `{{`
    #[token("{{")]
    LDoubleBrace,
    /// `}}`
    #[token("}}")]
    RDoubleBrace,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `@@` total cost.
    #[token("@@")]
    AtAt,
    /// `@` per-unit cost.
    #[token("@")]
    At,
    /// `=` balance assertion, or fixated lot price inside braces.
    #[token("=")]
    Equals,
    /// `-` sign.
    #[token("-")]
    Minus,

    /// A trailing comment; the slice includes the semicolon.
    #[regex(r";[^\n]*")]
    Comment(&'src str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(s) | Self::Number(s) | Self::Quoted(s) | Self::Symbol(s) => {
                write!(f, "{s}")
            }
            Self::Comment(s) => write!(f, "{s}"),
            Self::LDoubleBrace => write!(f, "{{{{"),
            Self::RDoubleBrace => write!(f, "}}}}"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::AtAt => write!(f, "@@"),
            Self::At => write!(f, "@"),
            Self::Equals => write!(f, "="),
            Self::Minus => write!(f, "-"),
        }
    }
}

/// Tokenize a line fragment, failing on the first unrecognized character.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, String> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(format!("unexpected '{}'", lexer.slice())),
        }
    }
    Ok(tokens)
}

/// The annotations found after a posting's account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingTail<'src> {
    /// The amount.
    pub amount: Option<Commodity>,
    /// `{price}` / `{{total}}` / `{=fixed}`.
    pub lot_price: Option<Commodity>,
    /// Raw text of the `[date]` annotation.
    pub lot_date: Option<&'src str>,
    /// `@ price` / `@@ total`.
    pub cost_price: Option<Commodity>,
    /// `= balance`.
    pub balance_price: Option<Commodity>,
    /// Text after `;`, trimmed.
    pub comment: Option<&'src str>,
}

/// Cursor over a token stream.
struct Cursor<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> Cursor<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token<'src>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token<'src>) -> Result<(), String> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(match self.peek() {
                Some(found) => format!("expected '{expected}', found '{found}'"),
                None => format!("expected '{expected}'"),
            })
        }
    }

    fn symbol(&mut self) -> Option<&'src str> {
        let symbol = match self.peek() {
            Some(&Token::Symbol(s)) => s,
            Some(&Token::Quoted(s)) => s.trim_matches('"'),
            _ => return None,
        };
        self.pos += 1;
        Some(symbol)
    }

    /// `[-]SYM[-]NUM` or `[-]NUM [SYM]`.
    fn amount(&mut self) -> Result<Option<Commodity>, String> {
        let negated = self.eat(&Token::Minus);
        if let Some(symbol) = self.symbol() {
            let inner = self.eat(&Token::Minus);
            let Some(Token::Number(raw)) = self.bump() else {
                return Err(format!("expected a number after '{symbol}'"));
            };
            let value = number(raw, negated != inner)?;
            return Ok(Some(Commodity::currency(symbol, value)));
        }
        if let Some(&Token::Number(raw)) = self.peek() {
            self.pos += 1;
            let value = number(raw, negated)?;
            let symbol = self.symbol().unwrap_or_default();
            return Ok(Some(Commodity::new(symbol, value)));
        }
        if negated {
            return Err("dangling '-'".to_string());
        }
        Ok(None)
    }

    fn required_amount(&mut self, what: &str) -> Result<Commodity, String> {
        self.amount()?
            .ok_or_else(|| format!("expected an amount after {what}"))
    }
}

/// Parse a number literal, dropping thousands separators.
pub fn number(raw: &str, negated: bool) -> Result<Decimal, String> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let value = Decimal::from_str(&cleaned).map_err(|_| format!("invalid number '{raw}'"))?;
    Ok(if negated { -value } else { value })
}

/// Parse a standalone amount such as `$1,000.00` or `-10 AAPL`.
///
/// ```
/// use plainledger_parser::lexer::parse_amount;
///
/// let amount = parse_amount("-$1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "-$1250.50");
/// assert!(amount.currency);
/// ```
pub fn parse_amount(source: &str) -> Result<Commodity, String> {
    let mut cursor = Cursor {
        tokens: tokenize(source)?,
        pos: 0,
    };
    let amount = cursor
        .amount()?
        .ok_or_else(|| "expected an amount".to_string())?;
    match cursor.peek() {
        None => Ok(amount),
        Some(extra) => Err(format!("unexpected '{extra}' after amount")),
    }
}

/// Parse everything after a posting's account name.
pub fn parse_posting_tail(source: &str) -> Result<PostingTail<'_>, String> {
    let mut cursor = Cursor {
        tokens: tokenize(source)?,
        pos: 0,
    };
    let mut tail = PostingTail {
        amount: cursor.amount()?,
        ..PostingTail::default()
    };
    while let Some(token) = cursor.bump() {
        match token {
            Token::LBrace | Token::LDoubleBrace => {
                let total = token == Token::LDoubleBrace;
                let fixed = cursor.eat(&Token::Equals);
                let price = cursor.required_amount("'{'")?;
                cursor.expect(if total { &Token::RDoubleBrace } else { &Token::RBrace })?;
                tail.lot_price = Some(price.with_total(total).with_fixprice(fixed));
            }
            Token::LBracket => {
                let Some(Token::Date(raw)) = cursor.bump() else {
                    return Err("expected a lot date after '['".to_string());
                };
                cursor.expect(&Token::RBracket)?;
                tail.lot_date = Some(raw);
            }
            Token::At | Token::AtAt => {
                let total = token == Token::AtAt;
                let price = cursor.required_amount(if total { "'@@'" } else { "'@'" })?;
                tail.cost_price = Some(price.with_total(total));
            }
            Token::Equals => {
                tail.balance_price = Some(cursor.required_amount("'='")?);
            }
            Token::Comment(text) => {
                tail.comment = Some(text[1..].trim());
            }
            other => return Err(format!("unexpected '{other}'")),
        }
    }
    Ok(tail)
}
