//! Line-oriented journal grammar.
//!
//! Each physical line is classified by its first character and handed to a
//! function that returns a freshly built node. Indented lines extend the
//! block opened by the previous unindented line: postings and notes extend a
//! transaction, sub-directives extend an `account`, `commodity` or `payee`
//! declaration. A blank or unindented line closes the open block.

use chrono::{Datelike, NaiveDate, NaiveTime};
use sha2::{Digest, Sha256};

use plainledger_core::{
    AccountDecl, AccountKind, CommodityDecl, Directive, MetaValue, Metadata, PayeeDecl, Posting,
    Price, State, Transaction,
};

use crate::date::{parse_journal_date, parse_time};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{parse_amount, parse_posting_tail};
use crate::{ParseResult, Span, Spanned};

type LineResult<T> = Result<T, ParseErrorKind>;

/// The block an indented line would extend.
enum Block {
    None,
    /// A header failed; swallow its indented lines silently.
    Skip,
    Transaction(Transaction, Span),
    Account(AccountDecl, Span),
    Commodity(CommodityDecl, Span),
    Payee(PayeeDecl, Span),
    Verbatim {
        kind: Verbatim,
        body: Vec<String>,
        span: Span,
    },
}

#[derive(Clone, Copy)]
enum Verbatim {
    Test,
    Comment,
}

impl Verbatim {
    const fn terminator(self) -> &'static str {
        match self {
            Self::Test => "end test",
            Self::Comment => "end comment",
        }
    }

    const fn keyword(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Comment => "comment",
        }
    }
}

pub(crate) struct Grammar<'src> {
    source: &'src str,
    year: i32,
    block: Block,
    directives: Vec<Spanned<Directive>>,
    errors: Vec<ParseError>,
}

impl<'src> Grammar<'src> {
    pub(crate) fn new(source: &'src str, today: NaiveDate) -> Self {
        Self {
            source,
            year: today.year(),
            block: Block::None,
            directives: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> ParseResult {
        for (idx, line) in self.source.lines().enumerate() {
            self.line(idx + 1, line);
        }
        if let Block::Verbatim { kind, span, .. } = &self.block {
            let text = span.lines(self.source).first().copied().unwrap_or_default();
            self.errors.push(ParseError::new(
                ParseErrorKind::UnterminatedBlock(kind.keyword().to_string()),
                span.first,
                text,
            ));
            self.block = Block::None;
        }
        self.flush();
        ParseResult {
            directives: self.directives,
            errors: self.errors,
        }
    }

    fn error(&mut self, kind: ParseErrorKind, line: usize, text: &str) {
        self.errors.push(ParseError::new(kind, line, text));
    }

    fn emit(&mut self, directive: Directive, span: Span) {
        self.directives.push(Spanned::new(directive, span));
    }

    /// Close the open block, emitting its node.
    fn flush(&mut self) {
        match std::mem::replace(&mut self.block, Block::None) {
            Block::None | Block::Skip => {}
            Block::Transaction(mut txn, span) => {
                txn.lines = (span.first, span.last);
                txn.fingerprint = fingerprint(&span.lines(self.source));
                self.emit(Directive::Transaction(txn), span);
            }
            Block::Account(decl, span) => self.emit(Directive::Account(decl), span),
            Block::Commodity(decl, span) => self.emit(Directive::Commodity(decl), span),
            Block::Payee(decl, span) => self.emit(Directive::Payee(decl), span),
            Block::Verbatim { kind, body, span } => {
                let body = body.join("\n");
                let directive = match kind {
                    Verbatim::Test => Directive::Test(body),
                    Verbatim::Comment => Directive::Comment(body),
                };
                self.emit(directive, span);
            }
        }
    }

    fn line(&mut self, no: usize, line: &str) {
        if let Block::Verbatim { kind, body, span } = &mut self.block {
            *span = span.extend_to(no);
            if line.trim() == kind.terminator() {
                self.flush();
            } else {
                body.push(line.to_string());
            }
            return;
        }

        if line.trim().is_empty() {
            self.flush();
            return;
        }

        if line.starts_with([' ', '\t']) {
            self.indented(no, line);
            return;
        }

        self.flush();
        let result = match line.chars().next() {
            Some(c) if c.is_ascii_digit() => self.transaction_header(line).map(|txn| {
                self.block = Block::Transaction(txn, Span::line(no));
            }),
            Some(';' | '#' | '|' | '*' | '%') => {
                self.emit(Directive::Comment(line[1..].trim().to_string()), Span::line(no));
                Ok(())
            }
            Some('P') if line[1..].starts_with([' ', '\t']) => self.price(&line[1..]).map(|p| {
                self.emit(Directive::Price(p), Span::line(no));
            }),
            _ => self.directive(no, line),
        };
        if let Err(kind) = result {
            self.block = Block::Skip;
            self.error(kind, no, line);
        }
    }

    fn indented(&mut self, no: usize, line: &str) {
        let body = line.trim();
        let result = match &mut self.block {
            Block::None => Err(ParseErrorKind::UnexpectedIndent),
            Block::Skip => Ok(()),
            Block::Transaction(txn, span) => {
                *span = span.extend_to(no);
                if let Some(text) = body.strip_prefix(';') {
                    match txn.postings.last_mut() {
                        Some(p) => annotate(&mut p.note, &mut p.tags, &mut p.meta, text),
                        None => annotate(&mut txn.note, &mut txn.tags, &mut txn.meta, text),
                    }
                    Ok(())
                } else {
                    posting(body, self.year).map(|p| txn.postings.push(p))
                }
            }
            Block::Account(decl, span) => {
                *span = span.extend_to(no);
                account_sub_line(decl, body)
            }
            Block::Commodity(decl, span) => {
                *span = span.extend_to(no);
                commodity_sub_line(decl, body)
            }
            Block::Payee(decl, span) => {
                *span = span.extend_to(no);
                payee_sub_line(decl, body)
            }
            Block::Verbatim { .. } => Ok(()),
        };
        if let Err(kind) = result {
            self.error(kind, no, line);
        }
    }

    /// `DATE[=EDATE] [*|!] [(CODE)] PAYEE [; NOTE]`
    fn transaction_header(&self, line: &str) -> LineResult<Transaction> {
        let (head, note) = split_comment(line);
        let (date_word, rest) = split_word(head);
        let (date, edate) = match date_word.split_once('=') {
            Some((d, e)) => (
                parse_journal_date(d, self.year)?,
                Some(parse_journal_date(e, self.year)?),
            ),
            None => (parse_journal_date(date_word, self.year)?, None),
        };

        let (state, rest) = leading_state(rest);
        let (code, rest) = match rest.strip_prefix('(') {
            Some(inner) => {
                let (code, after) = inner
                    .split_once(')')
                    .ok_or_else(|| ParseErrorKind::Syntax("unclosed '(' in code".to_string()))?;
                (Some(code.trim().to_string()), after.trim_start())
            }
            None => (None, rest),
        };

        let mut txn = Transaction::new(date, rest.trim());
        txn.edate = edate;
        txn.state = state;
        txn.code = code;
        if let Some(text) = note {
            annotate(&mut txn.note, &mut txn.tags, &mut txn.meta, text);
        }
        Ok(txn)
    }

    /// `P DATE [HH:MM[:SS]] SYMBOL AMOUNT`
    fn price(&self, rest: &str) -> LineResult<Price> {
        let (date_word, rest) = split_word(rest.trim());
        let date = parse_journal_date(date_word, self.year)?;
        let (maybe_time, after) = split_word(rest);
        let (time, rest) = if maybe_time.contains(':') {
            (parse_time(maybe_time)?, after)
        } else {
            (NaiveTime::default(), rest)
        };
        let (symbol, rest) = split_word(rest);
        if symbol.is_empty() {
            return Err(ParseErrorKind::MissingField("commodity".to_string()));
        }
        let value = parse_amount(rest).map_err(ParseErrorKind::InvalidAmount)?;
        Ok(Price {
            when: date.and_time(time),
            commodity: symbol.trim_matches('"').to_string(),
            value,
        })
    }

    fn directive(&mut self, no: usize, line: &str) -> LineResult<()> {
        let (head, _) = split_comment(line);
        let (keyword, arg) = split_word(head);
        let arg = arg.trim();
        let required = |what: &str| {
            if arg.is_empty() {
                Err(ParseErrorKind::MissingField(what.to_string()))
            } else {
                Ok(arg.to_string())
            }
        };
        let span = Span::line(no);

        let directive = match keyword {
            "account" => {
                let decl = AccountDecl {
                    name: required("account name")?,
                    ..AccountDecl::default()
                };
                self.block = Block::Account(decl, span);
                return Ok(());
            }
            "commodity" => {
                let decl = CommodityDecl {
                    name: required("commodity symbol")?.trim_matches('"').to_string(),
                    ..CommodityDecl::default()
                };
                self.block = Block::Commodity(decl, span);
                return Ok(());
            }
            "payee" => {
                let decl = PayeeDecl {
                    name: required("payee name")?,
                    ..PayeeDecl::default()
                };
                self.block = Block::Payee(decl, span);
                return Ok(());
            }
            "test" | "comment" => {
                let kind = if keyword == "test" {
                    Verbatim::Test
                } else {
                    Verbatim::Comment
                };
                self.block = Block::Verbatim {
                    kind,
                    body: Vec::new(),
                    span,
                };
                return Ok(());
            }
            "apply" => match split_word(arg) {
                ("account", name) if !name.trim().is_empty() => {
                    Directive::ApplyAccount(name.trim().to_string())
                }
                ("account", _) => {
                    return Err(ParseErrorKind::MissingField("account name".to_string()))
                }
                (other, _) => {
                    return Err(ParseErrorKind::UnknownDirective(format!("apply {other}")))
                }
            },
            "end" => match arg {
                "" | "apply" | "apply account" => Directive::End,
                other => {
                    return Err(ParseErrorKind::Syntax(format!(
                        "'end {other}' without a matching block"
                    )))
                }
            },
            "alias" => {
                let (name, account) = required("alias")?
                    .split_once('=')
                    .map(|(n, a)| (n.trim().to_string(), a.trim().to_string()))
                    .ok_or_else(|| ParseErrorKind::MissingField("alias=account".to_string()))?;
                Directive::Alias { name, account }
            }
            "year" | "Y" => {
                let year: i32 = arg
                    .parse()
                    .map_err(|_| ParseErrorKind::InvalidNumber(arg.to_string()))?;
                self.year = year;
                Directive::Year(year)
            }
            "bucket" | "A" => Directive::Bucket(required("account name")?),
            "capture" => {
                let spec = required("account and pattern")?;
                let (account, pattern) = split_account(&spec);
                if pattern.trim().is_empty() {
                    return Err(ParseErrorKind::MissingField("capture pattern".to_string()));
                }
                Directive::Capture {
                    account: account.trim().to_string(),
                    pattern: pattern.trim().to_string(),
                }
            }
            "include" => Directive::Include(required("path")?),
            "assert" => Directive::Assert(required("expression")?),
            "check" => Directive::Check(required("expression")?),
            "define" | "def" => {
                let (name, expr) = required("definition")?
                    .split_once('=')
                    .map(|(n, e)| (n.trim().to_string(), e.trim().to_string()))
                    .ok_or_else(|| ParseErrorKind::MissingField("name=expression".to_string()))?;
                Directive::Define { name, expr }
            }
            "fixed" => {
                let (commodity, rest) = split_word(arg);
                if commodity.is_empty() {
                    return Err(ParseErrorKind::MissingField("commodity".to_string()));
                }
                let price = parse_amount(rest).map_err(ParseErrorKind::InvalidAmount)?;
                Directive::Fixed {
                    commodity: commodity.to_string(),
                    price,
                }
            }
            other => return Err(ParseErrorKind::UnknownDirective(other.to_string())),
        };
        self.emit(directive, span);
        Ok(())
    }
}

/// One indented posting line: `[STATE] ACCOUNT[  TAIL]`.
fn posting(body: &str, year: i32) -> LineResult<Posting> {
    let (state, rest) = leading_state(body);
    let (raw_account, tail) = split_account(rest);
    let raw_account = raw_account.trim();
    if raw_account.is_empty() {
        return Err(ParseErrorKind::MissingAccount);
    }

    let (kind, name) = if let Some(inner) = raw_account
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        (AccountKind::Virtual, inner)
    } else if let Some(inner) = raw_account
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    {
        (AccountKind::BalancedVirtual, inner)
    } else {
        (AccountKind::Real, raw_account)
    };
    if name.trim().is_empty() {
        return Err(ParseErrorKind::MissingAccount);
    }

    let tail = parse_posting_tail(tail).map_err(ParseErrorKind::InvalidAmount)?;
    let mut posting = Posting::tally(name.trim()).with_kind(kind);
    posting.state = state;
    posting.commodity = tail.amount;
    posting.lot_price = tail.lot_price;
    posting.lot_date = tail
        .lot_date
        .map(|raw| parse_journal_date(raw, year))
        .transpose()?;
    posting.cost_price = tail.cost_price;
    posting.balance_price = tail.balance_price;
    if let Some(text) = tail.comment {
        annotate(&mut posting.note, &mut posting.tags, &mut posting.meta, text);
    }
    Ok(posting)
}

fn account_sub_line(decl: &mut AccountDecl, body: &str) -> LineResult<()> {
    let (keyword, arg) = split_word(body);
    let value = arg.trim().to_string();
    match keyword {
        "note" => decl.note = Some(value),
        "alias" => decl.aliases.push(value),
        "payee" => decl.payees.push(value),
        "check" => decl.checks.push(value),
        "assert" => decl.asserts.push(value),
        "eval" => decl.evals.push(value),
        "type" => decl.types.push(value),
        "default" => decl.is_default = true,
        _ if keyword.starts_with(';') => {}
        other => return Err(ParseErrorKind::UnknownSubDirective(other.to_string())),
    }
    Ok(())
}

fn commodity_sub_line(decl: &mut CommodityDecl, body: &str) -> LineResult<()> {
    let (keyword, arg) = split_word(body);
    match keyword {
        "note" => decl.note = Some(arg.trim().to_string()),
        "format" => {
            decl.format = Some(parse_amount(arg).map_err(ParseErrorKind::InvalidAmount)?);
        }
        "nomarket" => decl.nomarket = true,
        "default" => decl.is_default = true,
        "currency" => decl.currency = true,
        _ if keyword.starts_with(';') => {}
        other => return Err(ParseErrorKind::UnknownSubDirective(other.to_string())),
    }
    Ok(())
}

fn payee_sub_line(decl: &mut PayeeDecl, body: &str) -> LineResult<()> {
    let (keyword, arg) = split_word(body);
    match keyword {
        "alias" => decl.aliases.push(arg.trim().to_string()),
        "uuid" => decl.uuid = Some(arg.trim().to_string()),
        _ if keyword.starts_with(';') => {}
        other => return Err(ParseErrorKind::UnknownSubDirective(other.to_string())),
    }
    Ok(())
}

/// Route a `;` comment into tags, a metadata entry or the free-text note.
///
/// `:a:b:` adds tags `a` and `b`; `key: value` adds a metadata entry; any
/// other text is appended to the note.
fn annotate(note: &mut Option<String>, tags: &mut Vec<String>, meta: &mut Metadata, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if text.len() > 1 && text.starts_with(':') && text.ends_with(':') && !text.contains(' ') {
        tags.extend(
            text.split(':')
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
        return;
    }
    if let Some((key, value)) = text.split_once(':') {
        let is_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if is_key && value.starts_with(' ') && !value.trim().is_empty() {
            meta.insert(key.to_string(), MetaValue::infer(value));
            return;
        }
    }
    match note {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *note = Some(text.to_string()),
    }
}

fn fingerprint(lines: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.trim_end().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Split at a `;` comment, if any.
fn split_comment(s: &str) -> (&str, Option<&str>) {
    match s.split_once(';') {
        Some((head, note)) => (head.trim_end(), Some(note)),
        None => (s.trim_end(), None),
    }
}

/// Split an account name from what follows it. The name ends at two spaces,
/// a tab or a `;`.
fn split_account(s: &str) -> (&str, &str) {
    let end = [s.find("  "), s.find('\t'), s.find(';')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Strip a leading `*` or `!` state marker.
fn leading_state(s: &str) -> (Option<State>, &str) {
    let s = s.trim_start();
    let mut chars = s.chars();
    match (chars.next().and_then(State::from_char), chars.next()) {
        (Some(state), None) => (Some(state), ""),
        (Some(state), Some(c)) if c.is_whitespace() => (Some(state), s[1..].trim_start()),
        _ => (None, s),
    }
}
