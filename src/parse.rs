// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Translating a character stream to a token stream. This is
//! (currently) called "parser" because it fully parses atoms (like
//! strings, numbers, symbols, etc.), thus "tokenizer" may be selling
//! it short (?). The tokens that denote nesting are `Token::Open` and
//! `Token::Close`; `Token::Tag`, `Token::Discard` and `Token::Meta`
//! are prefixes that apply to the form following them. See
//! [read](../read/index.html) if interested in trees rather than
//! atoms / tokens.

use crate::error::ErrorKind;
use crate::pos::{Pos, Span};
use crate::value::{Atom, Parenkind, Collkind, name2char};
use crate::number::{Number, read_number};
use crate::symbol::Symbol;
use crate::settings::Modes;
use kstring::KString;
use thiserror::Error;
use std::fmt::{Display, Write};

fn take_while_and_rest<'s>(
    s: &'s str, pred: impl Fn(char) -> bool
) -> (&'s str, &'s str) {
    if let Some(i) = s.find(|c| ! pred(c)) {
        (&s[0..i], &s[i..])
    } else {
        (s, "")
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error ({0}) after")]
    IOError(anyhow::Error),
    #[error("unexpected EOF in string starting")]
    UnexpectedEOFInString,
    #[error("invalid escaped character '{0}'")]
    InvalidEscapedChar(char),
    #[error("not a hex digit: '{0}'")]
    NonHexDigit(char),
    #[error("invalid code point {0:#x}")]
    InvalidCodePoint(u32),
    #[error("invalid character literal '\\{0}'")]
    InvalidCharacter(KString),
    #[error("invalid number '{0}'")]
    InvalidNumber(KString),
    #[error("invalid symbolic value '##{0}'")]
    InvalidSymbolicValue(KString),
    #[error("invalid symbol '{0}'")]
    InvalidSymbol(KString),
    #[error("invalid keyword '{0}'")]
    InvalidKeyword(KString),
    #[error("invalid tag '#{0}'")]
    InvalidTag(KString),
    #[error("invalid '#' token '#{0}'")]
    InvalidHashToken(char),
    #[error("unexpected EOF after '{0}'")]
    UnexpectedEOFAfter(char),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::IOError(_) => ErrorKind::Io,
            ParseError::UnexpectedEOFInString
                | ParseError::InvalidEscapedChar(_)
                | ParseError::NonHexDigit(_)
                | ParseError::InvalidCodePoint(_) => ErrorKind::MalformedString,
            ParseError::InvalidCharacter(_) => ErrorKind::MalformedCharacter,
            ParseError::InvalidNumber(_)
                | ParseError::InvalidSymbolicValue(_) => ErrorKind::MalformedNumber,
            ParseError::InvalidSymbol(_)
                | ParseError::InvalidKeyword(_)
                | ParseError::InvalidTag(_)
                | ParseError::InvalidHashToken(_) => ErrorKind::InvalidIdentifier,
            ParseError::UnexpectedEOFAfter(_) => ErrorKind::UnexpectedEOF,
        }
    }

    fn at(self, p: Pos) -> ParseErrorWithPos {
        ParseErrorWithPos {
            err: self,
            pos: p
        }
    }
}

#[derive(Error, Debug)]
#[error("{err} {pos}")]
pub struct ParseErrorWithPos {
    pub err: ParseError,
    pub pos: Pos
}

trait At<T> {
    fn at(self, p: Pos) -> Result<T, ParseErrorWithPos>;
}

impl<T> At<T> for Result<T, ParseError> {
    fn at(self, p: Pos) -> Result<T, ParseErrorWithPos> {
        self.map_err(|e| e.at(p))
    }
}

pub fn maybe_open_close(c: char) -> Option<Token> {
    match c {
        '(' => Some(Token::Open(Collkind::List)),
        '[' => Some(Token::Open(Collkind::Vector)),
        '{' => Some(Token::Open(Collkind::Map)),
        ')' => Some(Token::Close(Parenkind::Round)),
        ']' => Some(Token::Close(Parenkind::Square)),
        '}' => Some(Token::Close(Parenkind::Curly)),
        _ => None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentStyle {
    Singleline(u8), // ;  ;;  ;;;  etc.
    Shebang, // #!
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Atom(Atom),
    Open(Collkind),
    Close(Parenkind),
    /// `#foo`, applies to the next form
    Tag(Symbol),
    /// `#_`, drops the next form
    Discard,
    /// `^`, the next form is metadata for the form after it
    Meta,
    Comment(CommentStyle, KString),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        match self {
            Token::Atom(a) => a.fmt(f),
            Token::Open(k) => f.write_str(k.opening()),
            Token::Close(k) => f.write_char(k.closing()),
            Token::Tag(s) => f.write_fmt(format_args!("#{}", s)),
            Token::Discard => f.write_str("#_"),
            Token::Meta => f.write_char('^'),
            Token::Comment(style, s) => {
                match style {
                    CommentStyle::Singleline(n) => {
                        for _ in 0..*n {
                            f.write_char(';')?
                        }
                    }
                    CommentStyle::Shebang => f.write_str("#!")?,
                }
                f.write_str(s)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos(pub Token, pub Span);


fn try_u32_to_char(code: u32) -> Result<char, ParseError> {
    char::from_u32(code).ok_or(ParseError::InvalidCodePoint(code))
}

// c is a unicode code point
fn parse_hexdigit(c: u32) -> Option<u32> {
    if '0' as u32 <= c && c <= '9' as u32 {
        Some(c - '0' as u32)
    } else if 'a' as u32 <= c && c <= 'f' as u32 {
        Some(c - 'a' as u32 + 10)
    } else if 'A' as u32 <= c && c <= 'F' as u32 {
        Some(c - 'A' as u32 + 10)
    } else {
        None
    }
}

// s must be a hex string to the end or None is returned.
fn parse_as_hexstr(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 8 {
        return None
    }
    let mut n = 0;
    for b in s.bytes() {
        n = n * 16 + parse_hexdigit(b as u32)?;
    }
    Some(n)
}

fn is_surrogate_high(n: u32) -> bool {
    (0xD800..0xDC00).contains(&n)
}

fn is_surrogate_low(n: u32) -> bool {
    (0xDC00..0xE000).contains(&n)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Characters that end a symbol, number or character literal.
fn is_terminator(c: char) -> bool {
    is_separator(c)
        || maybe_open_close(c).is_some()
        || matches!(c, '"' | ';' | '\\' | '^')
}

fn is_constituent(c: char) -> bool {
    ! is_terminator(c)
}

/// Turns a character cursor into tokens. Yields nothing further after
/// the first error.
pub struct Tokenizer<I> {
    cs: I,
    modes: Modes,
    pushback: Option<(char, Pos)>,
    // position of the last character read
    lastpos: Pos,
    // byte offset after the last character consumed
    end: usize,
    // the source returned None already, don't call it again
    eof: bool,
    failed: bool,
    tmp: String,
}

impl<I> Tokenizer<I>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    pub fn new(cs: I, modes: Modes) -> Self {
        Tokenizer {
            cs,
            modes,
            pushback: None,
            lastpos: Pos::default(),
            end: 0,
            eof: false,
            failed: false,
            tmp: String::new(),
        }
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    fn getc(&mut self) -> Result<Option<(char, Pos)>, ParseErrorWithPos> {
        let cp = if let Some(cp) = self.pushback.take() {
            cp
        } else if self.eof {
            return Ok(None)
        } else {
            match self.cs.next() {
                None => {
                    self.eof = true;
                    return Ok(None)
                }
                Some(Err(e)) => return Err(ParseError::IOError(e).at(self.lastpos)),
                Some(Ok(cp)) => cp,
            }
        };
        self.lastpos = cp.1;
        self.end = cp.1.offset + cp.0.len_utf8();
        Ok(Some(cp))
    }

    fn ungetc(&mut self, c: char, pos: Pos) {
        self.end = pos.offset;
        self.pushback = Some((c, pos));
    }

    fn span_from(&self, start: Pos) -> Span {
        Span { start, len: self.end - start.offset }
    }

    /// Append characters to tmp while `accepted`; the first one not
    /// accepted is pushed back.
    fn read_while(&mut self, accepted: fn(char) -> bool)
                  -> Result<(), ParseErrorWithPos> {
        while let Some((c, pos)) = self.getc()? {
            if accepted(c) {
                self.tmp.push(c);
            } else {
                self.ungetc(c, pos);
                break;
            }
        }
        Ok(())
    }

    fn read_hex4(&mut self, startpos: Pos) -> Result<u32, ParseErrorWithPos> {
        let mut n = 0;
        for _ in 0..4 {
            match self.getc()? {
                None => return Err(ParseError::UnexpectedEOFInString.at(startpos)),
                Some((c, pos)) => {
                    let d = parse_hexdigit(c as u32)
                        .ok_or(ParseError::NonHexDigit(c)).at(pos)?;
                    n = n * 16 + d;
                }
            }
        }
        Ok(n)
    }

    // After `\u` in a string; combines UTF-16 surrogate pairs.
    fn read_unicode_escape(&mut self, startpos: Pos, pos: Pos)
                           -> Result<char, ParseErrorWithPos> {
        let n = self.read_hex4(startpos)?;
        if is_surrogate_high(n) {
            let mut low = None;
            if let Some((c, _)) = self.getc()? {
                if c == '\\' {
                    if let Some(('u', _)) = self.getc()? {
                        low = Some(self.read_hex4(startpos)?);
                    }
                }
            }
            match low {
                Some(l) if is_surrogate_low(l) => {
                    let code = 0x10000 + ((n - 0xD800) << 10) + (l - 0xDC00);
                    try_u32_to_char(code).at(pos)
                }
                _ => Err(ParseError::InvalidCodePoint(n).at(pos))
            }
        } else {
            try_u32_to_char(n).at(pos)
        }
    }

    // The opening quote has been read already.
    fn read_string(&mut self, startpos: Pos) -> Result<Atom, ParseErrorWithPos> {
        let mut out = String::new();
        loop {
            let (c, _) = match self.getc()? {
                Some(cp) => cp,
                None => return Err(ParseError::UnexpectedEOFInString.at(startpos)),
            };
            match c {
                '"' => return Ok(Atom::String(KString::from_string(out))),
                '\\' => {
                    let (e, epos) = match self.getc()? {
                        Some(cp) => cp,
                        None => return Err(ParseError::UnexpectedEOFInString
                                           .at(startpos)),
                    };
                    match e {
                        't' => out.push('\t'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        'b' => out.push('\x08'),
                        'f' => out.push('\x0C'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        'u' => {
                            let c = self.read_unicode_escape(startpos, epos)?;
                            out.push(c);
                        }
                        _ => return Err(ParseError::InvalidEscapedChar(e).at(epos))
                    }
                }
                _ => out.push(c),
            }
        }
    }

    // The backslash has been read already.
    fn read_char(&mut self, startpos: Pos) -> Result<Atom, ParseErrorWithPos> {
        let c0 = match self.getc()? {
            Some((c, _)) => c,
            None => return Err(ParseError::UnexpectedEOFAfter('\\').at(startpos)),
        };
        self.tmp.clear();
        self.tmp.push(c0);
        // whitespace has to be named (\space, \newline, ...)
        if c0.is_whitespace() {
            return Err(ParseError::InvalidCharacter(KString::from_ref(&self.tmp))
                       .at(startpos))
        }
        if is_constituent(c0) {
            self.read_while(is_constituent)?;
        }
        let mut cs = self.tmp.chars();
        cs.next();
        if cs.next().is_none() {
            return Ok(Atom::Char(c0))
        }
        if let Some(c) = name2char(&self.tmp) {
            return Ok(Atom::Char(c))
        }
        if c0 == 'u' && self.tmp.len() == 5 {
            if let Some(c) = parse_as_hexstr(&self.tmp[1..]).and_then(char::from_u32) {
                return Ok(Atom::Char(c))
            }
        }
        Err(ParseError::InvalidCharacter(KString::from_ref(&self.tmp)).at(startpos))
    }

    // The '#' has been read already.
    fn read_dispatch(&mut self, startpos: Pos)
                     -> Result<Option<Token>, ParseErrorWithPos> {
        let (c0, pos0) = match self.getc()? {
            Some(cp) => cp,
            None => return Err(ParseError::UnexpectedEOFAfter('#').at(startpos)),
        };
        match c0 {
            '{' => Ok(Some(Token::Open(Collkind::Set))),
            '_' => Ok(Some(Token::Discard)),
            '!' => {
                self.tmp.clear();
                self.read_while(|c| c != '\n')?;
                if self.modes.retain_comments {
                    Ok(Some(Token::Comment(CommentStyle::Shebang,
                                           KString::from_ref(&self.tmp))))
                } else {
                    Ok(None)
                }
            }
            '#' => {
                self.tmp.clear();
                self.read_while(is_constituent)?;
                let x = match self.tmp.as_str() {
                    "Inf" => f64::INFINITY,
                    "-Inf" => f64::NEG_INFINITY,
                    "NaN" => f64::NAN,
                    _ => return Err(ParseError::InvalidSymbolicValue(
                        KString::from_ref(&self.tmp)).at(pos0))
                };
                Ok(Some(Token::Atom(Atom::Number(Number::float(x)))))
            }
            c if c.is_alphabetic() => {
                self.tmp.clear();
                self.tmp.push(c);
                self.read_while(is_constituent)?;
                match Symbol::parse(&self.tmp) {
                    Ok(sym) => Ok(Some(Token::Tag(sym))),
                    Err(_) => Err(ParseError::InvalidTag(
                        KString::from_ref(&self.tmp)).at(startpos))
                }
            }
            _ => Err(ParseError::InvalidHashToken(c0).at(startpos))
        }
    }

    // Numbers, symbols, keywords, nil, true, false; c has been read
    // already.
    fn read_bare(&mut self, c: char, startpos: Pos)
                 -> Result<Atom, ParseErrorWithPos> {
        self.tmp.clear();
        self.tmp.push(c);
        self.read_while(is_constituent)?;
        let s = self.tmp.as_str();
        let second_is_digit = s[c.len_utf8()..].starts_with(|c: char| c.is_ascii_digit());
        if c.is_ascii_digit() || ((c == '-' || c == '+') && second_is_digit) {
            return read_number(s)
                .map(Atom::Number)
                .ok_or_else(|| ParseError::InvalidNumber(KString::from_ref(s)))
                .at(startpos)
        }
        match s {
            "nil" => return Ok(Atom::Nil),
            "true" => return Ok(Atom::Bool(true)),
            "false" => return Ok(Atom::Bool(false)),
            _ => {}
        }
        Symbol::parse(s).map(Atom::Symbol).at(startpos)
    }

    /// The next token, or None at end of input.
    pub fn next_token(&mut self) -> Result<Option<TokenWithPos>, ParseErrorWithPos> {
        loop {
            let (c, pos) = match self.getc()? {
                Some(cp) => cp,
                None => return Ok(None),
            };
            let t = if is_separator(c) {
                continue
            } else if let Some(t) = maybe_open_close(c) {
                t
            } else if c == ';' {
                self.tmp.clear();
                self.tmp.push(c);
                self.read_while(|c| c != '\n')?;
                if ! self.modes.retain_comments {
                    continue
                }
                let (start, rest) = take_while_and_rest(&self.tmp, |c| c == ';');
                let nsemi = u8::try_from(start.len()).unwrap_or(u8::MAX);
                Token::Comment(CommentStyle::Singleline(nsemi), KString::from_ref(rest))
            } else if c == '"' {
                Token::Atom(self.read_string(pos)?)
            } else if c == '\\' {
                Token::Atom(self.read_char(pos)?)
            } else if c == '^' {
                Token::Meta
            } else if c == '#' {
                match self.read_dispatch(pos)? {
                    Some(t) => t,
                    None => continue,
                }
            } else {
                Token::Atom(self.read_bare(c, pos)?)
            };
            return Ok(Some(TokenWithPos(t, self.span_from(pos))))
        }
    }
}

impl<I> Iterator for Tokenizer<I>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    type Item = Result<TokenWithPos, ParseErrorWithPos>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None
        }
        match self.next_token() {
            Ok(Some(t)) => Some(Ok(t)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Tokenize `cs`: returns an iterator of tokens with their spans.
pub fn parse<I>(cs: I, modes: Modes) -> Tokenizer<I>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    Tokenizer::new(cs, modes)
}
