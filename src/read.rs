// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Building values from the token stream.
//!
//! A [Reader](Reader) pulls one top-level form at a time out of a
//! tokenizer. Open collections and prefixes are kept on a stack of
//! frames on the heap, at most `Settings::depth_limit` of them; the
//! prefixes `#_`, `^` and `#tag` each take exactly one following
//! form. Errors end the stream: a reader that failed, or reached the
//! end of input, returns nothing further.

use crate::buffered_chars::{buffered_chars, StrChars};
use crate::context::{self, Context};
use crate::error::ErrorKind;
use crate::list::List;
use crate::parse::{Token, TokenWithPos, Tokenizer, ParseError, ParseErrorWithPos};
use crate::pos::{Pos, Span, PosTree};
use crate::registry::{self, RegistryError, TagError};
use crate::root::Root;
use crate::settings::{Settings, MULTIPLE};
use crate::symbol::Symbol;
use crate::value::{Value, ValueWithPos, Atom, Tagged, Parenkind, Collkind};
use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};
use std::fmt::{Formatter, Display};
use std::io::{Read, Write};
use std::path::Path;
use std::fs::File;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("{0}")]
    PE(ParseError),
    #[error("nesting too deep")]
    NestingTooDeep,
    #[error("'{}' {1} expects '{}', got '{}'",
            .0.opening(), .0.parenkind().closing(), .2.closing())]
    ParenMismatch(Collkind, Pos, Parenkind),
    #[error("unexpected closing character '{}'", .0.closing())]
    UnexpectedClosingParen(Parenkind),
    #[error("premature EOF while expecting closing character '{}' for '{}'",
            .0.parenkind().closing(), .0.opening())]
    PrematureEofExpectingClosingParen(Collkind),
    #[error("missing form after '{0}'")]
    MissingFormAfter(&'static str),
    #[error("expecting a form after '{0}', got '{}'", .1.closing())]
    ClosingAfterPrefix(&'static str, Parenkind),
    #[error("map literal with odd number of forms ({0})")]
    OddMapArity(usize),
    #[error("duplicate map key {0}")]
    DuplicateMapKey(Value),
    #[error("duplicate set element {0}")]
    DuplicateSetElement(Value),
    #[error("metadata must be a map, symbol, keyword or string, got {0}")]
    InvalidMetadata(Value),
    #[error("no handler registered for tag #{0}")]
    UnregisteredTag(Symbol),
    #[error("invalid payload for tag #{0}: {1}")]
    InvalidTagPayload(Symbol, TagError),
    #[error("{0}")]
    Registry(RegistryError),
}

impl ReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::PE(e) => e.kind(),
            ReadError::NestingTooDeep => ErrorKind::NestingTooDeep,
            ReadError::ParenMismatch(..)
                | ReadError::UnexpectedClosingParen(_)
                | ReadError::ClosingAfterPrefix(..) => ErrorKind::UnmatchedDelimiter,
            ReadError::PrematureEofExpectingClosingParen(_)
                | ReadError::MissingFormAfter(_) => ErrorKind::UnexpectedEOF,
            ReadError::OddMapArity(_) => ErrorKind::OddMapArity,
            ReadError::DuplicateMapKey(_) => ErrorKind::DuplicateMapKey,
            ReadError::DuplicateSetElement(_) => ErrorKind::DuplicateSetElement,
            ReadError::InvalidMetadata(_) => ErrorKind::InvalidMetadata,
            ReadError::UnregisteredTag(_) => ErrorKind::UnregisteredTag,
            ReadError::InvalidTagPayload(..) => ErrorKind::InvalidTagPayload,
            ReadError::Registry(e) => e.kind(),
        }
    }

    fn at(self, span: Option<Span>) -> ReadErrorWithPos {
        ReadErrorWithPos {
            err: self,
            pos: span
        }
    }
}

/// A read error, located if the reader was in debug mode.
#[derive(Error, Debug)]
pub struct ReadErrorWithPos {
    pub err: ReadError,
    pub pos: Option<Span>
}

impl Display for ReadErrorWithPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.pos {
            Some(span) => f.write_fmt(format_args!("{} {}", self.err, span)),
            None => f.write_fmt(format_args!("{}", self.err)),
        }
    }
}

impl ReadErrorWithPos {
    pub fn kind(&self) -> ErrorKind {
        self.err.kind()
    }

    /// Add information about the source (file name etc.)
    pub fn with_context(self, container: Box<dyn Context>) -> ReadErrorWithLocation {
        ReadErrorWithLocation::PC(Box::new(ReadErrorWithPosContext {
            err_with_pos: self,
            container,
        }))
    }
}

#[derive(Error, Debug)]
pub struct ReadErrorWithPosContext {
    err_with_pos: ReadErrorWithPos,
    container: Box<dyn Context>
}

impl Display for ReadErrorWithPosContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("{} ",
                                 self.err_with_pos.err))?;
        self.container.locate(self.err_with_pos.pos.map(|span| span.start), f)
    }
}

impl From<ParseErrorWithPos> for ReadErrorWithPos {
    fn from(ep: ParseErrorWithPos) -> ReadErrorWithPos {
        let ParseErrorWithPos { err, pos } = ep;
        ReadErrorWithPos {
            err: ReadError::PE(err),
            pos: Some(Span { start: pos, len: 0 })
        }
    }
}

#[derive(Error, Debug)]
pub enum ReadErrorWithContext {
    #[error("{}: {0}", .1.to_string_without_pos())]
    IO(std::io::Error, Box<dyn Context>)
}

#[derive(Error, Debug)]
pub enum ReadErrorWithLocation {
    #[error("{0}")]
    PC(Box<ReadErrorWithPosContext>),
    #[error("{0}")]
    IO(Box<ReadErrorWithContext>)
}

impl ReadErrorWithLocation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadErrorWithLocation::PC(e) => e.err_with_pos.kind(),
            ReadErrorWithLocation::IO(_) => ErrorKind::Io,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// More forms may follow.
    Ready,
    /// End of input reached.
    Done,
    /// An error was returned; nothing more is read.
    Failed,
}

enum Step {
    Form(Value, PosTree),
    Close(Parenkind, Span),
    Eof,
}

enum Prefix {
    /// `#_`
    Discard,
    /// `^`; true once the metadata form has been read
    Meta(bool),
    /// `#tag`
    Tag(Symbol),
}

impl Prefix {
    fn name(&self) -> &'static str {
        match self {
            Prefix::Discard => "#_",
            Prefix::Meta(_) => "^",
            Prefix::Tag(_) => "#",
        }
    }
}

struct OpenColl {
    ck: Collkind,
    open: Span,
    items: Vec<Value>,
    // only filled in debug mode
    trees: Vec<PosTree>,
}

// Something waiting for the forms that follow it.
enum Frame {
    Coll(OpenColl),
    Prefix(Prefix, Span),
}

fn join(a: Span, b: Span) -> Span {
    Span { start: a.start, len: b.end_offset() - a.start.offset }
}

pub struct Reader<I> {
    ts: Tokenizer<I>,
    settings: Settings,
    state: ReaderState,
}

impl<I> Reader<I>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    pub fn new(cs: I, settings: Settings) -> Self {
        let settings = Settings { modes: settings.modes.normalized(), ..settings };
        Reader {
            ts: Tokenizer::new(cs, settings.modes),
            settings,
            state: ReaderState::Ready,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    // Only tell about positions in debug mode.
    fn pos(&self, span: Span) -> Option<Span> {
        if self.settings.modes.debug { Some(span) } else { None }
    }

    fn next_token(&mut self) -> Result<Option<TokenWithPos>, ReadErrorWithPos> {
        loop {
            match self.ts.next_token() {
                Ok(Some(TokenWithPos(Token::Comment(..), _))) => continue,
                Ok(t) => return Ok(t),
                Err(e) => {
                    let mut e = ReadErrorWithPos::from(e);
                    if ! self.settings.modes.debug {
                        e.pos = None;
                    }
                    return Err(e)
                }
            }
        }
    }

    // Read tokens until a whole top-level form is complete. Open
    // collections and prefixes wait on `stack`, so the nesting depth
    // of the input does not use up the call stack.
    fn step(&mut self) -> Result<Step, ReadErrorWithPos> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let TokenWithPos(t, span) = match self.next_token()? {
                Some(t) => t,
                None => return match stack.last() {
                    None => Ok(Step::Eof),
                    Some(Frame::Coll(c)) =>
                        Err(ReadError::PrematureEofExpectingClosingParen(c.ck)
                            .at(self.pos(c.open))),
                    Some(Frame::Prefix(p, pspan)) =>
                        Err(ReadError::MissingFormAfter(p.name()).at(self.pos(*pspan))),
                }
            };
            let opens = ! matches!(t, Token::Atom(_) | Token::Close(_) | Token::Comment(..));
            if opens && stack.len() >= self.settings.depth_limit as usize {
                return Err(ReadError::NestingTooDeep.at(self.pos(span)))
            }
            let (v, tree) = match t {
                Token::Comment(..) => continue,
                Token::Atom(a) => (Value::Atom(a), PosTree::leaf(span)),
                Token::Open(ck) => {
                    stack.push(Frame::Coll(OpenColl {
                        ck, open: span, items: Vec::new(), trees: Vec::new()
                    }));
                    continue
                }
                Token::Discard => {
                    stack.push(Frame::Prefix(Prefix::Discard, span));
                    continue
                }
                Token::Meta => {
                    stack.push(Frame::Prefix(Prefix::Meta(false), span));
                    continue
                }
                Token::Tag(tag) => {
                    stack.push(Frame::Prefix(Prefix::Tag(tag), span));
                    continue
                }
                Token::Close(pk) => match stack.pop() {
                    None => return Ok(Step::Close(pk, span)),
                    Some(Frame::Coll(OpenColl { ck, open, items, trees })) => {
                        if pk != ck.parenkind() {
                            return Err(ReadError::ParenMismatch(ck, open.start, pk)
                                       .at(self.pos(span)))
                        }
                        let v = build(ck, items).map_err(|e| e.at(self.pos(open)))?;
                        (v, PosTree { span: join(open, span), items: trees })
                    }
                    Some(Frame::Prefix(p, _)) =>
                        return Err(ReadError::ClosingAfterPrefix(p.name(), pk)
                                   .at(self.pos(span))),
                }
            };
            if let Some((v, tree)) = self.deliver(&mut stack, v, tree)? {
                return Ok(Step::Form(v, tree))
            }
        }
    }

    // Hand a finished form to whatever is waiting for it, outwards as
    // far as that completes more forms. Returns the form if nothing
    // is left waiting.
    fn deliver(&self, stack: &mut Vec<Frame>, v: Value, tree: PosTree)
               -> Result<Option<(Value, PosTree)>, ReadErrorWithPos> {
        let debug = self.settings.modes.debug;
        let (mut v, mut tree) = (v, tree);
        loop {
            match stack.pop() {
                None => return Ok(Some((v, tree))),
                Some(Frame::Coll(mut c)) => {
                    c.items.push(v);
                    if debug {
                        c.trees.push(tree);
                    }
                    stack.push(Frame::Coll(c));
                    return Ok(None)
                }
                Some(Frame::Prefix(Prefix::Discard, _)) => return Ok(None),
                Some(Frame::Prefix(Prefix::Meta(false), pspan)) => {
                    // ^:kw and ^sym are shorthands for maps; the
                    // metadata itself is not kept
                    if ! matches!(v, Value::Map(_)
                                  | Value::Atom(Atom::Symbol(_))
                                  | Value::Atom(Atom::String(_))) {
                        return Err(ReadError::InvalidMetadata(v).at(self.pos(tree.span)))
                    }
                    stack.push(Frame::Prefix(Prefix::Meta(true), pspan));
                    return Ok(None)
                }
                Some(Frame::Prefix(Prefix::Meta(true), pspan)) => {
                    tree.span = join(pspan, tree.span);
                }
                Some(Frame::Prefix(Prefix::Tag(tag), pspan)) => {
                    trace!(target: "ednread::read", %tag, payload = %tree.span,
                           "tagged form");
                    v = self.apply_tag(tag, v, pspan)?;
                    let payload = tree;
                    tree = PosTree {
                        span: join(pspan, payload.span),
                        items: if debug { vec![payload] } else { Vec::new() },
                    };
                }
            }
        }
    }

    fn apply_tag(&self, tag: Symbol, payload: Value, span: Span)
                 -> Result<Value, ReadErrorWithPos> {
        let local = self.settings.registry.as_ref().and_then(|r| r.lookup(&tag));
        let handler = match local {
            Some(h) => Some(h),
            None => registry::lookup(&tag)
                .map_err(|e| ReadError::Registry(e).at(self.pos(span)))?,
        };
        match handler {
            Some(h) => {
                trace!(target: "ednread::read", %tag, "calling tag handler");
                (*h)(payload).map_err(|e| ReadError::InvalidTagPayload(tag, e)
                                   .at(self.pos(span)))
            }
            None if self.settings.modes.strict =>
                Err(ReadError::UnregisteredTag(tag).at(self.pos(span))),
            None => Ok(Value::Tagged(Tagged { tag, value: Box::new(payload) })),
        }
    }

    /// Read the next top-level form; `Ok(None)` at the end of input,
    /// and after an error has been returned. In debug mode the form
    /// comes with the spans of itself and of everything inside it.
    pub fn read_with_pos(&mut self) -> Result<Option<ValueWithPos>, ReadErrorWithPos> {
        if self.state != ReaderState::Ready {
            return Ok(None)
        }
        match self.step() {
            Ok(Step::Form(v, tree)) => {
                trace!(target: "ednread::read", start = %tree.span.start,
                       len = tree.span.len, "read top-level form");
                let pos = if self.settings.modes.debug { Some(tree) } else { None };
                Ok(Some(v.at(pos)))
            }
            Ok(Step::Eof) => {
                self.state = ReaderState::Done;
                trace!(target: "ednread::read", "end of input");
                Ok(None)
            }
            Ok(Step::Close(pk, span)) => {
                self.state = ReaderState::Failed;
                Err(ReadError::UnexpectedClosingParen(pk).at(self.pos(span)))
            }
            Err(e) => {
                self.state = ReaderState::Failed;
                debug!(target: "ednread::read", error = %e, "read failed");
                Err(e)
            }
        }
    }

    pub fn read(&mut self) -> Result<Option<Value>, ReadErrorWithPos> {
        Ok(self.read_with_pos()?.map(|ValueWithPos(v, _)| v))
    }
}

impl<I> Iterator for Reader<I>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    type Item = Result<Value, ReadErrorWithPos>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

fn build(ck: Collkind, items: Vec<Value>) -> Result<Value, ReadError> {
    match ck {
        Collkind::List => Ok(Value::List(items.into_iter().collect::<List>())),
        Collkind::Vector => Ok(Value::Vector(items)),
        Collkind::Map => {
            if items.len() % 2 != 0 {
                return Err(ReadError::OddMapArity(items.len()))
            }
            let mut m = BTreeMap::new();
            let mut items = items.into_iter();
            while let (Some(k), Some(v)) = (items.next(), items.next()) {
                match m.entry(k) {
                    Entry::Vacant(e) => { e.insert(v); }
                    Entry::Occupied(e) =>
                        return Err(ReadError::DuplicateMapKey(e.key().clone())),
                }
            }
            Ok(Value::Map(m))
        }
        Collkind::Set => {
            let mut s = BTreeSet::new();
            for v in items {
                if s.contains(&v) {
                    return Err(ReadError::DuplicateSetElement(v))
                }
                s.insert(v);
            }
            Ok(Value::Set(s))
        }
    }
}


/// The result of reading: a single value (None for empty input) in
/// single-object mode, a `Root` otherwise.
#[derive(Debug)]
pub enum Parsed {
    Value(Option<Value>),
    Root(Root),
}

impl Parsed {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Parsed::Value(v) => v,
            Parsed::Root(_) => None,
        }
    }

    pub fn into_root(self) -> Option<Root> {
        match self {
            Parsed::Value(_) => None,
            Parsed::Root(r) => Some(r),
        }
    }
}

/// Read a single form; whatever follows it is left unread.
pub fn read_one<I>(cs: I, settings: Settings) -> Result<Option<Value>, ReadErrorWithPos>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    Reader::new(cs, settings).read()
}

/// Read all forms right away. Forms before the first error stay
/// accessible in the returned root; the error is kept in it, too.
pub fn read_root_eager<I>(cs: I, settings: Settings) -> Root
    where I: Iterator<Item = anyhow::Result<(char, Pos)>>
{
    let mut vals = Vec::new();
    let mut failure = None;
    for r in Reader::new(cs, settings) {
        match r {
            Ok(v) => vals.push(v),
            Err(e) => failure = Some(e),
        }
    }
    debug!(target: "ednread::read", forms = vals.len(), failed = failure.is_some(),
           "read all forms");
    Root::with_failure(vals, failure)
}

/// A root whose forms are read from `cs` as they are accessed.
pub fn read_root_lazy<I>(cs: I, settings: Settings) -> Root
    where I: Iterator<Item = anyhow::Result<(char, Pos)>> + Send + 'static
{
    Root::new(Reader::new(cs, settings))
}

/// Read forms into a root, lazily or eagerly depending on
/// `settings.modes.lazy_parsing`.
pub fn read_root<I>(cs: I, settings: Settings) -> Root
    where I: Iterator<Item = anyhow::Result<(char, Pos)>> + Send + 'static
{
    if settings.modes.lazy_parsing {
        read_root_lazy(cs, settings)
    } else {
        read_root_eager(cs, settings)
    }
}

/// Read from `cs` in the mode `settings` ask for.
pub fn read_chars<I>(cs: I, settings: Settings) -> Result<Parsed, ReadErrorWithPos>
    where I: Iterator<Item = anyhow::Result<(char, Pos)>> + Send + 'static
{
    let settings = Settings { modes: settings.modes.normalized(), ..settings };
    if settings.modes.multiple_objects {
        Ok(Parsed::Root(read_root(cs, settings)))
    } else {
        Ok(Parsed::Value(read_one(cs, settings)?))
    }
}

pub fn read_str(s: &str, settings: Settings) -> Result<Parsed, ReadErrorWithPos> {
    read_chars(StrChars::new(s.to_owned()), settings)
}

pub fn read_stream<R>(fh: R, settings: Settings) -> Result<Parsed, ReadErrorWithPos>
    where R: Read + Send + 'static
{
    read_chars(buffered_chars(fh), settings)
}

/// Read all forms from `fh`, failing on the first error.
pub fn read_all(
    fh: impl Read,
) -> Result<Vec<Value>, ReadErrorWithPos>
{
    let mut settings = Settings::new(MULTIPLE);
    settings.modes.debug = true;
    Reader::new(buffered_chars(fh), settings).collect()
}

pub fn read_file(path: &Path, settings: Settings) -> Result<Parsed, ReadErrorWithLocation> {
    let fh = File::open(path).map_err(|e| ReadErrorWithLocation::IO(Box::new(
        ReadErrorWithContext::IO(
            e,
            Box::new(context::FileContext { path: path.to_path_buf() })))))?;
    read_stream(fh, settings).map_err(
        |e| e.with_context(Box::new(context::FileContext { path: path.to_path_buf() })))
}

pub fn write_all<'t>(
    out: impl Write,
    vals: impl IntoIterator<Item = &'t Value>
) -> Result<(), std::io::Error> {
    let mut out = out; // for `File`
    for v in vals.into_iter() {
        writeln!(out, "{}", v)?;
    }
    out.flush()
}

pub fn write_file<'t>(path: &Path, vals: impl IntoIterator<Item = &'t Value>)
                      -> Result<(), std::io::Error> {
    write_all(File::create(path)?, vals)
}
