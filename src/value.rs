// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime data types representing an EDN value.

//! [Atom](Atom) is what the tokenizer produces for scalars,
//! [Value](Value) adds the collections, tagged literals whose tag has
//! no handler ([Tagged](Tagged)) and objects constructed by tag
//! handlers ([Object](Object)). The `Display` implementations print
//! EDN that reads back to an equal value.

use crate::{number::Number, symbol::Symbol, list::List, pos::PosTree};
use kstring::KString;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Write};
use std::hash::{Hash, Hasher};
use std::sync::Arc;


#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    Nil,
    Bool(bool),
    Char(char),
    String(KString),
    Symbol(Symbol), // includes keywords
    Number(Number),
}

pub fn char2name(c: char) -> Option<&'static str> {
    match c {
        '\n' => Some("newline"),
        '\r' => Some("return"),
        ' ' => Some("space"),
        '\t' => Some("tab"),
        '\x0C' => Some("formfeed"),
        '\x08' => Some("backspace"),
        _ => None
    }
}
pub fn name2char(s: &str) -> Option<char> {
    match s {
        "newline" => Some('\n'),
        "return" => Some('\r'),
        "space" => Some(' '),
        "tab" => Some('\t'),
        "formfeed" => Some('\x0C'),
        "backspace" => Some('\x08'),
        _ => None
    }
}

fn fmt_string(f: &mut std::fmt::Formatter<'_>, s: &str)
              -> Result<(), std::fmt::Error> {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\x08' => f.write_str("\\b")?,
            '\x0C' => f.write_str("\\f")?,
            c if c.is_control() =>
                f.write_fmt(format_args!("\\u{:04x}", c as u32))?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        match self {
            Atom::Nil => f.write_str("nil"),
            Atom::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Atom::Char(c) => {
                f.write_char('\\')?;
                if let Some(name) = char2name(*c) {
                    f.write_str(name)
                } else if c.is_control() || c.is_whitespace() {
                    f.write_fmt(format_args!("u{:04x}", *c as u32))
                } else {
                    f.write_char(*c)
                }
            }
            Atom::String(s) => fmt_string(f, s),
            Atom::Symbol(s) => s.fmt(f),
            Atom::Number(n) => n.fmt(f),
        }
    }
}


/// The kinds of closing delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parenkind {
    Round,
    Square,
    Curly
}

impl Parenkind {
    pub fn opening(self) -> char {
        match self {
            Parenkind::Round => '(',
            Parenkind::Square => '[',
            Parenkind::Curly => '{'
        }
    }
    pub fn closing(self) -> char {
        match self {
            Parenkind::Round => ')',
            Parenkind::Square => ']',
            Parenkind::Curly => '}'
        }
    }
}

/// The kinds of collections, i.e. of opening delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collkind {
    List,
    Vector,
    Map,
    Set,
}

impl Collkind {
    pub fn opening(self) -> &'static str {
        match self {
            Collkind::List => "(",
            Collkind::Vector => "[",
            Collkind::Map => "{",
            Collkind::Set => "#{",
        }
    }
    pub fn parenkind(self) -> Parenkind {
        match self {
            Collkind::List => Parenkind::Round,
            Collkind::Vector => Parenkind::Square,
            Collkind::Map | Collkind::Set => Parenkind::Curly,
        }
    }
}


/// A tagged literal whose tag had no handler, read in non-strict
/// mode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tagged {
    pub tag: Symbol,
    pub value: Box<Value>,
}

/// Domain objects built by tag handlers. The tag and payload are what
/// the object is written back as, and what equality, ordering and
/// hashing of [Object](Object) is based on.
pub trait TaggedObject: std::fmt::Debug + Send + Sync + 'static {
    fn tag(&self) -> Symbol;
    fn payload(&self) -> Value;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone)]
pub struct Object(pub Arc<dyn TaggedObject>);

impl Object {
    pub fn new(obj: impl TaggedObject) -> Object {
        Object(Arc::new(obj))
    }

    pub fn downcast_ref<T: TaggedObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    fn key(&self) -> (Symbol, Value) {
        (self.0.tag(), self.0.payload())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.key() == other.key()
    }
}

impl Eq for Object {}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Object) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object {
    fn cmp(&self, other: &Object) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}


#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Atom(Atom),
    List(List),
    Vector(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Set(BTreeSet<Value>),
    Tagged(Tagged),
    Object(Object),
}

impl Value {
    pub fn at(self, pos: Option<PosTree>) -> ValueWithPos {
        ValueWithPos(self, pos)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Atom(Atom::Nil))
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Atom(Atom::Symbol(s)) => Some(s),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Atom(Atom::String(s)) => Some(s),
            _ => None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Atom(Atom::Number(n)) => n.as_i64(),
            _ => None
        }
    }
}

impl From<Atom> for Value {
    fn from(a: Atom) -> Value {
        Value::Atom(a)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Atom(Atom::Number(Number::Integer(n)))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Atom(Atom::Number(Number::float(x)))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Atom(Atom::Bool(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Atom(Atom::String(KString::from_ref(s)))
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Value {
        Value::Atom(Atom::Symbol(s))
    }
}

impl From<List> for Value {
    fn from(l: List) -> Value {
        Value::List(l)
    }
}

/// Easily create a symbol
pub fn symbol(s: &str) -> Value {
    Value::Atom(Atom::Symbol(Symbol::new(None, s)))
}

/// Easily create a keyword (without namespace)
pub fn keyword(s: &str) -> Value {
    Value::Atom(Atom::Symbol(Symbol::keyword(None, s)))
}

fn fmt_seq<'v>(f: &mut std::fmt::Formatter<'_>,
               open: &str,
               items: impl Iterator<Item = &'v Value>,
               close: char)
               -> Result<(), std::fmt::Error> {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        item.fmt(f)?;
    }
    f.write_char(close)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        match self {
            Value::Atom(a) => a.fmt(f),
            Value::List(l) => fmt_seq(f, "(", l.iter(), ')'),
            Value::Vector(v) => fmt_seq(f, "[", v.iter(), ']'),
            Value::Set(s) => fmt_seq(f, "#{", s.iter(), '}'),
            Value::Map(m) => {
                f.write_char('{')?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_fmt(format_args!("{} {}", k, v))?;
                }
                f.write_char('}')
            }
            Value::Tagged(Tagged { tag, value }) =>
                f.write_fmt(format_args!("#{} {}", tag, value)),
            Value::Object(o) =>
                f.write_fmt(format_args!("#{} {}", o.0.tag(), o.0.payload())),
        }
    }
}

/// A value together with where it and the forms inside it were read
/// from (only known in debug mode).
#[derive(Debug, Clone)]
pub struct ValueWithPos(pub Value, pub Option<PosTree>);

impl std::fmt::Display for ValueWithPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        self.0.fmt(f)
    }
}
