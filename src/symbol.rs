// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Namespaced identifiers. A keyword is a symbol with the `keyword`
//! flag set, so everything that works on symbols works on keywords,
//! too.

use crate::parse::ParseError;
use kstring::KString;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    // keyword first so that symbols sort before keywords
    keyword: bool,
    ns: Option<KString>,
    name: KString,
}

impl Symbol {
    /// Build a symbol without validating the parts; see `parse` for
    /// the checked variant.
    pub fn new(ns: Option<&str>, name: &str) -> Symbol {
        Symbol {
            keyword: false,
            ns: ns.map(KString::from_ref),
            name: KString::from_ref(name),
        }
    }

    /// Unchecked, like `new`.
    pub fn keyword(ns: Option<&str>, name: &str) -> Symbol {
        Symbol { keyword: true, ..Symbol::new(ns, name) }
    }

    /// Parse the text of a symbol (`foo`, `a.b/foo`) or keyword
    /// (`:foo`, `:a.b/foo`).
    pub fn parse(s: &str) -> Result<Symbol, ParseError> {
        if let Some(rest) = s.strip_prefix(':') {
            let (ns, name) = split_identifier(rest, true)
                .ok_or_else(|| ParseError::InvalidKeyword(KString::from_ref(s)))?;
            Ok(Symbol::keyword(ns, name))
        } else {
            let (ns, name) = split_identifier(s, false)
                .ok_or_else(|| ParseError::InvalidSymbol(KString::from_ref(s)))?;
            Ok(Symbol::new(ns, name))
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_keyword(&self) -> bool {
        self.keyword
    }

    /// The same identifier as a plain symbol.
    pub fn to_symbol(&self) -> Symbol {
        Symbol { keyword: false, ..self.clone() }
    }

    /// The same identifier as a keyword.
    pub fn to_keyword(&self) -> Symbol {
        Symbol { keyword: true, ..self.clone() }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        if self.keyword {
            f.write_char(':')?;
        }
        if let Some(ns) = &self.ns {
            f.write_str(ns)?;
            f.write_char('/')?;
        }
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for Symbol {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Symbol, ParseError> {
        Symbol::parse(s)
    }
}

/// Characters that may appear in a symbol, other than alphanumerics.
fn is_symbol_punctuation(c: char) -> bool {
    matches!(c, '.' | '*' | '+' | '!' | '-' | '_' | '?' | '$' | '%'
             | '&' | '=' | '<' | '>' | ':' | '#' | '\'')
}

fn is_name_part(s: &str) -> bool {
    let mut cs = s.chars();
    let c0 = match cs.next() {
        Some(c) => c,
        None => return false,
    };
    if c0.is_numeric() || matches!(c0, ':' | '#' | '\'') {
        return false
    }
    if matches!(c0, '-' | '+' | '.') {
        if let Some(c1) = s[1..].chars().next() {
            if c1.is_numeric() {
                return false
            }
        }
    }
    s.chars().all(|c| c.is_alphanumeric() || is_symbol_punctuation(c))
}

/// Split `s` into namespace and name, checking both. `s` excludes
/// the leading colon of keywords.
pub(crate) fn split_identifier(s: &str, keyword: bool)
                               -> Option<(Option<&str>, &str)> {
    if s == "/" {
        // the division symbol; there's no `:/` keyword though
        return if keyword { None } else { Some((None, s)) }
    }
    if let Some(ns) = s.strip_suffix("//") {
        // `clojure.core//`
        return if is_name_part(ns) { Some((Some(ns), "/")) } else { None }
    }
    match s.find('/') {
        None => {
            if is_name_part(s) { Some((None, s)) } else { None }
        }
        Some(i) => {
            let (ns, name) = (&s[..i], &s[i + 1..]);
            if is_name_part(ns) && is_name_part(name) {
                Some((Some(ns), name))
            } else {
                None
            }
        }
    }
}
