// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Eq;
use std::fmt::Display;

/// Both line and col are zero based; Emacs uses 1-based line
/// numbering, so line is incremented by 1 in Display. `offset` is
/// the byte offset from the start of the input.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
    pub offset: usize,
}

impl Pos {
    /// The position after `c`, which is at `self`.
    pub fn after(self, c: char) -> Pos {
        if c == '\n' {
            Pos { line: self.line + 1, col: 0, offset: self.offset + 1 }
        } else {
            Pos {
                line: self.line,
                col: self.col + 1,
                offset: self.offset + c.len_utf8()
            }
        }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        // This, when prefixed with a Debug style path string, is
        // following the Emacs convention for location information.
        f.write_fmt(format_args!("@{}.{}", self.line + 1, self.col))
    }
}

/// A token's or form's extent in the source: its start position and
/// its length in bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Span {
    pub start: Pos,
    pub len: usize,
}

impl Span {
    pub fn end_offset(&self) -> usize {
        self.start.offset + self.len
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        self.start.fmt(f)
    }
}

/// The span of a form, and the trees of the forms inside it in source
/// order: map entries as key, value, key, value, ...; a tagged form
/// has its payload as the only item. Discarded forms and metadata
/// leave no trace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PosTree {
    pub span: Span,
    pub items: Vec<PosTree>,
}

impl PosTree {
    pub fn leaf(span: Span) -> PosTree {
        PosTree { span, items: Vec::new() }
    }

    /// The tree at `path`, one item index per level.
    pub fn get(&self, path: &[usize]) -> Option<&PosTree> {
        let mut t = self;
        for i in path {
            t = t.items.get(*i)?;
        }
        Some(t)
    }
}
