// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Holding the static information about the source of a stream
//! (i.e. other than position), for error messages.

use crate::pos::Pos;
use std::{path::PathBuf, fmt::{Formatter, Debug, Display}};

pub trait Context : Debug + Send + Sync {
    /// Name the source, e.g. a quoted path. Used before a colon and
    /// the error reason, and after the preposition.
    fn describe(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error>;

    /// "in" for files, "from" for streams.
    fn preposition(&self) -> &'static str {
        "in"
    }

    /// Format the location to be put *after* the error reason and a
    /// space; the position is only known for readers in debug mode.
    fn locate(&self, pos: Option<Pos>, f: &mut Formatter<'_>)
              -> Result<(), std::fmt::Error> {
        f.write_str(self.preposition())?;
        f.write_str(" ")?;
        self.describe(f)?;
        if let Some(pos) = pos {
            Display::fmt(&pos, f)?;
        }
        Ok(())
    }

    fn to_string_without_pos(&self) -> String {
        format!("{}", &Described(self))
    }
}

// Formatter::new is inaccessible, go through Display
struct Described<'t, T: Context + ?Sized>(&'t T);
impl<'t, T: Context + ?Sized> Display for Described<'t, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        self.0.describe(f)
    }
}


#[derive(Debug)]
pub struct FileContext {
    pub path: PathBuf
}

impl Context for FileContext {
    fn describe(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("{:?}", &self.path))
    }
}

/// A source that isn't a file, e.g. standard input or a socket.
#[derive(Debug)]
pub struct SpecialContext {
    name: String
}

impl SpecialContext {
    pub fn new(name: impl Into<String>) -> SpecialContext {
        SpecialContext { name: name.into() }
    }
}

impl Context for SpecialContext {
    fn describe(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("({})", &self.name))
    }

    fn preposition(&self) -> &'static str {
        "from"
    }
}
