// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Get characters and their positions from anything implementing
//! `Read`, or from text already in memory. Both produce the cursor
//! the tokenizer consumes: an iterator of `(char, Pos)`, ending at
//! end of input.

use crate::pos::Pos;
use std::io::{self, Read};
use anyhow::{Result, anyhow};
use utf8::BufReadDecoder;
use genawaiter::sync::Gen;


/// Decode `fh` as UTF-8 lazily; reading only happens as the
/// iterator is advanced, so this can sit on top of a socket or pipe.
/// The iterator is `Send` if `fh` is, which lazy roots rely on.
pub fn buffered_chars<R>(
    fh: R
) -> impl Iterator<Item=Result<(char, Pos)>>
    where R: Read
{
    Gen::new(|co| async move {
        let mut inp = BufReadDecoder::new(io::BufReader::new(fh));
        let mut pos = Pos::default();
        loop {
            if let Some(r) = inp.next_strict() {
                match r {
                    Ok(x) => {
                        for c in x.chars() {
                            co.yield_(Ok((c, pos))).await;
                            pos = pos.after(c);
                        }
                    },
                    Err(e) => {
                        co.yield_(Err(anyhow!("buffered_chars: {}", e))).await;
                        return;
                    }
                }
            } else {
                return;
            }
        }
    }).into_iter()
}


/// Characters of an in-memory string, owned (`String`) or borrowed
/// (`&str`).
#[derive(Debug, Clone)]
pub struct StrChars<S> {
    src: S,
    pos: Pos,
}

impl<S: AsRef<str>> StrChars<S> {
    pub fn new(src: S) -> Self {
        StrChars { src, pos: Pos::default() }
    }
}

impl<S: AsRef<str>> Iterator for StrChars<S> {
    type Item = Result<(char, Pos)>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.src.as_ref()[self.pos.offset..].chars().next()?;
        let pos = self.pos;
        self.pos = pos.after(c);
        Some(Ok((c, pos)))
    }
}
