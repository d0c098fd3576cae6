// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Coarse classification of all errors of this crate. The detailed
//! error types live with the code raising them (`parse::ParseError`,
//! `read::ReadError`, ...), each offers a `kind()` method mapping to
//! this.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    MalformedString,
    MalformedCharacter,
    MalformedNumber,
    InvalidIdentifier,
    UnmatchedDelimiter,
    UnexpectedEOF,
    DuplicateMapKey,
    DuplicateSetElement,
    OddMapArity,
    InvalidMetadata,
    UnregisteredTag,
    InvalidTagPayload,
    NestingTooDeep,
    IndexOutOfRange,
    RegistryContention,
}
