// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A reader (and writer) for EDN, the Extensible Data Notation.
//!
//! * Direct access to the tokenizer, `ednread::parse`, and to the
//!   value builder, `ednread::read`, which turns the token stream into
//!   [Value](value::Value)s.
//!
//! * Tagged literals (`#tag payload`) go through handlers registered
//!   in `ednread::registry`; `#inst` and `#uuid` are built in. Tags
//!   without a handler are kept as [Tagged](value::Tagged) values
//!   unless reading in strict mode.
//!
//! * Streaming: a file or socket holding many top-level forms can be
//!   read into a [Root](root::Root), which reads forms only as they
//!   are accessed (lazy mode), and can be shared between threads.
//!
//! * Error reporting with the line and column of the problem, in
//!   debug mode.
//!
//! Lists are persistent (immutable, sharing their tails), see
//! `ednread::list`. Numbers are 64-bit integers, big integers and
//! 64-bit floats.

pub mod buffered_chars;
pub mod context;
pub mod error;
pub mod list;
pub mod number;
pub mod parse;
pub mod pos;
pub mod read;
pub mod registry;
pub mod root;
pub mod settings;
pub mod symbol;
pub mod value;
