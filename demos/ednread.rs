// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ednread::buffered_chars::buffered_chars;
use ednread::context::{Context, FileContext, SpecialContext};
use ednread::parse::{Token, parse, TokenWithPos};
use ednread::pos::Pos;
use ednread::read::{read_stream, write_all, Parsed};
use ednread::settings::{Settings, Modes};
use ednread::value::Collkind;
use clap::Parser as ClapParser;
use std::io::{stdin, stdout, BufWriter, Read, Write};
use std::path::PathBuf;
use anyhow::{Result, anyhow, bail};
use tracing_subscriber::EnvFilter;


fn indentstr(i: usize) -> Option<&'static str> {
    "                                                                  ".get(0..i)
}

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Build values from all content (default: stream tokens)
    #[clap(short, long, value_parser)]
    values: bool,
    /// Print the parsed data
    #[clap(long, value_parser)]
    print: bool,
    /// Show the token position (only with --print and no --values)
    #[clap(long, value_parser)]
    pos: bool,
    /// Show the comments (only with --print and no --values)
    #[clap(short, long, value_parser)]
    comments: bool,
    /// Read forms only as they are printed (only with --values)
    #[clap(short, long, value_parser)]
    lazy: bool,
    /// Fail on tags without a handler
    #[clap(short, long, value_parser)]
    strict: bool,
    /// Report positions in error messages
    #[clap(short, long, value_parser)]
    debug: bool,
    /// Path to the input file, `-` for stdin
    #[clap(value_parser, required(true))]
    input_path: PathBuf,
}

fn open(path: &PathBuf) -> Result<(Box<dyn Read + Send>, Box<dyn Context>)> {
    if path.as_os_str() == "-" {
        Ok((Box::new(stdin()), Box::new(SpecialContext::new("stdin"))))
    } else {
        let fh = std::fs::File::open(path)
            .map_err(|e| anyhow!("{:?}: {}", path, e))?;
        Ok((Box::new(fh), Box::new(FileContext { path: path.clone() })))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (fh, context) = open(&args.input_path)?;

    if args.values {

        // Read all top-level forms into a root, then optionally print
        // them; in lazy mode, reading happens while printing.

        let settings = Settings::new(Modes {
            multiple_objects: true,
            lazy_parsing: args.lazy,
            strict: args.strict,
            debug: args.debug,
            retain_comments: false,
        });
        let root = match read_stream(fh, settings) {
            Ok(Parsed::Root(root)) => root,
            Ok(Parsed::Value(_)) => bail!("expected a root in multi-object mode"),
            Err(e) => return Err(e.with_context(context).into()),
        };
        let mut out = BufWriter::new(stdout().lock());
        let mut count = 0;
        for v in &root {
            let v = v.map_err(
                |e| anyhow!("{}: {}", context.to_string_without_pos(), e))?;
            count += 1;
            if args.print {
                write_all(&mut out, [&*v])?;
            }
        }
        writeln!(out, ";; count_toplevel = {count}")?;
        out.flush()?;

    } else {

        // Read through the token stream and just do some bookkeeping
        // and optionally print the tokens.

        let modes = Modes {
            retain_comments: args.comments,
            ..Modes::default()
        };
        let ts = parse(buffered_chars(fh), modes);
        let mut count_toplevel = 0;
        let mut count_enter = 0;
        let mut parenstack: Vec<(Collkind, Pos)> = Vec::new();
        for te in ts {
            let TokenWithPos(token, span) = te.map_err(
                |e| anyhow!("{}: {}", context.to_string_without_pos(), e))?;
            let pos = span.start;
            let indentlevel;
            match &token {
                Token::Open(kind) => {
                    count_enter += 1;
                    if parenstack.is_empty() {
                        count_toplevel += 1;
                    }
                    indentlevel = parenstack.len();
                    parenstack.push((*kind, pos));
                }
                Token::Close(kind) => {
                    if let Some((expected_kind, opening_pos)) = parenstack.pop() {
                        if *kind != expected_kind.parenkind() {
                            bail!("expected closing character '{}' (opening {}), \
                                   got '{}' at {:?}{}",
                                  expected_kind.parenkind().closing(),
                                  opening_pos,
                                  kind.closing(),
                                  args.input_path,
                                  pos)
                        }
                        indentlevel = parenstack.len();
                    } else {
                        bail!("unexpected closing character '{}' at {:?}{}",
                              kind.closing(), args.input_path, pos)
                    }
                }
                _ => {
                    indentlevel = parenstack.len();
                }
            }
            if args.print {
                if let Some(indent) = indentstr(indentlevel) {
                    if args.pos {
                        println!("{indent}{pos} {token}");
                    } else {
                        println!("{indent}{token}");
                    }
                } else {
                    bail!("collections nested too deeply at {:?}{}", args.input_path, pos)
                }
            }
        }
        println!(";; count_toplevel = {count_toplevel}, count_enter = {count_enter}");

    }
    Ok(())
}
