use anyhow::{Result, bail};
use ednread::error::ErrorKind;
use ednread::number::Number;
use ednread::read::{read_str, read_one, Reader, ReaderState, ReadErrorWithPos};
use ednread::buffered_chars::StrChars;
use ednread::settings::{Settings, Modes, MULTIPLE, SINGLE, DEFAULT_DEPTH_LIMIT};
use ednread::symbol::Symbol;
use ednread::value::{Value, ValueWithPos, Atom, keyword, symbol};

fn int(n: i64) -> Value {
    Value::from(n)
}

fn read(s: &str) -> Result<Option<Value>, ReadErrorWithPos> {
    Ok(read_str(s, Settings::default())?.into_value())
}

fn read_strict(s: &str) -> Result<Option<Value>, ReadErrorWithPos> {
    let settings = Settings::new(Modes { strict: true, ..SINGLE });
    Ok(read_str(s, settings)?.into_value())
}

fn kind_of(r: Result<Option<Value>, ReadErrorWithPos>) -> Result<ErrorKind> {
    match r {
        Ok(v) => bail!("expected an error, got {:?}", v),
        Err(e) => Ok(e.kind()),
    }
}

fn must(r: Result<Option<Value>, ReadErrorWithPos>) -> Result<Value> {
    match r? {
        Some(v) => Ok(v),
        None => bail!("no value"),
    }
}

#[test]
fn end_to_end() -> Result<()> {
    let v = must(read("(1 :foo/bar \"s\" [1 2] #{1 2} {:k 1})"))?;
    let l = match v {
        Value::List(l) => l,
        _ => bail!("expected a list, got {}", v),
    };
    assert_eq!(l.len(), 6);
    let items: Vec<&Value> = l.iter().collect();
    assert_eq!(items[0], &int(1));
    let kw = items[1].as_symbol().expect("keyword");
    assert!(kw.is_keyword());
    assert_eq!(kw.namespace(), Some("foo"));
    assert_eq!(kw.name(), "bar");
    assert_eq!(items[2].as_str(), Some("s"));
    assert_eq!(items[3], &Value::Vector(vec![int(1), int(2)]));
    match items[4] {
        Value::Set(s) => {
            assert_eq!(s.len(), 2);
            assert!(s.contains(&int(1)));
            assert!(s.contains(&int(2)));
        }
        v => bail!("expected a set, got {}", v),
    }
    match items[5] {
        Value::Map(m) => {
            assert_eq!(m.len(), 1);
            assert_eq!(m.get(&keyword("k")), Some(&int(1)));
        }
        v => bail!("expected a map, got {}", v),
    }
    Ok(())
}

#[test]
fn scalars() -> Result<()> {
    assert_eq!(must(read("nil"))?, Value::Atom(Atom::Nil));
    assert_eq!(must(read("true"))?, Value::from(true));
    assert_eq!(must(read("-42"))?, int(-42));
    assert_eq!(must(read("2.5"))?, Value::from(2.5));
    assert_eq!(must(read("\\newline"))?, Value::Atom(Atom::Char('\n')));
    assert_eq!(must(read("foo"))?, symbol("foo"));
    assert_eq!(must(read("\"a\\nb\""))?, Value::from("a\nb"));
    match must(read("123456789012345678901234567890"))? {
        Value::Atom(Atom::Number(Number::BigInt(n))) =>
            assert_eq!(n.to_string(), "123456789012345678901234567890"),
        v => bail!("expected a big integer, got {}", v),
    }
    Ok(())
}

#[test]
fn discard() -> Result<()> {
    assert_eq!(must(read("#_(1 2) 3"))?, int(3));
    assert_eq!(must(read("[1 #_2 3]"))?, Value::Vector(vec![int(1), int(3)]));
    assert_eq!(must(read("#_ #_ 1 2 3"))?, int(3));
    assert_eq!(read("#_ 1")?, None);
    assert_eq!(kind_of(read("[1 #_]"))?, ErrorKind::UnmatchedDelimiter);
    Ok(())
}

#[test]
fn metadata_is_dropped() -> Result<()> {
    assert_eq!(must(read("^{:a 1} [1]"))?, Value::Vector(vec![int(1)]));
    assert_eq!(must(read("^:dynamic x"))?, symbol("x"));
    assert_eq!(must(read("^String s"))?, symbol("s"));
    assert_eq!(kind_of(read("^1 x"))?, ErrorKind::InvalidMetadata);
    assert_eq!(kind_of(read("^:a"))?, ErrorKind::UnexpectedEOF);
    Ok(())
}

#[test]
fn maps_and_sets() -> Result<()> {
    assert_eq!(kind_of(read("{:a 1 :a 2}"))?, ErrorKind::DuplicateMapKey);
    assert_eq!(kind_of(read("{:a 1 :b}"))?, ErrorKind::OddMapArity);
    assert_eq!(kind_of(read("#{1 2 1}"))?, ErrorKind::DuplicateSetElement);
    // equal after reading, thus duplicates
    assert_eq!(kind_of(read("#{(1 2) (1 2)}"))?, ErrorKind::DuplicateSetElement);
    assert_eq!(kind_of(read("{[1] 1 [1] 2}"))?, ErrorKind::DuplicateMapKey);
    let v = must(read("{:a 1, :b 2,}"))?;
    assert_eq!(v.to_string(), "{:a 1, :b 2}");
    Ok(())
}

#[test]
fn delimiters() -> Result<()> {
    assert_eq!(kind_of(read("(1 2]"))?, ErrorKind::UnmatchedDelimiter);
    assert_eq!(kind_of(read(")"))?, ErrorKind::UnmatchedDelimiter);
    assert_eq!(kind_of(read("#{1 2)"))?, ErrorKind::UnmatchedDelimiter);
    assert_eq!(kind_of(read("(1 (2"))?, ErrorKind::UnexpectedEOF);
    assert_eq!(kind_of(read("#foo"))?, ErrorKind::UnexpectedEOF);
    Ok(())
}

#[test]
fn unknown_tags() -> Result<()> {
    match must(read("#unknown 1"))? {
        Value::Tagged(t) => {
            assert_eq!(t.tag, Symbol::new(None, "unknown"));
            assert_eq!(*t.value, int(1));
        }
        v => bail!("expected a tagged value, got {}", v),
    }
    assert_eq!(kind_of(read_strict("#unknown 1"))?, ErrorKind::UnregisteredTag);
    // built-in tags are fine in strict mode
    assert!(read_strict("#uuid \"f81d4fae-7dec-11d0-a765-00a0c91e6bf6\"")?.is_some());
    Ok(())
}

#[test]
fn single_object_mode() -> Result<()> {
    assert_eq!(read("")?, None);
    assert_eq!(read("  ; just a comment\n")?, None);
    // the rest is left unread, even if it's broken
    assert_eq!(must(read("1 )"))?, int(1));
    Ok(())
}

#[test]
fn reader_stops_after_error() -> Result<()> {
    let mut r = Reader::new(StrChars::new("1 ] 2"), Settings::new(MULTIPLE));
    assert_eq!(r.read()?, Some(int(1)));
    assert!(r.read().is_err());
    assert_eq!(r.state(), ReaderState::Failed);
    assert_eq!(r.read()?, None);

    let mut r = Reader::new(StrChars::new("1"), Settings::new(MULTIPLE));
    assert_eq!(r.next().transpose()?, Some(int(1)));
    assert!(r.next().is_none());
    assert_eq!(r.state(), ReaderState::Done);
    Ok(())
}

// How many vectors deep `v` goes, along the first elements.
fn depth(v: &Value) -> usize {
    let mut d = 0;
    let mut v = v;
    while let Value::Vector(xs) = v {
        d += 1;
        match xs.first() {
            Some(x) => v = x,
            None => break,
        }
    }
    d
}

fn nested(n: usize) -> String {
    format!("{}{}", "[".repeat(n), "]".repeat(n))
}

#[test]
fn nesting_limit() -> Result<()> {
    let settings = Settings::default().with_depth_limit(10);
    let r = read_one(StrChars::new(nested(20)), settings.clone());
    assert_eq!(kind_of(r)?, ErrorKind::NestingTooDeep);
    let r = read_one(StrChars::new(nested(11)), settings.clone());
    assert_eq!(kind_of(r)?, ErrorKind::NestingTooDeep);
    let r = read_one(StrChars::new(nested(10)), settings.clone());
    assert_eq!(depth(&must(r)?), 10);
    // prefixes count, too
    let r = read_one(StrChars::new(format!("{}1", "#_ 0 ^:a #t ".repeat(6))), settings);
    assert_eq!(kind_of(r)?, ErrorKind::NestingTooDeep);
    Ok(())
}

#[test]
fn deep_input_on_a_plain_thread() -> Result<()> {
    let n = DEFAULT_DEPTH_LIMIT as usize - 1;
    assert_eq!(depth(&must(read(&nested(n)))?), n);
    let deep = format!("{}{}", "(".repeat(100_000), ")".repeat(100_000));
    assert_eq!(kind_of(read(&deep))?, ErrorKind::NestingTooDeep);

    let t = std::thread::spawn(move || -> Result<usize> {
        Ok(depth(&must(read(&nested(n)))?))
    });
    match t.join() {
        Ok(d) => assert_eq!(d?, n),
        Err(_) => bail!("reader thread panicked"),
    }
    Ok(())
}

#[test]
fn nested_positions() -> Result<()> {
    let settings = Settings::new(Modes { debug: true, ..SINGLE });
    let src = "[1\n {:a #_x ^:m (2 3)}\n #p [4]]";
    let mut r = Reader::new(StrChars::new(src), settings);
    let pos = match r.read_with_pos()? {
        Some(ValueWithPos(_, Some(pos))) => pos,
        other => bail!("expected a located form, got {:?}", other),
    };
    let at = |path: &[usize]| pos.get(path).map(
        |t| (t.span.start.line, t.span.start.col, t.span.len));
    assert_eq!(pos.span.len, src.len());
    assert_eq!(pos.items.len(), 3);
    assert_eq!(at(&[0]), Some((0, 1, 1)));
    assert_eq!(at(&[1]), Some((1, 1, 18)));
    // the key, then the value; the discarded x is gone
    assert_eq!(at(&[1, 0]), Some((1, 2, 2)));
    assert_eq!(at(&[1, 1]), Some((1, 9, 9)));
    assert_eq!(at(&[1, 1, 1]), Some((1, 16, 1)));
    // the tagged form, its payload, and the payload's element
    assert_eq!(at(&[2]), Some((2, 1, 6)));
    assert_eq!(at(&[2, 0]), Some((2, 4, 3)));
    assert_eq!(at(&[2, 0, 0]), Some((2, 5, 1)));
    assert_eq!(at(&[3]), None);

    // without debug mode, nothing is tracked
    let mut r = Reader::new(StrChars::new(src), Settings::default());
    assert!(matches!(r.read_with_pos()?, Some(ValueWithPos(_, None))));
    Ok(())
}

#[test]
fn error_positions() -> Result<()> {
    let settings = Settings::new(Modes { debug: true, ..SINGLE });
    let e = match read_str("[1\n  2 )", settings) {
        Err(e) => e,
        Ok(_) => bail!("expected an error"),
    };
    let span = e.pos.expect("position in debug mode");
    assert_eq!((span.start.line, span.start.col), (1, 4));
    assert_eq!(span.start.offset, 7);
    assert!(e.to_string().ends_with("@2.4"), "{}", e);

    // positions are only reported in debug mode
    let e = match read_str("[1\n  2 )", Settings::default()) {
        Err(e) => e,
        Ok(_) => bail!("expected an error"),
    };
    assert!(e.pos.is_none());
    Ok(())
}

#[test]
fn write_read_round_trip() -> Result<()> {
    let src = "(nil true 1 -2 3.5 12N \\c \\space \"x\\\"y\" sym ns/sym :kw :ns/kw \
               [1 [2]] {:a #{1 2}} #{} () #tagged [1] ##Inf)";
    let v = must(read(src))?;
    let v2 = must(read(&v.to_string()))?;
    assert_eq!(v, v2);
    Ok(())
}
