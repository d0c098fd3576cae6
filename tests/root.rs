use anyhow::{Result, bail};
use ednread::error::ErrorKind;
use ednread::read::{read_str, read_stream, Parsed, ReadErrorWithPos};
use ednread::root::{Root, RootError};
use ednread::settings::{Settings, Modes, LAZY, MULTIPLE, DEFAULT_DEPTH_LIMIT};
use ednread::value::{Value, keyword};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn int(n: i64) -> Value {
    Value::from(n)
}

fn root(s: &str, modes: Modes) -> Result<Root> {
    match read_str(s, Settings::new(modes))? {
        Parsed::Root(r) => Ok(r),
        Parsed::Value(v) => bail!("expected a root, got {:?}", v),
    }
}

// Counts how many forms were pulled from it.
fn counted(n: i64, pulled: Arc<AtomicUsize>)
           -> impl Iterator<Item = Result<Value, ReadErrorWithPos>> + Send {
    (0..n).map(move |i| {
        pulled.fetch_add(1, Ordering::SeqCst);
        Ok(int(i))
    })
}

#[test]
fn lazy_realizes_only_what_is_asked_for() -> Result<()> {
    let r = root("1 2 3", LAZY)?;
    assert_eq!(r.realized_len(), 0);
    assert_eq!(*r.get(1)?, int(2));
    assert_eq!(r.realized_len(), 2);
    assert!(! r.is_exhausted());
    assert_eq!(*r.get(0)?, int(1));
    assert_eq!(r.realized_len(), 2);
    assert_eq!(*r.get(2)?, int(3));
    assert_eq!(r.realized_len(), 3);
    Ok(())
}

#[test]
fn lazy_mode_implies_multiple_objects() -> Result<()> {
    let r = root("1 2", Modes { lazy_parsing: true, ..Modes::default() })?;
    assert_eq!(r.realize_all()?, 2);
    Ok(())
}

#[test]
fn index_out_of_range() -> Result<()> {
    for modes in [LAZY, MULTIPLE] {
        let r = root("1 2 3", modes)?;
        match r.get(5) {
            Err(e @ RootError::IndexOutOfRange { .. }) => {
                assert_eq!(e.kind(), ErrorKind::IndexOutOfRange);
                assert!(matches!(e, RootError::IndexOutOfRange { index: 5, len: 3 }));
            }
            other => bail!("expected IndexOutOfRange, got {:?}", other),
        }
        assert!(r.is_exhausted());
        // recoverable: the realized forms are still there
        assert_eq!(*r.get(2)?, int(3));
    }
    Ok(())
}

#[test]
fn never_pulls_twice() -> Result<()> {
    let pulled = Arc::new(AtomicUsize::new(0));
    let r = Root::new(counted(10, pulled.clone()));
    assert_eq!(*r.get(3)?, int(3));
    assert_eq!(pulled.load(Ordering::SeqCst), 4);
    assert_eq!(*r.get(3)?, int(3));
    assert_eq!(*r.get(1)?, int(1));
    assert_eq!(pulled.load(Ordering::SeqCst), 4);
    let all: Vec<Value> = r.iter().map(|v| v.map(|v| (*v).clone())).collect::<Result<_, _>>()?;
    assert_eq!(all, (0..10).map(int).collect::<Vec<_>>());
    assert_eq!(pulled.load(Ordering::SeqCst), 10);
    // repeatable once realized
    assert_eq!(r.iter().count(), 10);
    Ok(())
}

#[test]
fn concurrent_access() -> Result<()> {
    let pulled = Arc::new(AtomicUsize::new(0));
    let r = Arc::new(Root::new(counted(1000, pulled.clone())));
    let barrier = Arc::new(Barrier::new(8));
    let threads: Vec<_> = (0..8).map(|t| {
        let r = r.clone();
        let barrier = barrier.clone();
        thread::spawn(move || -> Result<()> {
            barrier.wait();
            // different threads walk different strides
            for i in (0..1000).step_by(t + 1) {
                assert_eq!(*r.get(i)?, int(i as i64));
            }
            Ok(())
        })
    }).collect();
    for t in threads {
        match t.join() {
            Ok(res) => res?,
            Err(_) => bail!("thread panicked"),
        }
    }
    assert_eq!(pulled.load(Ordering::SeqCst), 1000);
    assert_eq!(r.realized_len(), 1000);
    for i in 0..1000 {
        assert_eq!(*r.get(i)?, int(i as i64));
    }
    Ok(())
}

#[test]
fn deep_forms_realized_on_a_worker_thread() -> Result<()> {
    let n = DEFAULT_DEPTH_LIMIT as usize - 1;
    let src = format!("{}{} :end", "[".repeat(n), "]".repeat(n));
    let r = Arc::new(root(&src, LAZY)?);
    let r2 = r.clone();
    let t = thread::spawn(move || -> Result<usize> {
        r2.get(0)?;
        Ok(r2.realize_all()?)
    });
    match t.join() {
        Ok(len) => assert_eq!(len?, 2),
        Err(_) => bail!("thread panicked"),
    }
    assert_eq!(*r.get(1)?, keyword("end"));
    Ok(())
}

#[test]
fn lazy_error_ends_the_stream() -> Result<()> {
    let r = root("1 2 ) 4", LAZY)?;
    assert_eq!(*r.get(1)?, int(2));
    assert!(r.failure().is_none());
    let e = match r.get(2) {
        Err(e) => e,
        Ok(v) => bail!("expected an error, got {}", v),
    };
    assert_eq!(e.kind(), ErrorKind::UnmatchedDelimiter);
    // and stays there
    assert_eq!(r.get(3).map_err(|e| e.kind()).err(), Some(ErrorKind::UnmatchedDelimiter));
    assert!(r.failure().is_some());
    assert!(r.is_exhausted());
    assert_eq!(*r.get(0)?, int(1));

    let items: Vec<_> = r.iter().collect();
    assert_eq!(items.len(), 3);
    assert!(items[2].is_err());
    Ok(())
}

#[test]
fn eager_keeps_forms_before_error() -> Result<()> {
    let r = root("[1] [2] {:a}", MULTIPLE)?;
    assert_eq!(r.realized_len(), 2);
    assert!(r.is_exhausted());
    assert_eq!(r.failure().map(|e| e.kind()), Some(ErrorKind::OddMapArity));
    assert_eq!(*r.get(1)?, Value::Vector(vec![int(2)]));
    assert_eq!(r.get(2).map_err(|e| e.kind()).err(), Some(ErrorKind::OddMapArity));
    assert_eq!(r.realize_all().map_err(|e| e.kind()).err(), Some(ErrorKind::OddMapArity));
    Ok(())
}

#[test]
fn from_materialized_forms() -> Result<()> {
    let r = Root::from(vec![int(1), int(2)]);
    assert!(r.is_exhausted());
    assert_eq!(r.realize_all()?, 2);
    let twice: Vec<_> = r.iter().chain(r.iter()).collect::<Result<_, _>>()?;
    assert_eq!(twice.len(), 4);
    Ok(())
}

#[test]
fn root_over_a_stream() -> Result<()> {
    let data: &'static [u8] = b"{:id 1}\n{:id 2}\n{:id 3}\n";
    let r = match read_stream(data, Settings::new(LAZY))? {
        Parsed::Root(r) => r,
        Parsed::Value(_) => bail!("expected a root"),
    };
    let mut ids = Vec::new();
    for v in &r {
        let v = v?;
        if let Value::Map(m) = &*v {
            ids.extend(m.values().filter_map(Value::as_i64));
        }
    }
    assert_eq!(ids, vec![1, 2, 3]);
    Ok(())
}
