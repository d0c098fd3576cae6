use anyhow::Result;
use ednread::list::{List, ListBuilder};
use ednread::read::read_str;
use ednread::settings::Settings;
use ednread::value::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn int(n: i64) -> Value {
    Value::from(n)
}

fn list(ns: &[i64]) -> List {
    ns.iter().map(|n| int(*n)).collect()
}

fn hash_of<T: Hash>(t: &T) -> u64 {
    let mut h = DefaultHasher::new();
    t.hash(&mut h);
    h.finish()
}

#[test]
fn construction() {
    let empty = List::new();
    assert!(empty.is_empty());
    assert_eq!(empty.first(), None);
    assert!(empty.rest().is_empty());

    let l = List::cons(int(1), &List::cons(int(2), &empty));
    assert_eq!(l.len(), 2);
    assert_eq!(l.first(), Some(&int(1)));
    assert_eq!(l.rest().first(), Some(&int(2)));
    assert_eq!(l.iter().len(), 2);
    assert_eq!(l, list(&[1, 2]));

    let mut b = ListBuilder::new();
    assert!(b.is_empty());
    b.push(int(3));
    b.push(int(4));
    assert_eq!(b.len(), 2);
    let frozen = b.freeze();
    assert_eq!(frozen.iter().cloned().collect::<Vec<_>>(), vec![int(3), int(4)]);
}

#[test]
fn structural_sharing() {
    let tail = list(&[2, 3]);
    let a = List::cons(int(1), &tail);
    let b = List::cons(int(0), &tail);
    assert!(a.rest().ptr_eq(&tail));
    assert!(b.rest().ptr_eq(&a.rest()));
    assert_eq!(tail.len(), 2);
    // cloning is sharing
    let c = a.clone();
    assert!(c.ptr_eq(&a));
}

#[test]
fn equality_and_hash() {
    let a = list(&[1, 2, 3]);
    let b = list(&[1, 2, 3]);
    assert!(! a.ptr_eq(&b));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(hash_of(&Value::List(a.clone())), hash_of(&Value::List(b.clone())));

    assert_ne!(a, list(&[1, 2]));
    assert_ne!(a, list(&[1, 2, 4]));
    assert_ne!(list(&[]), list(&[0]));
    assert_eq!(list(&[]), List::new());

    let set: HashSet<List> = [a.clone(), b, list(&[3, 2, 1])].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert!(a < list(&[1, 2, 4]));
    assert!(list(&[1, 2]) < a);
}

#[test]
fn hash_is_cached() {
    let a = list(&[1, 2, 3]);
    let h1 = a.content_hash();
    let h2 = a.content_hash();
    assert_eq!(h1, h2);
    // a clone shares the cell holding the cached hash
    assert_eq!(a.clone().content_hash(), h1);
    // the tail has its own
    assert_ne!(a.rest().content_hash(), h1);
    assert_eq!(a.rest().content_hash(), list(&[2, 3]).content_hash());
}

#[test]
fn read_lists() -> Result<()> {
    let v = read_str("(1 (2 3) ())", Settings::default())?.into_value();
    let expected = Value::List(
        [int(1), Value::List(list(&[2, 3])), Value::List(List::new())]
            .into_iter().collect());
    assert_eq!(v, Some(expected));
    Ok(())
}

#[test]
fn long_lists_drop() {
    let l = (0..1_000_000).map(int).collect::<List>();
    assert_eq!(l.len(), 1_000_000);
    drop(l);
}
