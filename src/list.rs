// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Persistent (immutable, structurally shared) singly linked lists,
//! the representation of EDN lists.
//!
//! A `List` is either empty or points to a shared cons cell. Cells
//! are never modified after creation, thus cloning a list is just
//! cloning the pointer, and `cons` shares the tail it is given. The
//! hash of a list is computed on first request and kept in its head
//! cell.
//!
//! Lists are built front to back with [ListBuilder](ListBuilder),
//! which collects the elements and only creates the cells when
//! frozen.

use crate::value::Value;
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug)]
struct Cons {
    first: Value,
    rest: Option<Arc<Cons>>,
    // number of cells including this one
    len: usize,
    hash: OnceCell<u64>,
}

impl Drop for Cons {
    // Unlink iteratively, the default recursive drop would overflow
    // the stack on long lists.
    fn drop(&mut self) {
        let mut next = self.rest.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cell) => next = cell.rest.take(),
                // still shared, somebody else will drop the rest
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct List {
    head: Option<Arc<Cons>>,
}

impl List {
    /// The empty list.
    pub fn new() -> List {
        List { head: None }
    }

    /// A new list with `first` in front of `rest`; `rest` is shared,
    /// not copied.
    pub fn cons(first: Value, rest: &List) -> List {
        List {
            head: Some(Arc::new(Cons {
                first,
                rest: rest.head.clone(),
                len: rest.len() + 1,
                hash: OnceCell::new(),
            }))
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.head.as_ref().map(|cell| &cell.first)
    }

    /// The list without its first element (the empty list stays
    /// empty).
    pub fn rest(&self) -> List {
        List {
            head: self.head.as_ref().and_then(|cell| cell.rest.clone())
        }
    }

    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |cell| cell.len)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { cell: self.head.as_deref() }
    }

    /// Whether both lists are the very same cells.
    pub fn ptr_eq(&self, other: &List) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// The hash of the contents, computed once.
    pub fn content_hash(&self) -> u64 {
        match &self.head {
            None => {
                let mut h = DefaultHasher::new();
                0usize.hash(&mut h);
                h.finish()
            }
            Some(cell) => *cell.hash.get_or_init(|| {
                let mut h = DefaultHasher::new();
                cell.len.hash(&mut h);
                for v in self.iter() {
                    v.hash(&mut h);
                }
                h.finish()
            })
        }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &List) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len()
                && self.iter().zip(other.iter()).all(|(a, b)| a == b))
    }
}

impl Eq for List {}

impl Hash for List {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl PartialOrd for List {
    fn partial_cmp(&self, other: &List) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for List {
    fn cmp(&self, other: &List) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal
        }
        self.iter().cmp(other.iter())
    }
}

pub struct Iter<'l> {
    cell: Option<&'l Cons>,
}

impl<'l> Iterator for Iter<'l> {
    type Item = &'l Value;

    fn next(&mut self) -> Option<&'l Value> {
        let cell = self.cell?;
        self.cell = cell.rest.as_deref();
        Some(&cell.first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.cell.map_or(0, |cell| cell.len);
        (n, Some(n))
    }
}

impl<'l> ExactSizeIterator for Iter<'l> {}

impl<'l> IntoIterator for &'l List {
    type Item = &'l Value;
    type IntoIter = Iter<'l>;
    fn into_iter(self) -> Iter<'l> {
        self.iter()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> List {
        let mut b = ListBuilder::new();
        for v in iter {
            b.push(v);
        }
        b.freeze()
    }
}

/// A list under construction. Appending is only possible here; the
/// `List` returned by `freeze` can't be changed anymore.
#[derive(Debug, Default)]
pub struct ListBuilder {
    items: Vec<Value>,
}

impl ListBuilder {
    pub fn new() -> ListBuilder {
        ListBuilder { items: Vec::new() }
    }

    pub fn push(&mut self, v: Value) {
        self.items.push(v);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn freeze(self) -> List {
        let mut l = List::new();
        for v in self.items.into_iter().rev() {
            l = List::cons(v, &l);
        }
        l
    }
}
