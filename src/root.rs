// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A stream of top-level forms, realized as they are accessed.
//!
//! The realized prefix only ever grows. Extending it happens while
//! holding the lock on the source, so two threads asking for the
//! same not yet realized index pull each form from the source exactly
//! once; reading already realized forms only takes the (shared) lock
//! on the prefix. Locks are always taken in the order source, then
//! prefix.

use crate::error::ErrorKind;
use crate::read::ReadErrorWithPos;
use crate::value::Value;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use thiserror::Error;
use tracing::{debug, trace};

pub type FormSource = Box<dyn Iterator<Item = Result<Value, ReadErrorWithPos>> + Send>;

#[derive(Error, Debug, Clone)]
pub enum RootError {
    #[error("index {index} out of range, the stream has {len} forms")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0}")]
    Read(Arc<ReadErrorWithPos>),
}

impl RootError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RootError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            RootError::Read(e) => e.kind(),
        }
    }
}

struct Source {
    // None once exhausted or failed
    forms: Option<FormSource>,
    failure: Option<Arc<ReadErrorWithPos>>,
}

pub struct Root {
    realized: RwLock<Vec<Arc<Value>>>,
    source: Mutex<Source>,
}

impl Root {
    /// A root over forms that are all there already.
    pub fn from_vec(vals: Vec<Value>) -> Root {
        Root::with_failure(vals, None)
    }

    /// A root pulling its forms from `forms` on demand. The first
    /// error ends the stream.
    pub fn new<S>(forms: S) -> Root
        where S: Iterator<Item = Result<Value, ReadErrorWithPos>> + Send + 'static
    {
        Root {
            realized: RwLock::new(Vec::new()),
            source: Mutex::new(Source {
                forms: Some(Box::new(forms)),
                failure: None,
            }),
        }
    }

    pub(crate) fn with_failure(vals: Vec<Value>, failure: Option<ReadErrorWithPos>) -> Root {
        Root {
            realized: RwLock::new(vals.into_iter().map(Arc::new).collect()),
            source: Mutex::new(Source {
                forms: None,
                failure: failure.map(Arc::new),
            }),
        }
    }

    // A push either happened or it didn't; poisoning is ignored.
    fn lock_source(&self) -> MutexGuard<'_, Source> {
        self.source.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_realized(&self) -> RwLockReadGuard<'_, Vec<Arc<Value>>> {
        self.realized.read().unwrap_or_else(|e| e.into_inner())
    }

    fn push_realized(&self, v: Value) {
        self.realized.write().unwrap_or_else(|e| e.into_inner()).push(Arc::new(v));
    }

    /// How many forms have been read so far.
    pub fn realized_len(&self) -> usize {
        self.read_realized().len()
    }

    /// Whether the source has ended (regularly or with an error).
    pub fn is_exhausted(&self) -> bool {
        self.lock_source().forms.is_none()
    }

    /// The error that ended the stream, if any.
    pub fn failure(&self) -> Option<Arc<ReadErrorWithPos>> {
        self.lock_source().failure.clone()
    }

    /// The form at `index`, reading the forms up to it first if
    /// necessary.
    pub fn get(&self, index: usize) -> Result<Arc<Value>, RootError> {
        if let Some(v) = self.read_realized().get(index) {
            return Ok(v.clone())
        }
        self.realize_to(index)
    }

    fn realize_to(&self, index: usize) -> Result<Arc<Value>, RootError> {
        let mut source = self.lock_source();
        loop {
            // Another thread may have realized it while we waited
            // for the source.
            let len = {
                let realized = self.read_realized();
                if let Some(v) = realized.get(index) {
                    return Ok(v.clone())
                }
                realized.len()
            };
            let next = match source.forms.as_mut() {
                Some(forms) => forms.next(),
                None => None,
            };
            match next {
                Some(Ok(v)) => {
                    trace!(target: "ednread::root", index = len, "realized form");
                    self.push_realized(v);
                }
                Some(Err(e)) => {
                    debug!(target: "ednread::root", realized = len, error = %e,
                           "stream failed");
                    let e = Arc::new(e);
                    source.forms = None;
                    source.failure = Some(e.clone());
                    return Err(RootError::Read(e))
                }
                None => {
                    if source.forms.take().is_some() {
                        debug!(target: "ednread::root", realized = len, "stream exhausted");
                    }
                    return match &source.failure {
                        Some(e) => Err(RootError::Read(e.clone())),
                        None => Err(RootError::IndexOutOfRange { index, len }),
                    }
                }
            }
        }
    }

    /// Read the whole stream; returns the number of forms.
    pub fn realize_all(&self) -> Result<usize, RootError> {
        let mut index = self.realized_len();
        loop {
            match self.get(index) {
                Ok(_) => index += 1,
                Err(RootError::IndexOutOfRange { len, .. }) => return Ok(len),
                Err(e) => return Err(e),
            }
        }
    }

    /// Iterate from the first form on, reading further forms as
    /// needed. Ends after the last form, or after yielding the error
    /// that ended the stream.
    pub fn iter(&self) -> RootIter<'_> {
        RootIter { root: self, index: 0, done: false }
    }
}

impl Debug for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        let source = self.lock_source();
        f.debug_struct("Root")
            .field("realized", &self.realized_len())
            .field("exhausted", &source.forms.is_none())
            .field("failure", &source.failure)
            .finish()
    }
}

impl From<Vec<Value>> for Root {
    fn from(vals: Vec<Value>) -> Root {
        Root::from_vec(vals)
    }
}

pub struct RootIter<'r> {
    root: &'r Root,
    index: usize,
    done: bool,
}

impl<'r> Iterator for RootIter<'r> {
    type Item = Result<Arc<Value>, RootError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None
        }
        match self.root.get(self.index) {
            Ok(v) => {
                self.index += 1;
                Some(Ok(v))
            }
            Err(RootError::IndexOutOfRange { .. }) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'r> IntoIterator for &'r Root {
    type Item = Result<Arc<Value>, RootError>;
    type IntoIter = RootIter<'r>;

    fn into_iter(self) -> RootIter<'r> {
        self.iter()
    }
}
