// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Handlers for tagged literals (`#tag payload`).
//!
//! There is one process-wide registry, pre-populated with the
//! handlers for the EDN built-in tags `#inst` and `#uuid`; register
//! application tags once during initialization, before reading. A
//! reader can additionally be given its own [Registry](Registry) via
//! `Settings::with_registry`, which is consulted first.

use crate::error::ErrorKind;
use crate::symbol::Symbol;
use crate::value::{Value, Object, TaggedObject};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, trace};

/// What a tag handler reports when it can't make sense of the
/// payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TagError(pub String);

pub type TagHandler = Arc<dyn Fn(Value) -> Result<Value, TagError> + Send + Sync>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tag registry lock poisoned by a panicking thread")]
    Contention,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::RegistryContention
    }
}

/// The outcome of `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The same handler was registered for the tag already.
    Unchanged,
    /// A different handler was registered for the tag; it is gone now.
    Replaced,
}

#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<Symbol, TagHandler>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        let mut tags: Vec<String> = self.handlers.keys().map(|t| t.to_string()).collect();
        tags.sort();
        f.debug_struct("Registry").field("tags", &tags).finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// A registry holding the handlers for `#inst` and `#uuid`.
    pub fn with_builtins() -> Registry {
        let mut r = Registry::new();
        r.register(Symbol::new(None, "inst"), Arc::new(read_inst));
        r.register(Symbol::new(None, "uuid"), Arc::new(read_uuid));
        r
    }

    pub fn register(&mut self, tag: Symbol, handler: TagHandler) -> Registration {
        let registration = match self.handlers.get(&tag) {
            Some(old) if Arc::ptr_eq(old, &handler) => return Registration::Unchanged,
            Some(_) => Registration::Replaced,
            None => Registration::Added,
        };
        self.handlers.insert(tag, handler);
        registration
    }

    pub fn lookup(&self, tag: &Symbol) -> Option<TagHandler> {
        self.handlers.get(tag).cloned()
    }

    pub fn contains(&self, tag: &Symbol) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}


static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| {
    Mutex::new(Registry::with_builtins())
});

/// Register `handler` for `tag` in the process-wide registry.
pub fn register(tag: Symbol, handler: TagHandler)
                -> Result<Registration, RegistryError> {
    let mut registry = REGISTRY.lock().map_err(|_| RegistryError::Contention)?;
    let registration = registry.register(tag.clone(), handler);
    match registration {
        Registration::Unchanged =>
            trace!(target: "ednread::registry", %tag, "handler already registered"),
        _ =>
            debug!(target: "ednread::registry", %tag, ?registration, "registered tag handler"),
    }
    Ok(registration)
}

/// Register a closure; the tag is given as text, e.g. `"myapp/point"`.
pub fn register_fn<F>(tag: &str, f: F) -> anyhow::Result<Registration>
    where F: Fn(Value) -> Result<Value, TagError> + Send + Sync + 'static
{
    let tag = Symbol::parse(tag)?;
    anyhow::ensure!(! tag.is_keyword(), "tag must be a symbol, got {}", tag);
    Ok(register(tag, Arc::new(f))?)
}

/// Look `tag` up in the process-wide registry. The handler is
/// returned (not called) so that the lock is not held while it runs.
pub fn lookup(tag: &Symbol) -> Result<Option<TagHandler>, RegistryError> {
    let registry = REGISTRY.lock().map_err(|_| RegistryError::Contention)?;
    Ok(registry.lookup(tag))
}

/// A copy of the process-wide registry as it is now.
pub fn snapshot() -> Result<Registry, RegistryError> {
    let registry = REGISTRY.lock().map_err(|_| RegistryError::Contention)?;
    Ok(registry.clone())
}


/// `#inst "1985-04-12T23:20:50.52Z"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst(pub DateTime<FixedOffset>);

impl TaggedObject for Inst {
    fn tag(&self) -> Symbol {
        Symbol::new(None, "inst")
    }
    fn payload(&self) -> Value {
        Value::from(self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true).as_str())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `#uuid "f81d4fae-7dec-11d0-a765-00a0c91e6bf6"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnUuid(pub uuid::Uuid);

impl TaggedObject for EdnUuid {
    fn tag(&self) -> Symbol {
        Symbol::new(None, "uuid")
    }
    fn payload(&self) -> Value {
        Value::from(self.0.hyphenated().to_string().as_str())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn string_payload<'v>(tag: &str, v: &'v Value) -> Result<&'v str, TagError> {
    v.as_str().ok_or_else(
        || TagError(format!("#{} expects a string, got {}", tag, v)))
}

fn read_inst(v: Value) -> Result<Value, TagError> {
    let s = string_payload("inst", &v)?;
    let t = DateTime::parse_from_rfc3339(s)
        .map_err(|e| TagError(format!("#inst {:?}: {}", s, e)))?;
    Ok(Value::Object(Object::new(Inst(t))))
}

fn read_uuid(v: Value) -> Result<Value, TagError> {
    let s = string_payload("uuid", &v)?;
    let u = uuid::Uuid::parse_str(s)
        .map_err(|e| TagError(format!("#uuid {:?}: {}", s, e)))?;
    Ok(Value::Object(Object::new(EdnUuid(u))))
}
