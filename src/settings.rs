// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Settings for reading (parsing) data.

use crate::registry::Registry;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modes {
    /// Read forms until end of input, into a `Root`.
    pub multiple_objects: bool,
    /// Read the forms of a `Root` only when they are accessed; implies
    /// `multiple_objects`.
    pub lazy_parsing: bool,
    /// Tags without a handler are an error instead of being read as
    /// `Value::Tagged`.
    pub strict: bool,
    /// Report source positions in errors and values.
    pub debug: bool,
    /// Let the tokenizer emit comment tokens (the reader skips them).
    pub retain_comments: bool,
}

impl Modes {
    /// Apply the rule that lazy parsing implies multiple objects.
    pub fn normalized(self) -> Modes {
        Modes {
            multiple_objects: self.multiple_objects || self.lazy_parsing,
            ..self
        }
    }

    pub fn is_valid(&self) -> bool {
        ! self.lazy_parsing || self.multiple_objects
    }
}

pub const SINGLE : Modes = Modes {
    multiple_objects: false,
    lazy_parsing: false,
    strict: false,
    debug: false,
    retain_comments: false,
};

pub const MULTIPLE : Modes = Modes {
    multiple_objects: true,
    ..SINGLE
};

pub const LAZY : Modes = Modes {
    multiple_objects: true,
    lazy_parsing: true,
    ..SINGLE
};


#[derive(Debug, Clone)]
pub struct Settings {
    pub modes: Modes,
    /// Maximum nesting of collections and prefixed forms.
    pub depth_limit: u32,
    /// Tag handlers consulted before the process-wide registry.
    pub registry: Option<Arc<Registry>>,
}

// Reading does not recurse, but comparing, hashing, writing and
// dropping values does, once per level.
pub const DEFAULT_DEPTH_LIMIT : u32 = 500;

impl Settings {
    pub fn new(modes: Modes) -> Settings {
        Settings {
            modes: modes.normalized(),
            depth_limit: DEFAULT_DEPTH_LIMIT,
            registry: None,
        }
    }

    pub fn with_registry(self, registry: Registry) -> Settings {
        Settings { registry: Some(Arc::new(registry)), ..self }
    }

    pub fn with_depth_limit(self, depth_limit: u32) -> Settings {
        Settings { depth_limit, ..self }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new(SINGLE)
    }
}
