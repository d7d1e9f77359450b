///! @see: SPEC_FULL.md section 3, reference tables
use std::collections::HashMap;
use std::sync::Arc;

use crate::class::ClassDescription;

/// AMF0's single composite-value reference table (objects, ECMA arrays and
/// strict arrays all share it). Keyed on the identity of the value being
/// written — callers pass the address of whichever borrowed value they hold
/// (an `&Object` or an `&Value`) cast to `usize` — not its contents: two
/// distinct anonymous objects with identical fields still get distinct
/// reference slots. Fresh per encoding session via `reset`.
#[derive(Debug, Default)]
pub struct Amf0References {
    seen: Vec<usize>,
}

impl Amf0References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn lookup(&self, key: usize) -> Option<u16> {
        self.seen.iter().position(|&k| k == key).map(|i| i as u16)
    }

    /// Must run before recursing into the value's members, so a
    /// self-referential member resolves to this index instead of looping.
    pub fn insert(&mut self, key: usize) -> u16 {
        let index = self.seen.len() as u16;
        self.seen.push(key);
        index
    }
}

/// AMF3's three independent reference tables: objects (identity), strings
/// (value), and class definitions (identity). @see SPEC_FULL.md section 3.
#[derive(Debug, Default)]
pub struct Amf3References {
    objects: Vec<usize>,
    strings: HashMap<String, u32>,
    classes: Vec<usize>,
}

impl Amf3References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.objects.clear();
        self.strings.clear();
        self.classes.clear();
    }

    pub fn lookup_object(&self, key: usize) -> Option<u32> {
        self.objects.iter().position(|&k| k == key).map(|i| i as u32)
    }

    pub fn insert_object(&mut self, key: usize) -> u32 {
        let index = self.objects.len() as u32;
        self.objects.push(key);
        index
    }

    /// The empty string is never placed in the table; it is always sent
    /// inline, so lookups against it are deliberately forced to miss.
    pub fn lookup_string(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return None;
        }
        self.strings.get(s).copied()
    }

    pub fn insert_string(&mut self, s: &str) -> u32 {
        let index = self.strings.len() as u32;
        self.strings.insert(s.to_string(), index);
        index
    }

    pub fn lookup_class(&self, class: &Arc<ClassDescription>) -> Option<u32> {
        let key = Arc::as_ptr(class) as usize;
        self.classes.iter().position(|&k| k == key).map(|i| i as u32)
    }

    pub fn insert_class(&mut self, class: &Arc<ClassDescription>) -> u32 {
        let key = Arc::as_ptr(class) as usize;
        let index = self.classes.len() as u32;
        self.classes.push(key);
        index
    }
}
