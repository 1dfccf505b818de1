//! Concurrent named-field telemetry (spec §3).
//!
//! Written by the engine during a step, read after it returns. Per-key
//! last-writer-wins, as spec §5 specifies for the concurrent map.

use std::borrow::Cow;

use dashmap::DashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum DiagValue {
    Str(Cow<'static, str>),
    Int(i64),
    Float(f64),
}

impl From<&'static str> for DiagValue {
    fn from(v: &'static str) -> Self {
        DiagValue::Str(Cow::Borrowed(v))
    }
}

impl From<i64> for DiagValue {
    fn from(v: i64) -> Self {
        DiagValue::Int(v)
    }
}

impl From<usize> for DiagValue {
    fn from(v: usize) -> Self {
        DiagValue::Int(v as i64)
    }
}

impl From<f64> for DiagValue {
    fn from(v: f64) -> Self {
        DiagValue::Float(v)
    }
}

impl From<String> for DiagValue {
    fn from(v: String) -> Self {
        DiagValue::Str(Cow::Owned(v))
    }
}

/// A concurrent string -> value map. Keys are the short names listed in
/// spec §3: `Strategy`, `Substeps`, `Nodes`, `MaxDepth`, `Visits`, `Theta`,
/// `GridSize`, `Bodies`, `Cells`, `Oversampling`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    fields: DashMap<&'static str, DiagValue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last writer wins for a given key, safe to call from any worker.
    pub fn set(&self, key: &'static str, value: impl Into<DiagValue>) {
        self.fields.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<DiagValue> {
        self.fields.get(key).map(|v| v.clone())
    }

    pub fn clear(&self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
