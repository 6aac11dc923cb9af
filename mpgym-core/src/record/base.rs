//! Diagnostics attached to environment steps and evaluations.
use crate::error::CoreError;
use chrono::{DateTime, Local};
use std::collections::{hash_map::Iter, HashMap};

/// A value stored under a key of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// Single number, e.g. a return or a trajectory length.
    Scalar(f64),

    /// Sequence of numbers, e.g. the rewards of the executed steps.
    Array1(Vec<f64>),

    /// Wall-clock time.
    DateTime(DateTime<Local>),

    /// Free text.
    String(String),
}

impl RecordValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::Array1(_) => "Array1",
            Self::DateTime(_) => "DateTime",
            Self::String(_) => "String",
        }
    }
}

/// Named diagnostic values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// A record without entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A record with the single entry `name: value`.
    pub fn from_scalar(name: impl Into<String>, value: f64) -> Self {
        let mut record = Self::empty();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// Stores `v` under `k`, replacing a previous value.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Looks up `k`.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Entries in arbitrary order.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` without entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds the entries of `other`. Its values win on equal keys.
    pub fn merge(mut self, other: Record) -> Self {
        self.0.extend(other.0);
        self
    }

    fn typed<'a, T>(
        &'a self,
        k: &str,
        expected: &'static str,
        f: impl FnOnce(&'a RecordValue) -> Option<T>,
    ) -> Result<T, CoreError> {
        let v = self
            .0
            .get(k)
            .ok_or_else(|| CoreError::RecordKeyError(k.to_string()))?;
        f(v).ok_or_else(|| CoreError::RecordValueTypeError {
            key: k.to_string(),
            expected,
            found: v.kind(),
        })
    }

    /// The scalar stored under `k`.
    pub fn get_scalar(&self, k: &str) -> Result<f64, CoreError> {
        self.typed(k, "Scalar", |v| match v {
            RecordValue::Scalar(x) => Some(*x),
            _ => None,
        })
    }

    /// The sequence stored under `k`.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f64>, CoreError> {
        self.typed(k, "Array1", |v| match v {
            RecordValue::Array1(xs) => Some(xs.clone()),
            _ => None,
        })
    }

    /// The time stored under `k`.
    pub fn get_datetime(&self, k: &str) -> Result<DateTime<Local>, CoreError> {
        self.typed(k, "DateTime", |v| match v {
            RecordValue::DateTime(t) => Some(*t),
            _ => None,
        })
    }

    /// The text stored under `k`.
    pub fn get_string(&self, k: &str) -> Result<&str, CoreError> {
        self.typed(k, "String", |v| match v {
            RecordValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }
}
