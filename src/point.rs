//! The typed point model: `Kind`, `Value`, `Tags`, and `Point` (§3).

use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
};

///
/// Kind
///
/// The four primitive value kinds a point stream can carry. Fixed at stream
/// creation; never mixed within one stream.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Float,
    Integer,
    String,
    Boolean,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
        };
        write!(f, "{label}")
    }
}

///
/// Value
///
/// A closed variant over the four primitive kinds. Used both as a point's
/// primary value and for its auxiliary companions, which may carry a
/// different kind than the primary field.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Float(_) => Kind::Float,
            Self::Integer(_) => Kind::Integer,
            Self::String(_) => Kind::String,
            Self::Boolean(_) => Kind::Boolean,
        }
    }

    /// Numeric view, promoting integers to float. `None` for string/bool.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(precision_loss_i64_to_f64(*v)),
            Self::String(_) | Self::Boolean(_) => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(_) | Self::String(_) | Self::Boolean(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v.as_str()),
            Self::Float(_) | Self::Integer(_) | Self::Boolean(_) => None,
        }
    }

    /// Default (zero-ish) value for a kind; used to fill the `value` slot of
    /// a `nil` point so the point's kind stays self-describing.
    #[must_use]
    pub fn zero(kind: Kind) -> Self {
        match kind {
            Kind::Float => Self::Float(0.0),
            Kind::Integer => Self::Integer(0),
            Kind::String => Self::String(String::new()),
            Kind::Boolean => Self::Boolean(false),
        }
    }

    /// Total order over values of the *same* kind. Floats use `total_cmp` so
    /// selector heaps (top/bottom) have a strict order without requiring a
    /// non-NaN newtype; the engine's contract is that factories never
    /// produce NaN primary values (`spec.md` §3's point invariants assume
    /// comparable values within a series).
    #[must_use]
    pub fn cmp_same_kind(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

const fn precision_loss_i64_to_f64(v: i64) -> f64 {
    v as f64
}

///
/// Tags
///
/// Canonically sorted key→value tag set. Wraps `BTreeMap` directly: its
/// derived `Ord` already compares sorted `(key, value)` pairs lexicographically,
/// which is exactly the series ordering `spec.md` §3 requires.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deref, DerefMut, Serialize, Deserialize)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project this tag set onto a set of retained dimension keys, dropping
    /// everything else (`spec.md` §4.5, the "reduced tag set").
    #[must_use]
    pub fn project(&self, dimensions: &[String]) -> Self {
        if dimensions.is_empty() {
            return Self::new();
        }

        Self(
            dimensions
                .iter()
                .filter_map(|dim| self.0.get(dim).map(|v| (dim.clone(), v.clone())))
                .collect(),
        )
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

///
/// Point
///
/// One timestamped observation. `nil` points carry a placeholder `value`
/// (see `Value::zero`) produced by the fill combinators for empty windows.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub name: String,
    pub tags: Tags,
    pub time: i64,
    pub value: Value,
    pub nil: bool,
    pub aux: Vec<Value>,
}

impl Point {
    #[must_use]
    pub fn new(name: impl Into<String>, tags: Tags, time: i64, value: Value) -> Self {
        Self {
            name: name.into(),
            tags,
            time,
            value,
            nil: false,
            aux: Vec::new(),
        }
    }

    #[must_use]
    pub fn nil_at(name: impl Into<String>, tags: Tags, time: i64, kind: Kind) -> Self {
        Self {
            name: name.into(),
            tags,
            time,
            value: Value::zero(kind),
            nil: true,
            aux: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.value.kind()
    }

    #[must_use]
    pub fn with_aux(mut self, aux: Vec<Value>) -> Self {
        self.aux = aux;
        self
    }

    /// `(tags, time)` ordering key shared by every combinator in the
    /// pipeline (`spec.md` §3's series/time ordering invariant).
    #[must_use]
    pub fn order_key(&self) -> (&Tags, i64) {
        (&self.tags, self.time)
    }
}
